use std::collections::VecDeque;

use crate::clip::AudioClip;

/// Pending clips plus the single "currently playing" flag.
///
/// A pure state machine: it decides which clip may go to the device
/// next, while the caller does the actual playing and reports back
/// through [`on_clip_finished`]. At most one clip is ever out at a time,
/// clips leave in exact arrival order, and nothing here reorders or
/// drops an entry on its own.
///
/// [`on_clip_finished`]: PlaybackQueue::on_clip_finished
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    pending: VecDeque<AudioClip>,
    playing: bool,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clip to the tail
    pub fn enqueue(&mut self, clip: AudioClip) {
        self.pending.push_back(clip);
    }

    /// Hand out the head clip and mark it playing, unless a clip is
    /// already out or nothing is pending
    pub fn try_drain_next(&mut self) -> Option<AudioClip> {
        if self.playing {
            return None;
        }
        let clip = self.pending.pop_front()?;
        self.playing = true;
        Some(clip)
    }

    /// Mark the outstanding clip done and immediately hand out the next
    /// one, if any. With nothing pending this lands in the idle terminal
    /// state.
    pub fn on_clip_finished(&mut self) -> Option<AudioClip> {
        self.playing = false;
        self.try_drain_next()
    }

    /// Drop every pending clip, returning how many were discarded. A
    /// clip already handed out stays out; its completion is still
    /// reported through [`on_clip_finished`].
    ///
    /// [`on_clip_finished`]: PlaybackQueue::on_clip_finished
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        !self.playing && self.pending.is_empty()
    }
}
