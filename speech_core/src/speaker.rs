use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use crate::clip::AudioClip;
use crate::player::AudioPlayer;
use crate::queue::PlaybackQueue;
use crate::synth::SpeechSynthesizer;
use crate::waveform;

/// Text accepted for synthesis, stamped with the stop-epoch current at
/// enqueue time. A bumped epoch marks everything older as discarded.
struct SpokenText {
    epoch: u64,
    text: String,
}

/// What the device is sounding out right now, for the waveform view
struct CurrentClip {
    text: String,
    pcm: Option<(Vec<f32>, u32)>,
    started: Instant,
}

#[derive(Default)]
struct SpeakerState {
    queue: PlaybackQueue,
    epoch: u64,
    outstanding: usize,
    closed: bool,
}

struct Shared {
    state: Mutex<SpeakerState>,
    drain_wake: Notify,
    progress: Notify,
    current: Mutex<Option<CurrentClip>>,
}

impl Shared {
    /// Account one accepted text as fully handled and wake idle waiters
    fn settle_one(&self) {
        let mut state = self.state.lock().unwrap();
        state.outstanding = state.outstanding.saturating_sub(1);
        drop(state);
        self.progress.notify_waiters();
    }
}

/// Speech pipeline for one chat session: increment texts go in, clips
/// come out of the device strictly one at a time, in enqueue order.
///
/// Two background tasks do the work. A synthesis worker pulls accepted
/// texts in arrival order and synthesizes them one at a time, so a slow
/// synthesis for an early increment can never let a later clip jump the
/// queue. A drain worker plays queued clips back to back through the
/// injected [`AudioPlayer`]. Neither a synthesis failure nor a playback
/// failure halts the pipeline; the affected clip is skipped.
///
/// Construct once per session with [`spawn`] and share by cloning.
///
/// [`spawn`]: Speaker::spawn
#[derive(Clone)]
pub struct Speaker {
    shared: Arc<Shared>,
    texts: mpsc::UnboundedSender<SpokenText>,
    player: Arc<dyn AudioPlayer>,
}

impl Speaker {
    /// Start the pipeline over the given synthesizer and player. Must be
    /// called inside a Tokio runtime.
    pub fn spawn(synthesizer: Arc<dyn SpeechSynthesizer>, player: Arc<dyn AudioPlayer>) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(SpeakerState::default()),
            drain_wake: Notify::new(),
            progress: Notify::new(),
            current: Mutex::new(None),
        });
        let (texts, jobs) = mpsc::unbounded_channel();

        tokio::spawn(synthesis_worker(Arc::clone(&shared), synthesizer, jobs));
        tokio::spawn(drain_worker(Arc::clone(&shared), Arc::clone(&player)));

        Self {
            shared,
            texts,
            player,
        }
    }

    /// Accept one increment's text for synthesis and eventual playback.
    /// Fire and forget: the caller is never blocked on synthesis or on
    /// the device. Whitespace-only text is dropped here, unsynthesized.
    pub fn enqueue_text(&self, text: &str) {
        if text.trim().is_empty() {
            debug!("skipping empty increment text");
            return;
        }

        let epoch = {
            let mut state = self.shared.state.lock().unwrap();
            if state.closed {
                return;
            }
            state.outstanding += 1;
            state.epoch
        };
        let _ = self.texts.send(SpokenText {
            epoch,
            text: text.to_string(),
        });
    }

    pub fn is_playing(&self) -> bool {
        self.shared.state.lock().unwrap().queue.is_playing()
    }

    /// Clips queued behind the one currently out
    pub fn pending(&self) -> usize {
        self.shared.state.lock().unwrap().queue.pending()
    }

    /// Text of the clip currently at the device
    pub fn now_speaking(&self) -> Option<String> {
        self.shared
            .current
            .lock()
            .unwrap()
            .as_ref()
            .map(|current| current.text.clone())
    }

    /// Sample the playing clip's waveform around the current playback
    /// position, downsampled to `n` display bins centered on 128. Idle,
    /// or a clip the sampler cannot read, shows as flat silence.
    pub fn waveform(&self, n: usize) -> Vec<u8> {
        let current = self.shared.current.lock().unwrap();
        let window = match current.as_ref() {
            Some(CurrentClip {
                pcm: Some((samples, sample_rate)),
                started,
                ..
            }) => {
                let offset = (started.elapsed().as_secs_f32() * *sample_rate as f32) as usize;
                waveform::byte_window(samples, offset)
            }
            _ => vec![waveform::CENTER; waveform::WINDOW_SIZE],
        };
        drop(current);
        waveform::bins(&window, n)
    }

    /// Interrupt the current clip and discard everything still queued or
    /// awaiting synthesis. Stop means stop: nothing accepted before this
    /// call will sound after it, and playback resumes only with the next
    /// enqueued text.
    pub fn stop(&self) {
        let discarded = {
            let mut state = self.shared.state.lock().unwrap();
            state.epoch += 1;
            let dropped = state.queue.clear();
            state.outstanding = state.outstanding.saturating_sub(dropped);
            dropped
        };
        self.player.stop();
        if discarded > 0 {
            info!("discarded {} queued clips", discarded);
            self.shared.progress.notify_waiters();
        }
    }

    /// Resolve once every accepted text has been played, skipped, or
    /// discarded
    pub async fn wait_idle(&self) {
        loop {
            // register interest before reading the counter, or a settle
            // landing in between is a missed wakeup
            let progress = self.shared.progress.notified();
            tokio::pin!(progress);
            progress.as_mut().enable();
            if self.shared.state.lock().unwrap().outstanding == 0 {
                return;
            }
            progress.await;
        }
    }

    /// Stop playback and refuse any further text. The worker tasks wind
    /// down on their own.
    pub fn close(&self) {
        self.shared.state.lock().unwrap().closed = true;
        self.stop();
        self.shared.drain_wake.notify_one();
    }
}

async fn synthesis_worker(
    shared: Arc<Shared>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    mut jobs: mpsc::UnboundedReceiver<SpokenText>,
) {
    while let Some(job) = jobs.recv().await {
        if shared.state.lock().unwrap().epoch != job.epoch {
            debug!("dropping text enqueued before a stop");
            shared.settle_one();
            continue;
        }

        let clip = match synthesizer.synthesize(&job.text).await {
            Ok(clip) => clip,
            Err(e) => {
                warn!("synthesis failed, skipping this clip: {}", e);
                shared.settle_one();
                continue;
            }
        };

        // re-checked under the same lock that enqueues, so a stop cannot
        // slip between the check and the append
        let enqueued = {
            let mut state = shared.state.lock().unwrap();
            if state.epoch == job.epoch {
                state.queue.enqueue(clip);
                true
            } else {
                false
            }
        };
        if enqueued {
            shared.drain_wake.notify_one();
        } else {
            debug!("dropping clip synthesized across a stop");
            shared.settle_one();
        }
    }

    // every sender is gone; tell the drain worker to wind down once the
    // queue is empty
    shared.state.lock().unwrap().closed = true;
    shared.drain_wake.notify_one();
}

async fn drain_worker(shared: Arc<Shared>, player: Arc<dyn AudioPlayer>) {
    loop {
        let wake = shared.drain_wake.notified();
        let next = {
            let mut state = shared.state.lock().unwrap();
            match state.queue.try_drain_next() {
                Some(clip) => Some(clip),
                None if state.closed => break,
                None => None,
            }
        };
        let Some(mut clip) = next else {
            wake.await;
            continue;
        };

        loop {
            play_one(&shared, player.as_ref(), &clip).await;
            let follow_up = {
                let mut state = shared.state.lock().unwrap();
                let follow_up = state.queue.on_clip_finished();
                state.outstanding = state.outstanding.saturating_sub(1);
                follow_up
            };
            shared.progress.notify_waiters();
            match follow_up {
                Some(next_clip) => clip = next_clip,
                None => break,
            }
        }
    }
}

async fn play_one(shared: &Shared, player: &dyn AudioPlayer, clip: &AudioClip) {
    debug!("playing {} byte clip", clip.len());
    *shared.current.lock().unwrap() = Some(CurrentClip {
        text: clip.text.clone(),
        pcm: clip.pcm(),
        started: Instant::now(),
    });

    if let Err(e) = player.play(clip).await {
        warn!("playback failed, skipping to the next clip: {}", e);
    }

    *shared.current.lock().unwrap() = None;
}
