use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::debug;

use crate::clip::AudioClip;
use crate::error::PlaybackError;

/// Something that can sound out one encoded clip at a time.
///
/// `play` resolves when the clip has finished (or was interrupted);
/// `stop` cuts the clip currently sounding, and the interrupted `play`
/// call returns normally.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, clip: &AudioClip) -> Result<(), PlaybackError>;
    fn stop(&self);
}

/// Player on the default audio output device.
///
/// The output stream is created on a dedicated thread and parked there
/// for the player's whole lifetime, since it cannot move across
/// threads. Dropping the player unparks the thread and releases the
/// device.
pub struct RodioPlayer {
    handle: OutputStreamHandle,
    current: Mutex<Option<Arc<Sink>>>,
    device_alive: Arc<AtomicBool>,
    device_thread: thread::Thread,
}

impl RodioPlayer {
    pub fn new() -> Result<Self, PlaybackError> {
        let (tx, rx) = mpsc::channel();
        let device_alive = Arc::new(AtomicBool::new(true));
        let alive = Arc::clone(&device_alive);

        let worker = thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || match OutputStream::try_default() {
                Ok((_stream, handle)) => {
                    let _ = tx.send(Ok(handle));
                    while alive.load(Ordering::Acquire) {
                        thread::park();
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(PlaybackError::Device(e.to_string())));
                }
            })
            .map_err(|e| PlaybackError::Device(e.to_string()))?;

        let handle = rx
            .recv()
            .map_err(|_| PlaybackError::Device("audio output thread died".to_string()))??;

        Ok(Self {
            handle,
            current: Mutex::new(None),
            device_alive,
            device_thread: worker.thread().clone(),
        })
    }
}

impl Drop for RodioPlayer {
    fn drop(&mut self) {
        self.device_alive.store(false, Ordering::Release);
        self.device_thread.unpark();
    }
}

#[async_trait]
impl AudioPlayer for RodioPlayer {
    async fn play(&self, clip: &AudioClip) -> Result<(), PlaybackError> {
        let source = Decoder::new(Cursor::new(clip.bytes.clone()))
            .map_err(|e| PlaybackError::Decode(e.to_string()))?;
        let sink =
            Sink::try_new(&self.handle).map_err(|e| PlaybackError::Device(e.to_string()))?;
        sink.append(source);

        let sink = Arc::new(sink);
        *self.current.lock().unwrap() = Some(Arc::clone(&sink));

        // sleep_until_end blocks, and returns early if stop() cuts the sink
        let waiter = Arc::clone(&sink);
        let waited = tokio::task::spawn_blocking(move || waiter.sleep_until_end()).await;

        let mut current = self.current.lock().unwrap();
        if current.as_ref().is_some_and(|active| Arc::ptr_eq(active, &sink)) {
            *current = None;
        }
        drop(current);

        waited.map_err(|e| PlaybackError::Device(e.to_string()))
    }

    fn stop(&self) {
        if let Some(sink) = self.current.lock().unwrap().take() {
            sink.stop();
        }
    }
}

/// Player that completes every clip instantly without touching a
/// device. Stands in for the real output when voice is switched off or
/// no device exists.
#[derive(Debug, Default)]
pub struct SilentPlayer;

impl SilentPlayer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioPlayer for SilentPlayer {
    async fn play(&self, clip: &AudioClip) -> Result<(), PlaybackError> {
        debug!("discarding {} byte clip (silent output)", clip.len());
        Ok(())
    }

    fn stop(&self) {}
}
