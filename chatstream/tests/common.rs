//! Shared fakes for the session tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chat_core::{ChatClient, ChatError, ChatTransport, FrameSource};
use chatstream::{ChatSession, SessionEvent};
use futures::stream::{self, StreamExt};
use speech_core::{
    AudioClip, AudioPlayer, CaptureError, PlaybackError, Speaker, SpeechCapture,
    SpeechSynthesizer, SynthError,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// One scripted exchange with the fake transport.
pub enum Script {
    /// Yield these chunks, then close the stream
    Frames(Vec<&'static [u8]>),
    /// Yield these chunks, then stay open forever
    FramesThenHang(Vec<&'static [u8]>),
    /// Fail the exchange with this status code
    Status(u16),
}

/// Transport handing out pre-scripted exchanges in order.
pub struct ScriptedTransport {
    scripts: Mutex<Vec<Script>>,
    opened: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts),
            opened: AtomicUsize::new(0),
        })
    }

    pub fn times_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open(&self, _question: &str) -> Result<FrameSource, ChatError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let script = {
            let mut scripts = self.scripts.lock().unwrap();
            assert!(
                !scripts.is_empty(),
                "the transport was opened more often than scripted"
            );
            scripts.remove(0)
        };
        match script {
            Script::Frames(chunks) => {
                Ok(
                    stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c))))
                        .boxed(),
                )
            }
            Script::FramesThenHang(chunks) => {
                Ok(
                    stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c))))
                        .chain(stream::pending::<Result<Bytes, ChatError>>())
                        .boxed(),
                )
            }
            Script::Status(code) => Err(ChatError::Status(code)),
        }
    }
}

/// Synthesizer recording every call; one scripted call (1-based) can be
/// made to fail.
pub struct RecordingSynth {
    calls: Mutex<Vec<String>>,
    fail_on: Option<usize>,
}

impl RecordingSynth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_on: None,
        })
    }

    pub fn failing_on(call: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(call),
        })
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynth {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(text.to_string());
            calls.len()
        };
        if self.fail_on == Some(call) {
            return Err(SynthError::Status(500));
        }
        Ok(AudioClip::new(text, Bytes::from_static(b"clip")))
    }
}

/// Player that records clip texts and finishes instantly.
pub struct RecordingPlayer {
    played: Mutex<Vec<String>>,
}

impl RecordingPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            played: Mutex::new(Vec::new()),
        })
    }

    pub fn texts(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioPlayer for RecordingPlayer {
    async fn play(&self, clip: &AudioClip) -> Result<(), PlaybackError> {
        self.played.lock().unwrap().push(clip.text.clone());
        Ok(())
    }

    fn stop(&self) {}
}

/// Capture source producing one scripted result, then silence.
pub struct ScriptedCapture {
    result: Mutex<Option<Result<String, CaptureError>>>,
}

impl ScriptedCapture {
    pub fn hearing(transcript: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(Ok(transcript.to_string()))),
        })
    }

    pub fn failing(error: CaptureError) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(Err(error))),
        })
    }
}

#[async_trait]
impl SpeechCapture for ScriptedCapture {
    async fn listen(&self) -> Result<String, CaptureError> {
        self.result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Err(CaptureError::NoSpeech))
    }
}

/// A session wired to scripted fakes, plus handles onto all of them.
pub struct SessionRig {
    pub session: ChatSession,
    pub speaker: Speaker,
    pub transport: Arc<ScriptedTransport>,
    pub synth: Arc<RecordingSynth>,
    pub player: Arc<RecordingPlayer>,
    pub events: UnboundedReceiver<SessionEvent>,
}

impl SessionRig {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self::with_synth(scripts, RecordingSynth::new())
    }

    pub fn with_synth(scripts: Vec<Script>, synth: Arc<RecordingSynth>) -> Self {
        let transport = ScriptedTransport::new(scripts);
        let player = RecordingPlayer::new();
        let speaker = Speaker::spawn(synth.clone(), player.clone());
        let (event_tx, events) = unbounded_channel();
        let client = ChatClient::new(transport.clone());
        let session = ChatSession::new(client, speaker.clone(), event_tx, false);
        Self {
            session,
            speaker,
            transport,
            synth,
            player,
            events,
        }
    }
}
