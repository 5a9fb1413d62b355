pub mod capture;
pub mod clip;
pub mod error;
pub mod player;
pub mod queue;
pub mod speaker;
pub mod synth;
pub mod waveform;

pub use capture::SpeechCapture;
pub use clip::AudioClip;
pub use error::{CaptureError, PlaybackError, SynthError};
pub use player::{AudioPlayer, RodioPlayer, SilentPlayer};
pub use queue::PlaybackQueue;
pub use speaker::Speaker;
pub use synth::{HttpSynthesizer, SpeechSynthesizer, VoiceOptions};
