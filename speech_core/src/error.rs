use thiserror::Error;

/// Speech synthesis failures. Scoped to one clip: the pipeline skips the
/// clip and keeps going.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("Speech endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Speech request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Speech endpoint returned an empty clip")]
    EmptyClip,
}

/// Audio decode/playback failures, also scoped to one clip
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Audio device unavailable: {0}")]
    Device(String),

    #[error("Audio clip could not be decoded: {0}")]
    Decode(String),
}

/// Speech recognition failures. None append a message; the listening
/// indicator resets and the session stays where it was.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("No speech was detected")]
    NoSpeech,

    #[error("Microphone access was denied")]
    NotAllowed,

    #[error("Audio capture failed: {0}")]
    Audio(String),

    #[error("Capture was aborted")]
    Aborted,
}
