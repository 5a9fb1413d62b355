use async_trait::async_trait;

use crate::error::CaptureError;

/// Consumed speech-recognition interface.
///
/// One activation yields at most one final transcript; interim results
/// are never surfaced. The session feeds a transcript into the same
/// submit path as typed input, so implementations only have to produce
/// the string.
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    async fn listen(&self) -> Result<String, CaptureError>;
}
