use thiserror::Error;

/// Failure classes for a streamed chat turn
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Question cannot be empty")]
    EmptyQuestion,

    #[error("Chat endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed stream frame: {0}")]
    Decode(String),
}
