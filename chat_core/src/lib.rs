pub mod client;
pub mod error;
pub mod frame;
pub mod message;
pub mod transport;

pub use client::{ChatClient, IncrementStream};
pub use error::ChatError;
pub use frame::{FrameDecoder, Increment, StreamFrame};
pub use message::{Message, MessageHistory, Role};
pub use transport::{ChatTransport, FrameSource, HttpTransport};
