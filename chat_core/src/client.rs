use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::debug;

use crate::error::ChatError;
use crate::frame::{FrameDecoder, Increment};
use crate::transport::ChatTransport;

/// Lazy, finite sequence of answer increments for a single question
pub type IncrementStream = BoxStream<'static, Result<Increment, ChatError>>;

/// Streaming chat client. One call to [`ask`] opens exactly one exchange
/// with the transport and yields increments in frame order.
///
/// [`ask`]: ChatClient::ask
pub struct ChatClient {
    transport: Arc<dyn ChatTransport>,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    /// Stream the answer to `question`.
    ///
    /// Blank questions are rejected here, before the transport is
    /// touched. The returned stream ends after the frame marked final,
    /// when the transport closes, or at the first error; it cannot be
    /// restarted. A transport close that strands a partial frame in the
    /// decoder surfaces as a decode error.
    pub async fn ask(&self, question: &str) -> Result<IncrementStream, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }

        let mut source = self.transport.open(question).await?;
        debug!("answer stream opened ({} question chars)", question.len());

        let increments = try_stream! {
            let mut decoder = FrameDecoder::new();
            let mut finished = false;

            while let Some(chunk) = source.next().await {
                let chunk = chunk?;
                for frame in decoder.push(&chunk)? {
                    let is_final = frame.is_last;
                    yield Increment::from(frame);
                    if is_final {
                        finished = true;
                        break;
                    }
                }
                if finished {
                    break;
                }
            }

            if !finished {
                decoder.finish()?;
            }
        };

        Ok(increments.boxed())
    }
}
