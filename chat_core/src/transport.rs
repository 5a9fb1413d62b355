use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;
use tracing::debug;

use crate::error::ChatError;

/// Raw byte stream of one answer, as the transport hands it over
pub type FrameSource = BoxStream<'static, Result<Bytes, ChatError>>;

/// Seam between the client and the chat endpoint. The client never talks
/// HTTP directly; it opens one exchange per question through this trait.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open one streaming exchange for `question`
    async fn open(&self, question: &str) -> Result<FrameSource, ChatError>;
}

#[derive(Serialize)]
struct QuestionBody<'a> {
    question: &'a str,
}

/// HTTP transport for the chat endpoint.
///
/// Only the connect phase is bounded by a timeout: a whole-request
/// timeout would cut long answers off mid-stream.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, connect_timeout: Duration) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, question: &str) -> Result<FrameSource, ChatError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&QuestionBody { question })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!("chat endpoint rejected the question with HTTP {status}");
            return Err(ChatError::Status(status.as_u16()));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ChatError::from))
            .boxed())
    }
}
