use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::clip::AudioClip;
use crate::error::SynthError;

/// Voice configuration forwarded verbatim to the synthesis endpoint
#[derive(Debug, Clone, Serialize)]
pub struct VoiceOptions {
    pub voice: String,
    pub locale: String,
}

impl Default for VoiceOptions {
    fn default() -> Self {
        Self {
            voice: "en-US-JennyNeural".to_string(),
            locale: "en-US".to_string(),
        }
    }
}

/// External speech synthesis collaborator: text in, one encoded clip
/// out. Failures are per clip and never fatal to the session.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthError>;
}

#[derive(Serialize)]
struct SynthRequest<'a> {
    input: &'a str,
    options: &'a VoiceOptions,
}

/// HTTP synthesis client. Posts `{ "input": …, "options": { "voice": …,
/// "locale": … } }` and takes the whole response body as the encoded
/// clip.
pub struct HttpSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    options: VoiceOptions,
}

impl HttpSynthesizer {
    pub fn new(
        endpoint: impl Into<String>,
        options: VoiceOptions,
        connect_timeout: Duration,
    ) -> Result<Self, SynthError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            options,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SynthRequest {
                input: text,
                options: &self.options,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(SynthError::EmptyClip);
        }

        debug!(
            "synthesized {} bytes for {} chars of text",
            bytes.len(),
            text.chars().count()
        );
        Ok(AudioClip::new(text, bytes))
    }
}
