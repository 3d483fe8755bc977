//! ElevenLabs text-to-speech adapter.
//!
//! Implements [`SpeechSynthesizer`] against the `text-to-speech` endpoint.
//! Returns the raw MPEG audio payload; the pipeline executor encodes it into
//! a playable data URI.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::config::ElevenLabsConfig;
use crate::providers::{ProviderError, SpeechSynthesizer};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// ElevenLabs text-to-speech client.
pub struct ElevenLabsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    voice_id: Option<String>,
}

impl ElevenLabsClient {
    /// Create a new client from the `[elevenlabs]` config section.
    ///
    /// A missing voice id is not an error here: the action catalog skips the
    /// synthesis stage entirely when no usable voice is configured, and the
    /// adapter guards against direct calls anyway.
    pub fn new(config: &ElevenLabsConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            voice_id: config.usable_voice_id(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    async fn synthesize(&self, text: &str) -> Result<Bytes, ProviderError> {
        let voice_id = self.voice_id.as_deref().ok_or(ProviderError::Unconfigured {
            provider: "elevenlabs",
            missing: "voice_id",
        })?;
        if self.api_key.is_empty() {
            return Err(ProviderError::Unconfigured {
                provider: "elevenlabs",
                missing: "api_key",
            });
        }

        #[derive(Serialize)]
        struct SynthesizeRequest<'a> {
            text: &'a str,
        }

        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice_id);
        let resp = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .json(&SynthesizeRequest { text })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: "elevenlabs",
                status,
                body,
            });
        }

        let audio = resp.bytes().await?;
        if audio.is_empty() {
            return Err(ProviderError::MalformedResponse {
                provider: "elevenlabs",
                detail: "empty audio payload".to_string(),
            });
        }
        Ok(audio)
    }
}
