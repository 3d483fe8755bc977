//! Content provider adapters.
//!
//! Defines the adapter traits the pipeline executor calls ([`TextGenerator`],
//! [`SpeechSynthesizer`], [`VideoGenerator`]), the [`ProviderError`] failure
//! modes the executor absorbs into fallbacks, and [`ProviderSet`] bundling the
//! concrete Gemini, ElevenLabs, and Tavus clients built from configuration.

mod elevenlabs;
mod gemini;
mod tavus;

pub use elevenlabs::ElevenLabsClient;
pub use gemini::GeminiClient;
pub use tavus::TavusClient;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure modes shared by all provider adapters.
///
/// These never reach the caller of a pipeline run: the executor recovers every
/// one of them through the stage's fallback chain.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (connect, timeout, body read).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The service answered 2xx but the payload was unusable.
    #[error("{provider} returned an unusable payload: {detail}")]
    MalformedResponse {
        provider: &'static str,
        detail: String,
    },

    /// The adapter is missing a credential or identifier it needs.
    #[error("{provider} is not configured: missing {missing}")]
    Unconfigured {
        provider: &'static str,
        missing: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Job types
// ---------------------------------------------------------------------------

/// Opaque identifier for an asynchronous generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle(pub String);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Point-in-time status of an asynchronous generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Still queued or rendering.
    Pending,
    /// Finished; `result_uri` is absent when the service reported completion
    /// without a retrievable output.
    Completed { result_uri: Option<String> },
    /// The service reported a terminal failure.
    Failed { reason: String },
}

// ---------------------------------------------------------------------------
// Adapter traits
// ---------------------------------------------------------------------------

/// Generates a short piece of text from a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short, lowercase identifier for this adapter (e.g. `"gemini"`).
    fn name(&self) -> &'static str;

    /// Generate text for `prompt`. Fails with [`ProviderError`] on non-2xx
    /// responses or payloads without usable text.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Renders text to spoken audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Short, lowercase identifier for this adapter (e.g. `"elevenlabs"`).
    fn name(&self) -> &'static str;

    /// Synthesize `text` into an MPEG audio payload. The caller is
    /// responsible for encoding the bytes into a playable reference.
    async fn synthesize(&self, text: &str) -> Result<Bytes, ProviderError>;
}

/// Renders a script into a hosted video through an asynchronous job.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Short, lowercase identifier for this adapter (e.g. `"tavus"`).
    fn name(&self) -> &'static str;

    /// Submit `script` for rendering. Fails with [`ProviderError`] when the
    /// service does not return a job id.
    async fn create_job(&self, script: &str) -> Result<JobHandle, ProviderError>;

    /// Query the current status of a previously created job.
    async fn job_status(&self, handle: &JobHandle) -> Result<JobStatus, ProviderError>;
}

// ---------------------------------------------------------------------------
// Provider set
// ---------------------------------------------------------------------------

/// The three adapters the pipeline executor draws on, shared across runs.
#[derive(Clone)]
pub struct ProviderSet {
    pub text: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub video: Arc<dyn VideoGenerator>,
}

impl ProviderSet {
    /// Build the concrete clients from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            text: Arc::new(GeminiClient::new(&config.gemini)),
            speech: Arc::new(ElevenLabsClient::new(&config.elevenlabs)),
            video: Arc::new(TavusClient::new(&config.tavus)),
        }
    }
}
