use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,

    #[serde(default)]
    pub tavus: TavusConfig,

    #[serde(default)]
    pub poller: PollerConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory with the static panel frontend, served when it exists
    #[serde(default)]
    pub panel_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8087
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            panel_dir: None,
        }
    }
}

/// Gemini text generation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_base")]
    pub api_base: String,

    /// API key; empty means the text actions serve fallback content
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: default_gemini_base(),
            api_key: String::new(),
            model: default_gemini_model(),
        }
    }
}

/// ElevenLabs speech synthesis settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElevenLabsConfig {
    #[serde(default = "default_elevenlabs_base")]
    pub api_base: String,

    #[serde(default)]
    pub api_key: String,

    /// Voice for the spoken support message; empty keeps support text-only
    #[serde(default)]
    pub voice_id: String,
}

fn default_elevenlabs_base() -> String {
    "https://api.elevenlabs.io".to_string()
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_base: default_elevenlabs_base(),
            api_key: String::new(),
            voice_id: String::new(),
        }
    }
}

impl ElevenLabsConfig {
    /// Voice id usable for synthesis, if one is configured.
    ///
    /// Values copied straight out of an env template ("your_..._here") count
    /// as unconfigured, so the support pipeline builds its text-only shape
    /// instead of burning requests against a bogus voice.
    pub fn usable_voice_id(&self) -> Option<String> {
        let voice = self.voice_id.trim();
        if voice.is_empty() || voice.contains("your_") || voice.contains("_here") {
            return None;
        }
        Some(voice.to_string())
    }
}

/// Tavus video generation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TavusConfig {
    #[serde(default = "default_tavus_base")]
    pub api_base: String,

    #[serde(default)]
    pub api_key: String,

    /// Replica that presents the rendered clip
    #[serde(default)]
    pub replica_id: String,
}

fn default_tavus_base() -> String {
    "https://tavusapi.com".to_string()
}

impl Default for TavusConfig {
    fn default() -> Self {
        Self {
            api_base: default_tavus_base(),
            api_key: String::new(),
            replica_id: String::new(),
        }
    }
}

/// Job polling settings shared by all asynchronous generation jobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollerConfig {
    /// Seconds between job status checks
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,

    /// Total status checks before a job counts as timed out
    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,
}

fn default_poll_interval() -> u64 {
    10
}

fn default_poll_attempts() -> u32 {
    30
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
            max_attempts: default_poll_attempts(),
        }
    }
}
