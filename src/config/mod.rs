mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./cheerdeck.toml", "~/.config/cheerdeck/config.toml"];

    for path_str in default_paths {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            return load_config(path);
        }
    }

    tracing::debug!("No config file found, using defaults");
    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.poller.interval_secs == 0 {
        anyhow::bail!("poller.interval_secs must be at least 1");
    }

    if config.poller.max_attempts == 0 {
        anyhow::bail!("poller.max_attempts must be at least 1");
    }

    if !config.elevenlabs.voice_id.is_empty() && config.elevenlabs.usable_voice_id().is_none() {
        tracing::warn!(
            "ElevenLabs voice id {:?} looks like a placeholder, support stays text-only",
            config.elevenlabs.voice_id
        );
    }

    if config.gemini.api_key.is_empty() {
        tracing::warn!("No Gemini API key configured, text actions will serve fallback content");
    }

    if config.elevenlabs.usable_voice_id().is_some() && config.elevenlabs.api_key.is_empty() {
        tracing::warn!("No ElevenLabs API key configured, support degrades to text at runtime");
    }

    if config.tavus.api_key.is_empty() || config.tavus.replica_id.is_empty() {
        tracing::warn!("Tavus is not fully configured, the smile action will serve fallback jokes");
    }

    Ok(())
}
