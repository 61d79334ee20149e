//! Synthesis provider implementations

mod google;
pub mod mock;
mod retry;

pub use google::GoogleTtsProvider;
pub use mock::MockSynthesizer;
pub use retry::RetryingSynthesizer;

use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{Result, SynthesisError};
use crate::provider::SpeechSynthesizer;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_name(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" | "google-cloud" | "gcp" => Ok(Self::Google),
            _ => Err(SynthesisError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }
}

/// Create a provider instance from config, with client-side retry applied
pub fn get_synthesizer(config: &ProviderConfig) -> Result<Box<dyn SpeechSynthesizer>> {
    let kind = ProviderKind::from_name(&config.provider)?;

    let provider: Box<dyn SpeechSynthesizer> = match kind {
        ProviderKind::Google => {
            let credential = config.resolve_credential()?;
            Box::new(GoogleTtsProvider::new(
                credential,
                config.base_url.as_deref(),
                Duration::from_secs(config.timeout_secs),
            )?)
        }
    };

    if config.max_retries == 0 {
        return Ok(provider);
    }
    Ok(Box::new(RetryingSynthesizer::new(provider, config.max_retries)))
}
