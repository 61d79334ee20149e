use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroize;

use crate::error::{Result, SynthesisError};

pub const API_KEY_ENV: &str = "GOOGLE_TTS_API_KEY";
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Provider configuration, stored at `<config dir>/thesis-narrator/tts.toml`
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider identifier (google)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OAuth access token, used when no API key is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Custom base URL (for proxies and tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Resubmissions of an identical request after a transient failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_provider() -> String {
    "google".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            access_token: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl ProviderConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: ProviderConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| SynthesisError::ConfigError("config directory not found".into()))?;
        Ok(base.join("thesis-narrator").join("tts.toml"))
    }

    /// Resolve the credential to inject into a provider.
    ///
    /// Config values win over environment variables; an API key wins over an
    /// access token.
    pub fn resolve_credential(&self) -> Result<Credential> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(Credential::ApiKey(key.trim().to_string()));
        }
        if let Some(token) = self.access_token.as_deref().filter(|t| !t.trim().is_empty()) {
            return Ok(Credential::AccessToken(token.trim().to_string()));
        }
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            return Ok(Credential::ApiKey(key.trim().to_string()));
        }
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            return Ok(Credential::AccessToken(token.trim().to_string()));
        }

        Err(SynthesisError::MissingCredentials {
            provider: self.provider.clone(),
            env_var: API_KEY_ENV.to_string(),
        })
    }
}

/// Secret material handed to a provider at construction.
///
/// The secret is wiped from memory when the value is dropped and never shows
/// up in `Debug` output.
#[derive(Clone)]
pub enum Credential {
    ApiKey(String),
    AccessToken(String),
}

impl Credential {
    pub(crate) fn secret(&self) -> &str {
        match self {
            Self::ApiKey(s) | Self::AccessToken(s) => s,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
        }
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        match self {
            Self::ApiKey(s) | Self::AccessToken(s) => s.zeroize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.provider, "google");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_retries, 2);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
provider = "google"
api_key = "abc123"
base_url = "http://localhost:9000"
max_retries = 0
"#;
        let config: ProviderConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_config_api_key_wins() {
        let config = ProviderConfig {
            api_key: Some(" key ".into()),
            access_token: Some("token".into()),
            ..ProviderConfig::default()
        };
        let credential = config.resolve_credential().unwrap();
        match &credential {
            Credential::ApiKey(k) => assert_eq!(k, "key"),
            other => panic!("unexpected credential: {:?}", other),
        }
    }

    #[test]
    fn test_config_access_token_used_without_key() {
        let config = ProviderConfig {
            access_token: Some("token".into()),
            ..ProviderConfig::default()
        };
        assert!(matches!(
            config.resolve_credential().unwrap(),
            Credential::AccessToken(_)
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ProviderConfig {
            api_key: Some("super-secret".into()),
            ..ProviderConfig::default()
        };
        let shown = format!("{:?}", config);
        assert!(!shown.contains("super-secret"));

        let credential = Credential::ApiKey("super-secret".into());
        assert_eq!(format!("{:?}", credential), "ApiKey(<redacted>)");
    }

    #[test]
    fn test_config_serialization() {
        let config = ProviderConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ProviderConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider, config.provider);
        assert!(!toml_str.contains("api_key"));
    }
}
