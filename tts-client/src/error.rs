use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error(
        "Credentials not found for {provider}. Set {env_var} environment variable or add to config."
    )]
    MissingCredentials { provider: String, env_var: String },

    #[error("Authentication rejected (HTTP {status_code}): {message}")]
    Unauthorized { message: String, status_code: u16 },

    #[error("Rate limit or quota exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Request rejected by backend (malformed markup or oversize input): {0}")]
    InvalidInput(String),

    #[error("Backend unavailable (HTTP {status_code}): {message}")]
    ServerUnavailable { message: String, status_code: u16 },

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Failed to decode audio payload: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl SynthesisError {
    /// Whether resubmitting the identical request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ServerUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SynthesisError>;
