//! Mock synthesis provider for testing
//!
//! Echoes the submitted markup back as "audio" so callers can check ordering and
//! assembly byte-for-byte, and can be told to fail on specific requests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, SynthesisError};
use crate::provider::{SpeechSynthesizer, SynthesisRequest};

/// A mock provider for testing failure attribution and retry behavior
pub struct MockSynthesizer {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Only requests whose markup contains this text fail (None = any request)
    fail_on: Option<String>,
    /// Error to return on failure (None = always succeed)
    fail_with: Option<SynthesisError>,
    /// Markup of every request received, in arrival order
    requests: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    /// Create a provider that always succeeds
    pub fn always_succeeds() -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            fail_on: None,
            fail_with: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: SynthesisError) -> Self {
        Self {
            fail_count: AtomicUsize::new(usize::MAX),
            fail_with: Some(error),
            ..Self::always_succeeds()
        }
    }

    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: SynthesisError) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            fail_with: Some(error),
            ..Self::always_succeeds()
        }
    }

    /// Create a provider that fails every request whose markup contains `needle`
    pub fn fails_on(needle: &str, error: SynthesisError) -> Self {
        Self {
            fail_count: AtomicUsize::new(usize::MAX),
            fail_on: Some(needle.to_string()),
            fail_with: Some(error),
            ..Self::always_succeeds()
        }
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Markup of all received requests, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.ssml.clone());
        }

        let targeted = self
            .fail_on
            .as_deref()
            .is_none_or(|needle| request.ssml.contains(needle));

        if targeted && call_num < self.fail_count.load(Ordering::SeqCst) {
            if let Some(err) = self.fail_with.as_ref() {
                return Err(clone_error(err));
            }
        }

        Ok(request.ssml.as_bytes().to_vec())
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone a SynthesisError (needed because SynthesisError doesn't implement Clone)
fn clone_error(err: &SynthesisError) -> SynthesisError {
    match err {
        SynthesisError::MissingCredentials { provider, env_var } => {
            SynthesisError::MissingCredentials {
                provider: provider.clone(),
                env_var: env_var.clone(),
            }
        }
        SynthesisError::Unauthorized {
            message,
            status_code,
        } => SynthesisError::Unauthorized {
            message: message.clone(),
            status_code: *status_code,
        },
        SynthesisError::RateLimited { retry_after } => SynthesisError::RateLimited {
            retry_after: *retry_after,
        },
        SynthesisError::InvalidInput(s) => SynthesisError::InvalidInput(s.clone()),
        SynthesisError::ServerUnavailable {
            message,
            status_code,
        } => SynthesisError::ServerUnavailable {
            message: message.clone(),
            status_code: *status_code,
        },
        SynthesisError::ApiError {
            message,
            status_code,
        } => SynthesisError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        SynthesisError::Decode(s) => SynthesisError::Decode(s.clone()),
        SynthesisError::ConfigError(s) => SynthesisError::ConfigError(s.clone()),
        // For Io and Toml errors, we create a generic error since they can't be cloned
        SynthesisError::Io(_) => SynthesisError::ConfigError("IO error (mock)".to_string()),
        SynthesisError::TomlParse(_) => {
            SynthesisError::ConfigError("TOML parse error (mock)".to_string())
        }
        SynthesisError::TomlSerialize(_) => {
            SynthesisError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AudioEncoding, VoiceSelection};

    fn request(ssml: &str) -> SynthesisRequest {
        SynthesisRequest {
            ssml: ssml.to_string(),
            voice: VoiceSelection {
                language_code: "ko-KR".to_string(),
                name: "ko-KR-Neural2-B".to_string(),
            },
            speaking_rate: 1.0,
            encoding: AudioEncoding::Mp3,
        }
    }

    #[tokio::test]
    async fn test_always_succeeds_echoes_markup() {
        let provider = MockSynthesizer::always_succeeds();
        let audio = provider.synthesize(&request("<speak>a</speak>")).await.unwrap();
        assert_eq!(audio, b"<speak>a</speak>");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.requests(), vec!["<speak>a</speak>".to_string()]);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let provider = MockSynthesizer::always_fails(SynthesisError::RateLimited {
            retry_after: None,
        });
        for _ in 0..3 {
            assert!(provider.synthesize(&request("x")).await.is_err());
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_then_succeeds() {
        let provider = MockSynthesizer::fails_then_succeeds(
            2,
            SynthesisError::ServerUnavailable {
                message: "overloaded".to_string(),
                status_code: 503,
            },
        );

        assert!(provider.synthesize(&request("x")).await.is_err());
        assert!(provider.synthesize(&request("x")).await.is_err());
        assert!(provider.synthesize(&request("x")).await.is_ok());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_on_matching_request_only() {
        let provider =
            MockSynthesizer::fails_on("bad", SynthesisError::InvalidInput("bad".to_string()));

        assert!(provider.synthesize(&request("good")).await.is_ok());
        assert!(matches!(
            provider.synthesize(&request("a bad one")).await,
            Err(SynthesisError::InvalidInput(_))
        ));
        assert!(provider.synthesize(&request("good again")).await.is_ok());
    }
}
