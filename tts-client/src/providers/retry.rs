//! Retry decorator for synthesis providers
//!
//! Resubmits the identical request after transient failures so that a retried
//! chunk always produces audio for exactly the same text.

use async_trait::async_trait;
use log::warn;
use std::time::Duration;

use crate::error::{Result, SynthesisError};
use crate::provider::{SpeechSynthesizer, SynthesisRequest};

/// Longest wait honored from a backend `Retry-After` hint
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Wraps a provider and retries transient failures with linear backoff
pub struct RetryingSynthesizer {
    inner: Box<dyn SpeechSynthesizer>,
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryingSynthesizer {
    pub fn new(inner: Box<dyn SpeechSynthesizer>, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            base_delay: Duration::from_millis(500),
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Override the backoff step (tests use zero)
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Cap on any single wait, including backend-requested ones
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    fn delay_for(&self, error: &SynthesisError, attempt: u32) -> Duration {
        let delay = match error {
            SynthesisError::RateLimited {
                retry_after: Some(secs),
            } => Duration::from_secs(*secs),
            _ => self.base_delay * attempt,
        };
        delay.min(self.max_delay)
    }
}

#[async_trait]
impl SpeechSynthesizer for RetryingSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            match self.inner.synthesize(request).await {
                Ok(audio) => return Ok(audio),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "{} request failed (attempt {}/{}): {}",
                        self.inner.name(),
                        attempt,
                        self.max_retries + 1,
                        e
                    );
                    tokio::time::sleep(self.delay_for(&e, attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn is_available(&self) -> Result<()> {
        self.inner.is_available()
    }
}
