//! Google Cloud Text-to-Speech provider
//!
//! Direct HTTP implementation of the `text:synthesize` REST endpoint.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Credential;
use crate::error::{Result, SynthesisError};
use crate::provider::{SpeechSynthesizer, SynthesisRequest};

const GOOGLE_TTS_BASE_URL: &str = "https://texttospeech.googleapis.com";

/// Provider for Google Cloud TTS calls
pub struct GoogleTtsProvider {
    credential: Credential,
    endpoint: String,
    client: Client,
}

impl GoogleTtsProvider {
    /// Create a new Google TTS provider
    pub fn new(credential: Credential, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SynthesisError::ConfigError(format!("HTTP client setup failed: {}", e)))?;

        let base = base_url.unwrap_or(GOOGLE_TTS_BASE_URL).trim_end_matches('/');

        Ok(Self {
            credential,
            endpoint: format!("{}/v1/text:synthesize", base),
            client,
        })
    }
}

// Google TTS request/response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: Input<'a>,
    voice: Voice<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct Input<'a> {
    ssml: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Voice<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Map a non-success status to the matching error variant
fn classify_status(status: u16, message: String, retry_after: Option<u64>) -> SynthesisError {
    match status {
        401 | 403 => SynthesisError::Unauthorized {
            message,
            status_code: status,
        },
        429 => SynthesisError::RateLimited { retry_after },
        400 | 413 => SynthesisError::InvalidInput(message),
        500 | 502 | 503 | 504 => SynthesisError::ServerUnavailable {
            message,
            status_code: status,
        },
        _ => SynthesisError::ApiError {
            message,
            status_code: Some(status),
        },
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsProvider {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        let body = SynthesizeRequest {
            input: Input {
                ssml: &request.ssml,
            },
            voice: Voice {
                language_code: &request.voice.language_code,
                name: &request.voice.name,
            },
            audio_config: AudioConfig {
                audio_encoding: request.encoding.api_name(),
                speaking_rate: request.speaking_rate,
            },
        };

        let builder = self.client.post(&self.endpoint).json(&body);
        let builder = match &self.credential {
            Credential::ApiKey(_) => builder.query(&[("key", self.credential.secret())]),
            Credential::AccessToken(_) => builder.bearer_auth(self.credential.secret()),
        };

        let response = builder.send().await.map_err(|e| SynthesisError::ApiError {
            // reqwest errors can echo the URL, which carries the key
            message: format!("Request failed: {}", e.without_url()),
            status_code: None,
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            return Err(classify_status(status.as_u16(), message, retry_after));
        }

        let api_response: SynthesizeResponse =
            response.json().await.map_err(|e| SynthesisError::ApiError {
                message: format!("Failed to parse response: {}", e.without_url()),
                status_code: None,
            })?;

        general_purpose::STANDARD
            .decode(api_response.audio_content.as_bytes())
            .map_err(|e| SynthesisError::Decode(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "Google Cloud TTS"
    }

    fn is_available(&self) -> Result<()> {
        // Credential was provided in constructor
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AudioEncoding, VoiceSelection};

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(401, "bad key".into(), None),
            SynthesisError::Unauthorized { status_code: 401, .. }
        ));
        assert!(matches!(
            classify_status(429, "slow down".into(), Some(7)),
            SynthesisError::RateLimited { retry_after: Some(7) }
        ));
        assert!(matches!(
            classify_status(400, "invalid ssml".into(), None),
            SynthesisError::InvalidInput(_)
        ));
        assert!(matches!(
            classify_status(503, "overloaded".into(), None),
            SynthesisError::ServerUnavailable { .. }
        ));
        assert!(matches!(
            classify_status(418, "teapot".into(), None),
            SynthesisError::ApiError {
                status_code: Some(418),
                ..
            }
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let request = SynthesisRequest {
            ssml: "<speak>안녕하세요</speak>".to_string(),
            voice: VoiceSelection {
                language_code: "ko-KR".to_string(),
                name: "ko-KR-Neural2-B".to_string(),
            },
            speaking_rate: 1.1,
            encoding: AudioEncoding::Mp3,
        };
        let body = SynthesizeRequest {
            input: Input {
                ssml: &request.ssml,
            },
            voice: Voice {
                language_code: &request.voice.language_code,
                name: &request.voice.name,
            },
            audio_config: AudioConfig {
                audio_encoding: request.encoding.api_name(),
                speaking_rate: request.speaking_rate,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["input"]["ssml"], "<speak>안녕하세요</speak>");
        assert_eq!(json["voice"]["languageCode"], "ko-KR");
        assert_eq!(json["voice"]["name"], "ko-KR-Neural2-B");
        assert_eq!(json["audioConfig"]["audioEncoding"], "MP3");
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let provider = GoogleTtsProvider::new(
            Credential::ApiKey("k".into()),
            Some("http://localhost:8080/"),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(provider.endpoint, "http://localhost:8080/v1/text:synthesize");
    }
}
