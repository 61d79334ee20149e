use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Audio encoding requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    Mp3,
    OggOpus,
    Linear16,
}

impl AudioEncoding {
    /// Parse an encoding name as written in config files or on the command line
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "ogg" | "opus" | "ogg_opus" | "ogg-opus" => Some(Self::OggOpus),
            "wav" | "linear16" | "pcm" => Some(Self::Linear16),
            _ => None,
        }
    }

    /// Name the Google Cloud TTS API uses for this encoding
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Mp3 => "MP3",
            Self::OggOpus => "OGG_OPUS",
            Self::Linear16 => "LINEAR16",
        }
    }

    /// File extension for audio in this encoding
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggOpus => "ogg",
            Self::Linear16 => "wav",
        }
    }

    /// Whether independently synthesized buffers can be joined byte-for-byte.
    ///
    /// MP3 frames are self-delimiting and Ogg allows chained streams. LINEAR16
    /// responses each carry their own WAV header, so joining them corrupts the file.
    pub fn supports_concatenation(&self) -> bool {
        matches!(self, Self::Mp3 | Self::OggOpus)
    }
}

/// Voice selection sent with each request
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSelection {
    pub language_code: String,
    pub name: String,
}

/// One synthesis request: markup text plus voice configuration
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub ssml: String,
    pub voice: VoiceSelection,
    pub speaking_rate: f32,
    pub encoding: AudioEncoding,
}

/// Trait for speech synthesis backends
///
/// Implementations hold no per-request state, so one instance is shared across
/// chunks and across unrelated requests.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one markup document into encoded audio bytes
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Check if the provider is usable (credentials present, etc.)
    fn is_available(&self) -> Result<()>;
}
