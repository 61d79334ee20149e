//! Narration of thesis units through a speech synthesis backend.

pub mod narrator;

use anyhow::{Context, Result};
use std::fmt;
use std::sync::Arc;
use tts_client::{
    AudioEncoding, ProviderConfig, SpeechSynthesizer, SynthesisRequest, VoiceSelection,
    get_synthesizer,
};

use crate::thesis::ThesisRecord;
pub use narrator::{NarratedAudio, NarrationError, Narrator};

pub const DEFAULT_VOICE_NAME: &str = "ko-KR-Neural2-B";
pub const DEFAULT_LANGUAGE_CODE: &str = "ko-KR";
pub const DEFAULT_SPEAKING_RATE: f32 = 1.1;

/// Voice parameters sent with every chunk of a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    /// Backend voice identifier
    pub voice_name: String,
    /// BCP-47 language code of the voice
    pub language_code: String,
    /// Speaking rate (0.25-4.0, default 1.1)
    /// 1.0 is the voice's natural pace
    pub speaking_rate: f32,
    pub encoding: AudioEncoding,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice_name: DEFAULT_VOICE_NAME.to_string(),
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            speaking_rate: DEFAULT_SPEAKING_RATE,
            encoding: AudioEncoding::Mp3,
        }
    }
}

impl VoiceSettings {
    /// Create voice settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the voice. A name like `en-US-Neural2-C` also sets the language code.
    pub fn with_voice(mut self, name: impl Into<String>) -> Self {
        self.voice_name = name.into();
        let parts: Vec<&str> = self.voice_name.splitn(3, '-').collect();
        if parts.len() == 3 && parts[0].len() == 2 && parts[1].len() == 2 {
            self.language_code = format!("{}-{}", parts[0], parts[1]);
        }
        self
    }

    /// Set the language code explicitly.
    pub fn with_language_code(mut self, code: impl Into<String>) -> Self {
        self.language_code = code.into();
        self
    }

    /// Set the speaking rate.
    pub fn with_speaking_rate(mut self, rate: f32) -> Self {
        self.speaking_rate = rate.clamp(0.25, 4.0);
        self
    }

    /// Set the audio encoding.
    pub fn with_encoding(mut self, encoding: AudioEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Build the request for one wrapped chunk.
    pub fn request(&self, ssml: String) -> SynthesisRequest {
        SynthesisRequest {
            ssml,
            voice: VoiceSelection {
                language_code: self.language_code.clone(),
                name: self.voice_name.clone(),
            },
            speaking_rate: self.speaking_rate,
            encoding: self.encoding,
        }
    }
}

/// A part of the paper narrated to its own audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationUnit {
    Summary,
    /// Zero-based chapter index and its marker label
    Chapter { index: usize, label: String },
    Full,
}

impl NarrationUnit {
    /// Unit for a chapter of `record`, if the index exists.
    pub fn chapter(record: &ThesisRecord, index: usize) -> Option<Self> {
        record.chapter(index).map(|c| Self::Chapter {
            index,
            label: c.label.clone(),
        })
    }

    /// Text to narrate for this unit, or None for a chapter index out of range.
    pub fn script(&self, record: &ThesisRecord) -> Option<String> {
        match self {
            Self::Summary => Some(record.summary.clone()),
            Self::Chapter { index, .. } => record.chapter(*index).map(|c| c.body.clone()),
            Self::Full => Some(record.full_script()),
        }
    }

    /// Whether a spoken pause follows the unit's first sentence.
    pub fn has_section_break(&self) -> bool {
        !matches!(self, Self::Summary)
    }
}

impl fmt::Display for NarrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Chapter { index, label } => write!(f, "chapter {} ({})", index + 1, label),
            Self::Full => write!(f, "full thesis"),
        }
    }
}

/// Wrap sanitized chunk text in the SSML document element.
pub fn wrap_markup(text: &str) -> String {
    format!("<speak>{}</speak>", text)
}

/// Create the synthesis backend from provider config.
///
/// Fails early when credentials are missing so no document work is wasted.
pub fn create_synthesizer(config: &ProviderConfig) -> Result<Arc<dyn SpeechSynthesizer>> {
    let synthesizer = get_synthesizer(config).context("Failed to create speech synthesizer")?;
    synthesizer
        .is_available()
        .with_context(|| format!("{} is not available", synthesizer.name()))?;
    Ok(Arc::from(synthesizer))
}
