//! thesis-narrator configuration management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tts_client::AudioEncoding;

use crate::text::chunker::DEFAULT_CHUNK_BUDGET;
use crate::text::sanitizer::DEFAULT_PAUSE_MS;
use crate::thesis::segmenter::{DEFAULT_MIN_CHAPTER_CHARS, DEFAULT_SUMMARY_FALLBACK_CHARS};
use crate::tts::{DEFAULT_LANGUAGE_CODE, DEFAULT_SPEAKING_RATE, DEFAULT_VOICE_NAME};

const MIN_CHUNK_BUDGET: usize = 100;
/// A full chunk of 3-byte Hangul plus the `<speak>` wrapper stays under the
/// backend's 5000-byte request limit.
const MAX_CHUNK_BUDGET: usize = 1500;
const MAX_JOBS: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarratorConfig {
    /// Backend voice identifier
    #[serde(default = "default_voice_name")]
    pub voice_name: String,

    /// Language code of the voice
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Speaking rate (0.25-4.0)
    #[serde(default = "default_speaking_rate")]
    pub speaking_rate: f32,

    /// Audio encoding (mp3, ogg_opus, linear16)
    #[serde(default = "default_encoding")]
    pub encoding: AudioEncoding,

    /// Maximum characters per synthesis request (100-1500)
    #[serde(default = "default_chunk_budget")]
    pub chunk_budget: usize,

    /// Pause after a chapter's first sentence, in ms (0 disables)
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u32,

    /// Chunk requests in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Chapters with fewer body characters are treated as stray markers
    #[serde(default = "default_min_chapter_chars")]
    pub min_chapter_chars: usize,

    /// Summary length when no summary heading is found
    #[serde(default = "default_summary_fallback_chars")]
    pub summary_fallback_chars: usize,
}

fn default_voice_name() -> String {
    DEFAULT_VOICE_NAME.to_string()
}

fn default_language_code() -> String {
    DEFAULT_LANGUAGE_CODE.to_string()
}

fn default_speaking_rate() -> f32 {
    DEFAULT_SPEAKING_RATE
}

fn default_encoding() -> AudioEncoding {
    AudioEncoding::Mp3
}

fn default_chunk_budget() -> usize {
    DEFAULT_CHUNK_BUDGET
}

fn default_pause_ms() -> u32 {
    DEFAULT_PAUSE_MS
}

fn default_max_concurrency() -> usize {
    1
}

fn default_min_chapter_chars() -> usize {
    DEFAULT_MIN_CHAPTER_CHARS
}

fn default_summary_fallback_chars() -> usize {
    DEFAULT_SUMMARY_FALLBACK_CHARS
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            voice_name: default_voice_name(),
            language_code: default_language_code(),
            speaking_rate: default_speaking_rate(),
            encoding: default_encoding(),
            chunk_budget: default_chunk_budget(),
            pause_ms: default_pause_ms(),
            max_concurrency: default_max_concurrency(),
            min_chapter_chars: default_min_chapter_chars(),
            summary_fallback_chars: default_summary_fallback_chars(),
        }
    }
}

/// Clamp a speaking rate into the range the backend accepts.
pub fn clamp_speaking_rate(rate: f32) -> f32 {
    rate.clamp(0.25, 4.0)
}

/// Clamp a chunk budget into the supported range.
pub fn clamp_chunk_budget(budget: usize) -> usize {
    budget.clamp(MIN_CHUNK_BUDGET, MAX_CHUNK_BUDGET)
}

/// Clamp the number of concurrent chunk requests.
pub fn clamp_jobs(jobs: usize) -> usize {
    jobs.clamp(1, MAX_JOBS)
}

impl NarratorConfig {
    /// Get the config file path: <config dir>/thesis-narrator/narrator.toml
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(dir.join("thesis-narrator").join("narrator.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: NarratorConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config.clamped())
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Copy with every numeric field pulled into its valid range.
    pub fn clamped(mut self) -> Self {
        self.speaking_rate = clamp_speaking_rate(self.speaking_rate);
        self.chunk_budget = clamp_chunk_budget(self.chunk_budget);
        self.max_concurrency = clamp_jobs(self.max_concurrency);
        self
    }
}
