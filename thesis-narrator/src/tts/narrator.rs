//! Chunked synthesis of one narration unit.

use futures_util::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tts_client::{SpeechSynthesizer, SynthesisError};

use super::{NarrationUnit, VoiceSettings, wrap_markup};
use crate::audio::{AssemblyError, AudioBuffer, assemble};
use crate::text::chunker::DEFAULT_CHUNK_BUDGET;
use crate::text::{Sanitizer, TextSegment, plan_chunks};

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("Synthesis failed for {unit} at chunk {} of {total}: {source}", .chunk + 1)]
    Synthesis {
        unit: String,
        /// Ordinal of the failing chunk
        chunk: usize,
        total: usize,
        source: SynthesisError,
    },

    #[error("Audio assembly failed: {0}")]
    Assembly(#[from] AssemblyError),
}

/// Assembled audio for one unit
#[derive(Debug, Clone)]
pub struct NarratedAudio {
    pub unit: NarrationUnit,
    pub bytes: Vec<u8>,
    pub chunk_count: usize,
}

/// Turns unit scripts into audio: sanitize, plan chunks, synthesize, assemble.
pub struct Narrator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voice: VoiceSettings,
    chunk_budget: usize,
    sanitizer: Sanitizer,
    max_concurrency: usize,
}

impl Narrator {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, voice: VoiceSettings) -> Self {
        Self {
            synthesizer,
            voice,
            chunk_budget: DEFAULT_CHUNK_BUDGET,
            sanitizer: Sanitizer::new(),
            max_concurrency: 1,
        }
    }

    pub fn with_chunk_budget(mut self, budget: usize) -> Self {
        self.chunk_budget = budget.max(1);
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Number of chunk requests allowed in flight at once (1 = sequential).
    pub fn with_max_concurrency(mut self, jobs: usize) -> Self {
        self.max_concurrency = jobs.max(1);
        self
    }

    pub fn voice(&self) -> &VoiceSettings {
        &self.voice
    }

    /// Chunk plan for a unit's script after sanitizing.
    pub fn plan(&self, unit: &NarrationUnit, script: &str) -> Vec<TextSegment> {
        let sanitized = self.sanitizer.sanitize(script, unit.has_section_break());
        plan_chunks(&sanitized, self.chunk_budget)
    }

    /// Synthesize a unit into one audio buffer.
    ///
    /// Returns `Ok(None)` when the script has nothing to say. The first failing
    /// chunk aborts the unit: requests still in flight are dropped and no
    /// partial audio is returned. `progress` receives `(completed, total)`
    /// after each chunk.
    pub async fn narrate<F>(
        &self,
        unit: &NarrationUnit,
        script: &str,
        progress: F,
    ) -> Result<Option<NarratedAudio>, NarrationError>
    where
        F: Fn(usize, usize),
    {
        let segments = self.plan(unit, script);
        if segments.is_empty() {
            debug!("{}: empty script, skipping", unit);
            return Ok(None);
        }

        let total = segments.len();
        if total > 1 && !self.voice.encoding.supports_concatenation() {
            return Err(AssemblyError::UnsupportedEncoding {
                encoding: self.voice.encoding,
                count: total,
            }
            .into());
        }
        info!("narrating {} in {} chunks with {}", unit, total, self.synthesizer.name());

        let completed = AtomicUsize::new(0);
        let unit_name = unit.to_string();

        let buffers: Vec<AudioBuffer> = stream::iter(segments.into_iter().map(|segment| {
            let request = self.voice.request(wrap_markup(&segment.content));
            let completed = &completed;
            let progress = &progress;
            let unit_name = &unit_name;
            async move {
                let bytes = self
                    .synthesizer
                    .synthesize(&request)
                    .await
                    .map_err(|source| NarrationError::Synthesis {
                        unit: unit_name.clone(),
                        chunk: segment.ordinal,
                        total,
                        source,
                    })?;
                debug!("{}: chunk {} -> {} bytes", unit_name, segment.ordinal, bytes.len());
                progress(completed.fetch_add(1, Ordering::SeqCst) + 1, total);
                Ok::<_, NarrationError>(AudioBuffer::new(segment.ordinal, bytes))
            }
        }))
        .buffer_unordered(self.max_concurrency)
        .try_collect()
        .await?;

        let bytes = assemble(self.voice.encoding, buffers)?;
        Ok(Some(NarratedAudio {
            unit: unit.clone(),
            bytes,
            chunk_count: total,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tts_client::{AudioEncoding, MockSynthesizer};

    fn narrator(mock: Arc<MockSynthesizer>, budget: usize) -> Narrator {
        Narrator::new(mock, VoiceSettings::default()).with_chunk_budget(budget)
    }

    fn long_script() -> String {
        (1..=12)
            .map(|i| format!("문장 번호 {}번은 여기서 끝난다.", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[tokio::test]
    async fn test_narrate_concatenates_chunks_in_order() {
        let mock = Arc::new(MockSynthesizer::always_succeeds());
        let narrator = narrator(mock.clone(), 40);
        let script = long_script();

        let audio = narrator
            .narrate(&NarrationUnit::Summary, &script, |_, _| {})
            .await
            .unwrap()
            .unwrap();

        // The mock echoes markup, so the audio is every wrapped chunk in order.
        let plan = narrator.plan(&NarrationUnit::Summary, &script);
        let expected: String = plan.iter().map(|s| wrap_markup(&s.content)).collect();
        assert_eq!(audio.bytes, expected.into_bytes());
        assert_eq!(audio.chunk_count, plan.len());
        assert!(plan.len() > 1);
        assert_eq!(mock.call_count(), plan.len());
    }

    #[tokio::test]
    async fn test_every_request_within_budget() {
        let mock = Arc::new(MockSynthesizer::always_succeeds());
        let narrator = narrator(mock.clone(), 30);
        narrator
            .narrate(&NarrationUnit::Full, &long_script(), |_, _| {})
            .await
            .unwrap();

        for ssml in mock.requests() {
            let inner = ssml
                .strip_prefix("<speak>")
                .and_then(|s| s.strip_suffix("</speak>"))
                .unwrap();
            assert!(inner.chars().count() <= 30);
        }
    }

    #[tokio::test]
    async fn test_empty_script_makes_no_requests() {
        let mock = Arc::new(MockSynthesizer::always_succeeds());
        let narrator = narrator(mock.clone(), 100);
        let result = narrator
            .narrate(&NarrationUnit::Summary, "   ", |_, _| {})
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_aborts_and_names_chunk() {
        let mock = Arc::new(MockSynthesizer::fails_on(
            "번호 5번",
            SynthesisError::InvalidInput("bad markup".into()),
        ));
        let narrator = narrator(mock.clone(), 40);
        let unit = NarrationUnit::Chapter {
            index: 1,
            label: "Ⅱ.".to_string(),
        };
        let script = long_script();

        let failing = narrator
            .plan(&unit, &script)
            .iter()
            .position(|s| s.content.contains("번호 5번"))
            .unwrap();

        let err = narrator.narrate(&unit, &script, |_, _| {}).await.unwrap_err();
        match err {
            NarrationError::Synthesis { unit, chunk, source, .. } => {
                assert_eq!(unit, "chapter 2 (Ⅱ.)");
                assert_eq!(chunk, failing);
                assert!(matches!(source, SynthesisError::InvalidInput(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        // Sequential narration stops at the failing chunk.
        assert_eq!(mock.call_count(), failing + 1);
    }

    #[tokio::test]
    async fn test_concurrent_narration_matches_sequential() {
        let script = long_script();

        let sequential = narrator(Arc::new(MockSynthesizer::always_succeeds()), 35)
            .narrate(&NarrationUnit::Full, &script, |_, _| {})
            .await
            .unwrap()
            .unwrap();

        let concurrent = narrator(Arc::new(MockSynthesizer::always_succeeds()), 35)
            .with_max_concurrency(4)
            .narrate(&NarrationUnit::Full, &script, |_, _| {})
            .await
            .unwrap()
            .unwrap();

        assert_eq!(sequential.bytes, concurrent.bytes);
    }

    #[tokio::test]
    async fn test_progress_reports_each_chunk() {
        let mock = Arc::new(MockSynthesizer::always_succeeds());
        let narrator = narrator(mock, 40);
        let seen = Mutex::new(Vec::new());

        narrator
            .narrate(&NarrationUnit::Summary, &long_script(), |done, total| {
                seen.lock().unwrap().push((done, total));
            })
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        let total = seen[0].1;
        assert_eq!(seen.len(), total);
        assert_eq!(seen.last(), Some(&(total, total)));
    }

    async fn narrate_full(script: &str) -> Vec<u8> {
        narrator(Arc::new(MockSynthesizer::always_succeeds()), 25)
            .narrate(&NarrationUnit::Full, script, |_, _| {})
            .await
            .unwrap()
            .unwrap()
            .bytes
    }

    #[tokio::test]
    async fn test_pipeline_is_deterministic() {
        let script = long_script();
        assert_eq!(narrate_full(&script).await, narrate_full(&script).await);
    }

    #[tokio::test]
    async fn test_uncatenable_encoding_fails_before_synthesis() {
        let mock = Arc::new(MockSynthesizer::always_succeeds());
        let narrator = Narrator::new(
            mock.clone(),
            VoiceSettings::new().with_encoding(AudioEncoding::Linear16),
        )
        .with_chunk_budget(30);

        let err = narrator
            .narrate(&NarrationUnit::Summary, &long_script(), |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NarrationError::Assembly(AssemblyError::UnsupportedEncoding { .. })
        ));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_uncatenable_encoding_single_chunk_is_narrated() {
        let mock = Arc::new(MockSynthesizer::always_succeeds());
        let narrator = Narrator::new(
            mock.clone(),
            VoiceSettings::new().with_encoding(AudioEncoding::Linear16),
        );

        let audio = narrator
            .narrate(&NarrationUnit::Summary, "짧은 요약이다.", |_, _| {})
            .await
            .unwrap()
            .unwrap();
        assert_eq!(audio.chunk_count, 1);
        assert_eq!(mock.call_count(), 1);
    }
}
