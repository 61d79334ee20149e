//! Text processing for narration: line repair, sanitizing, and chunk planning.

pub mod chunker;
pub mod normalizer;
pub mod sanitizer;

pub use chunker::plan_chunks;
pub use normalizer::{normalize, normalize_pages};
pub use sanitizer::Sanitizer;

/// A bounded slice of sanitized text, submitted as one synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    /// Position of this segment within its unit
    pub ordinal: usize,
    /// The exact text of this slice
    pub content: String,
}

impl TextSegment {
    /// Create a new text segment.
    pub fn new(ordinal: usize, content: impl Into<String>) -> Self {
        Self {
            ordinal,
            content: content.into(),
        }
    }

    /// Length in characters, the unit the chunk budget is measured in.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
