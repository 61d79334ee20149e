//! Audio assembly and output naming.

pub mod assembler;

pub use assembler::{AssemblyError, AudioBuffer, assemble, write_audio};

use crate::tts::NarrationUnit;
use tts_client::AudioEncoding;

/// Suggested output filename for a unit, e.g. `chapter_03.mp3`.
pub fn suggested_filename(unit: &NarrationUnit, encoding: AudioEncoding) -> String {
    let stem = match unit {
        NarrationUnit::Summary => "summary".to_string(),
        NarrationUnit::Chapter { index, .. } => format!("chapter_{:02}", index + 1),
        NarrationUnit::Full => "full_thesis".to_string(),
    };
    format!("{}.{}", stem, encoding.extension())
}
