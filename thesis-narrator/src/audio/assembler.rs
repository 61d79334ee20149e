//! Joining synthesized chunk audio into one unit file.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tts_client::AudioEncoding;

/// Encoded audio for one synthesized segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    /// Ordinal of the text segment this audio was synthesized from
    pub ordinal: usize,
    pub bytes: Vec<u8>,
}

impl AudioBuffer {
    pub fn new(ordinal: usize, bytes: Vec<u8>) -> Self {
        Self { ordinal, bytes }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("{encoding:?} audio cannot be joined byte-for-byte ({count} buffers)")]
    UnsupportedEncoding { encoding: AudioEncoding, count: usize },

    #[error("Audio buffer ordinals are not contiguous: expected {expected}, found {found}")]
    OrdinalGap { expected: usize, found: usize },
}

/// Concatenate buffers in ordinal order.
///
/// Buffers may arrive in any order. Their ordinals must form exactly
/// `0..n`; a gap or duplicate means a chunk went missing upstream and is
/// reported rather than producing truncated audio. A single buffer is returned
/// as-is for any encoding.
pub fn assemble(
    encoding: AudioEncoding,
    mut buffers: Vec<AudioBuffer>,
) -> std::result::Result<Vec<u8>, AssemblyError> {
    if buffers.len() > 1 && !encoding.supports_concatenation() {
        return Err(AssemblyError::UnsupportedEncoding {
            encoding,
            count: buffers.len(),
        });
    }

    buffers.sort_by_key(|b| b.ordinal);
    for (expected, buffer) in buffers.iter().enumerate() {
        if buffer.ordinal != expected {
            return Err(AssemblyError::OrdinalGap {
                expected,
                found: buffer.ordinal,
            });
        }
    }

    let total: usize = buffers.iter().map(|b| b.bytes.len()).sum();
    let mut output = Vec::with_capacity(total);
    for buffer in &buffers {
        output.extend_from_slice(&buffer.bytes);
    }
    debug!("assembled {} buffers into {} bytes", buffers.len(), total);
    Ok(output)
}

/// Write assembled audio, creating the parent directory if needed.
pub fn write_audio(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
