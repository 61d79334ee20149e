//! Session-scoped cache of parsed thesis records.

mod persistence;

pub use persistence::RecordCache;

use crate::thesis::ThesisRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A parsed record stored with the identity of its source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRecord {
    /// SHA256 of the source bytes (first 16 hex chars)
    pub source_hash: String,
    /// Path the source was read from
    pub source_path: PathBuf,
    /// When the source was parsed
    pub created_at: DateTime<Utc>,
    pub record: ThesisRecord,
}

impl CachedRecord {
    /// The record to narrate, with an optional title override applied.
    ///
    /// The cached entry itself is never modified.
    pub fn record_with_title(&self, title: Option<&str>) -> ThesisRecord {
        match title {
            Some(t) if !t.trim().is_empty() => self.record.with_title(t.trim()),
            _ => self.record.clone(),
        }
    }
}
