//! Record cache persistence: hashing sources, loading and saving parsed records.

use super::CachedRecord;
use crate::thesis::ThesisRecord;
use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Compute the cache key of a source document.
///
/// SHA256 of the full contents, first 16 hex characters.
pub fn compute_source_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("{:x}", result)[..16].to_string()
}

/// On-disk cache of parsed records, one JSON file per source hash.
#[derive(Debug, Clone)]
pub struct RecordCache {
    dir: PathBuf,
}

impl RecordCache {
    /// Cache rooted at an explicit directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache under the platform data directory.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .map(|d| d.join("thesis-narrator").join("records"))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(Self::new(dir))
    }

    fn entry_path(&self, source_hash: &str) -> PathBuf {
        self.dir.join(format!("{}.json", source_hash))
    }

    /// Load the cached entry for a hash.
    ///
    /// A missing entry is `None`; an unreadable one is logged and treated as
    /// missing so it gets replaced.
    pub fn load(&self, source_hash: &str) -> Result<Option<CachedRecord>> {
        let path = self.entry_path(source_hash);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path).context("Failed to open cached record")?;
        match serde_json::from_reader::<_, CachedRecord>(BufReader::new(file)) {
            Ok(entry) if entry.source_hash == source_hash => Ok(Some(entry)),
            Ok(_) => {
                warn!("Cached record {} has a mismatched hash, ignoring", path.display());
                Ok(None)
            }
            Err(e) => {
                warn!("Cached record {} is corrupt, ignoring: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Save an entry, replacing any previous record for the same source.
    pub fn save(&self, entry: &CachedRecord) -> Result<()> {
        fs::create_dir_all(&self.dir).context("Failed to create record cache directory")?;

        let path = self.entry_path(&entry.source_hash);
        let file = File::create(&path).context("Failed to create cached record file")?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, entry).context("Failed to write cached record")?;
        debug!("cached record at {}", path.display());
        Ok(())
    }

    /// Return the cached record for `source_bytes`, or run `parse` and cache it.
    ///
    /// With `refresh` set the cache is not read, but the fresh parse still
    /// replaces the stored entry.
    pub fn load_or_parse<F>(
        &self,
        source_path: &Path,
        source_bytes: &[u8],
        refresh: bool,
        parse: F,
    ) -> Result<CachedRecord>
    where
        F: FnOnce() -> Result<ThesisRecord>,
    {
        let source_hash = compute_source_hash(source_bytes);

        if !refresh {
            if let Some(entry) = self.load(&source_hash)? {
                debug!("record cache hit for {}", source_hash);
                return Ok(entry);
            }
        }

        let entry = CachedRecord {
            source_hash,
            source_path: source_path.to_path_buf(),
            created_at: Utc::now(),
            record: parse()?,
        };
        self.save(&entry)?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thesis::Chapter;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn record(title: &str) -> ThesisRecord {
        ThesisRecord {
            title: title.to_string(),
            summary: "요약".to_string(),
            chapters: vec![Chapter::new("Ⅰ.", "본문")],
        }
    }

    #[test]
    fn test_compute_source_hash() {
        let hash = compute_source_hash(b"test content");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, compute_source_hash(b"test content"));
        assert_ne!(hash, compute_source_hash(b"other content"));
    }

    #[test]
    fn test_load_missing_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RecordCache::new(temp_dir.path());
        assert!(cache.load("0123456789abcdef").unwrap().is_none());
    }

    #[test]
    fn test_parse_once_then_hit() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RecordCache::new(temp_dir.path().join("records"));
        let parses = Cell::new(0);
        let parse = || {
            parses.set(parses.get() + 1);
            Ok(record("첫 제목"))
        };

        let first = cache
            .load_or_parse(Path::new("a.pdf"), b"pdf bytes", false, parse)
            .unwrap();
        let second = cache
            .load_or_parse(Path::new("a.pdf"), b"pdf bytes", false, || Ok(record("다른 제목")))
            .unwrap();

        assert_eq!(parses.get(), 1);
        assert_eq!(second.record, first.record);
        assert_eq!(second.created_at, first.created_at);
    }

    #[test]
    fn test_refresh_reparses() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RecordCache::new(temp_dir.path());

        cache
            .load_or_parse(Path::new("a.pdf"), b"bytes", false, || Ok(record("old")))
            .unwrap();
        let refreshed = cache
            .load_or_parse(Path::new("a.pdf"), b"bytes", true, || Ok(record("new")))
            .unwrap();
        assert_eq!(refreshed.record.title, "new");

        let hash = compute_source_hash(b"bytes");
        assert_eq!(cache.load(&hash).unwrap().unwrap().record.title, "new");
    }

    #[test]
    fn test_different_sources_do_not_collide() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RecordCache::new(temp_dir.path());

        let a = cache
            .load_or_parse(Path::new("a.pdf"), b"first", false, || Ok(record("A")))
            .unwrap();
        let b = cache
            .load_or_parse(Path::new("b.pdf"), b"second", false, || Ok(record("B")))
            .unwrap();
        assert_ne!(a.source_hash, b.source_hash);
        assert_eq!(cache.load(&a.source_hash).unwrap().unwrap().record.title, "A");
    }

    #[test]
    fn test_corrupt_entry_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RecordCache::new(temp_dir.path());
        let hash = compute_source_hash(b"bytes");
        fs::write(temp_dir.path().join(format!("{}.json", hash)), "{not json").unwrap();

        assert!(cache.load(&hash).unwrap().is_none());
        let entry = cache
            .load_or_parse(Path::new("a.pdf"), b"bytes", false, || Ok(record("fresh")))
            .unwrap();
        assert_eq!(entry.record.title, "fresh");
    }

    #[test]
    fn test_parse_error_is_propagated_and_not_cached() {
        let temp_dir = TempDir::new().unwrap();
        let cache = RecordCache::new(temp_dir.path());
        let result = cache.load_or_parse(Path::new("a.pdf"), b"bytes", false, || {
            anyhow::bail!("unreadable")
        });
        assert!(result.is_err());
        assert!(cache.load(&compute_source_hash(b"bytes")).unwrap().is_none());
    }
}
