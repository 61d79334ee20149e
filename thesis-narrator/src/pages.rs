// Document sources yielding ordered page texts

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Page separator in plain-text dumps (`pdftotext` and similar tools)
const FORM_FEED: char = '\x0c';

/// A document that can be read as an ordered sequence of page texts.
pub trait PageSource {
    /// Read every page in order.
    ///
    /// A document whose text cannot be extracted yields an empty list rather
    /// than an error; only failing to read the source at all is an error.
    fn pages(&self) -> Result<Vec<String>> {
        let bytes = self.source_bytes()?;
        Ok(self.pages_from_bytes(&bytes))
    }

    /// Raw bytes identifying this document, used as the cache key.
    fn source_bytes(&self) -> Result<Vec<u8>>;

    /// Pages of this document from bytes already read by `source_bytes`.
    fn pages_from_bytes(&self, bytes: &[u8]) -> Vec<String>;
}

/// Text-layer PDF read with `pdf-extract`.
#[derive(Debug, Clone)]
pub struct PdfPages {
    path: PathBuf,
}

impl PdfPages {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Extract per-page text from in-memory PDF bytes.
    pub fn from_bytes(bytes: &[u8]) -> Vec<String> {
        // pdf-extract panics on some malformed font tables
        let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes));
        match result {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => {
                warn!("PDF text extraction failed, continuing with no text: {}", e);
                Vec::new()
            }
            Err(_) => {
                warn!("PDF text extraction aborted, continuing with no text");
                Vec::new()
            }
        }
    }
}

impl PageSource for PdfPages {
    fn source_bytes(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))
    }

    fn pages_from_bytes(&self, bytes: &[u8]) -> Vec<String> {
        let pages = Self::from_bytes(bytes);
        debug!("extracted {} pages from {}", pages.len(), self.path.display());
        pages
    }
}

/// Plain-text dump with pages separated by form feeds.
#[derive(Debug, Clone)]
pub struct TextPages {
    path: PathBuf,
}

impl TextPages {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Split a text dump into pages, dropping a trailing empty page.
    pub fn split(text: &str) -> Vec<String> {
        let mut pages: Vec<String> = text.split(FORM_FEED).map(str::to_string).collect();
        if pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }
        pages
    }
}

impl PageSource for TextPages {
    fn source_bytes(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))
    }

    fn pages_from_bytes(&self, bytes: &[u8]) -> Vec<String> {
        Self::split(&String::from_utf8_lossy(bytes))
    }
}

/// Choose a page source by file extension: `.pdf` is parsed, anything else
/// is read as a text dump.
pub fn open(path: &Path) -> Box<dyn PageSource> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        Box::new(PdfPages::new(path))
    } else {
        Box::new(TextPages::new(path))
    }
}
