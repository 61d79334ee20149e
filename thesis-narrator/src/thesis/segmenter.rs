//! Partitioning of normalized paper text into title, summary, and chapters.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Chapter, ThesisRecord};
use crate::text::normalizer::{is_boilerplate_line, is_metadata_line};

/// Minimum body length (in characters) a chapter must exceed to be kept.
pub const DEFAULT_MIN_CHAPTER_CHARS: usize = 100;

/// Length of the body prefix used when no summary heading is found.
pub const DEFAULT_SUMMARY_FALLBACK_CHARS: usize = 800;

/// Leading lines of the first page that may form the title.
pub const DEFAULT_MAX_TITLE_LINES: usize = 3;

/// References-section markers; the earliest occurrence in the text ends the body.
const REFERENCE_MARKERS: &[&str] = &["참고문헌", "參考文獻", "References", "REFERENCES", "Bibliography"];

static SUMMARY_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"국\s*문\s*요\s*약|국\s*문\s*초\s*록|요\s*약").expect("summary heading pattern")
});

static FOREIGN_ABSTRACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Abstract|ABSTRACT").expect("abstract heading pattern"));

static KEYWORD_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"주\s*제\s*어|핵\s*심\s*어|(?i:key\s*words?)").expect("keyword heading pattern")
});

static CHAPTER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[ⅠⅡⅢⅣⅤⅥⅦⅧⅨⅩ]\.|제\s*\d+\s*장|(?i:chapter)\s+\d+").expect("chapter marker pattern")
});

static TRAILING_PAGE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+\d{1,3}$").expect("trailing page number pattern"));

/// Deterministic splitter from document text to a [`ThesisRecord`].
///
/// Every step has a fallback, so segmentation never fails: a document with no
/// recognizable markers still yields a record.
#[derive(Debug, Clone)]
pub struct Segmenter {
    chapter_marker: Regex,
    summary_heading: Regex,
    /// Summary terminators in priority order (not document order)
    summary_terminators: Vec<Regex>,
    reference_markers: Vec<String>,
    min_chapter_chars: usize,
    summary_fallback_chars: usize,
    max_title_lines: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            chapter_marker: CHAPTER_MARKER.clone(),
            summary_heading: SUMMARY_HEADING.clone(),
            summary_terminators: vec![
                FOREIGN_ABSTRACT.clone(),
                KEYWORD_HEADING.clone(),
                CHAPTER_MARKER.clone(),
            ],
            reference_markers: REFERENCE_MARKERS.iter().map(|s| s.to_string()).collect(),
            min_chapter_chars: DEFAULT_MIN_CHAPTER_CHARS,
            summary_fallback_chars: DEFAULT_SUMMARY_FALLBACK_CHARS,
            max_title_lines: DEFAULT_MAX_TITLE_LINES,
        }
    }
}

impl Segmenter {
    /// Create a segmenter with the default markers and thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the summary terminators.
    ///
    /// The first pattern in this list that matches anywhere after the heading
    /// ends the summary, even when a later pattern matches earlier in the text.
    pub fn with_summary_terminators(mut self, terminators: Vec<Regex>) -> Self {
        self.summary_terminators = terminators;
        self
    }

    /// Set the minimum chapter body length.
    pub fn with_min_chapter_chars(mut self, chars: usize) -> Self {
        self.min_chapter_chars = chars;
        self
    }

    /// Set the length of the fallback summary.
    pub fn with_summary_fallback_chars(mut self, chars: usize) -> Self {
        self.summary_fallback_chars = chars;
        self
    }

    /// Set how many leading lines may form the title.
    pub fn with_max_title_lines(mut self, lines: usize) -> Self {
        self.max_title_lines = lines.max(1);
        self
    }

    /// Segment a document.
    ///
    /// `first_page` is the raw first page (its line structure locates the
    /// title); `text` is the normalized text of the whole document.
    pub fn segment(&self, first_page: &str, text: &str) -> ThesisRecord {
        let body = self.body(text);
        let record = ThesisRecord {
            title: self.title(first_page),
            summary: self.summary(body),
            chapters: self.chapters(body),
        };
        debug!(
            "segmented: title {:?}, summary {} chars, {} chapters",
            record.title,
            record.summary.chars().count(),
            record.chapters.len()
        );
        record
    }

    /// Text before the earliest references marker, or all of it.
    pub fn body<'a>(&self, text: &'a str) -> &'a str {
        let end = self
            .reference_markers
            .iter()
            .filter_map(|marker| text.find(marker.as_str()))
            .min()
            .unwrap_or(text.len());
        &text[..end]
    }

    /// Whether a line opens with a marker that ends the title block.
    fn starts_with_sentinel(&self, line: &str) -> bool {
        [&self.summary_heading, &*KEYWORD_HEADING, &*FOREIGN_ABSTRACT, &self.chapter_marker]
            .iter()
            .any(|re| re.find(line).is_some_and(|m| m.start() == 0))
    }

    /// Title from the leading lines of the first page.
    pub fn title(&self, first_page: &str) -> String {
        let lines: Vec<String> = first_page
            .lines()
            .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|l| !l.is_empty())
            .collect();

        let mut accumulated: Vec<String> = Vec::new();
        for line in lines.iter().filter(|l| !is_boilerplate_line(l)) {
            if self.starts_with_sentinel(line) {
                break;
            }
            if line.contains('*') {
                // The footnote asterisk marks the last line of the title
                let stripped = line.replace('*', "");
                let stripped = stripped.trim();
                if !stripped.is_empty() {
                    accumulated.push(stripped.to_string());
                }
                break;
            }
            accumulated.push(line.clone());
            if accumulated.len() >= self.max_title_lines {
                break;
            }
        }

        let title = strip_page_suffix(&accumulated.join(" "));
        if !title.is_empty() {
            return title;
        }

        lines
            .iter()
            .find(|l| !is_metadata_line(l))
            .map(|l| strip_page_suffix(l))
            .unwrap_or_default()
    }

    /// Summary between the abstract heading and the highest-priority terminator.
    pub fn summary(&self, body: &str) -> String {
        let captured = self.summary_heading.find(body).and_then(|heading| {
            let rest = &body[heading.end()..];
            self.summary_terminators
                .iter()
                .find_map(|terminator| terminator.find(rest))
                .map(|end| rest[..end.start()].trim())
        });

        match captured {
            Some(summary) if !summary.is_empty() => summary.to_string(),
            _ => {
                debug!("no summary heading/terminator, using body prefix");
                body.chars()
                    .take(self.summary_fallback_chars)
                    .collect::<String>()
                    .trim()
                    .to_string()
            }
        }
    }

    /// Chapters in source order, dropping spans too short to be real sections.
    pub fn chapters(&self, body: &str) -> Vec<Chapter> {
        let markers: Vec<_> = self.chapter_marker.find_iter(body).collect();

        markers
            .iter()
            .enumerate()
            .filter_map(|(i, marker)| {
                let end = markers.get(i + 1).map_or(body.len(), |next| next.start());
                let content = body[marker.end()..end].trim();
                if content.chars().count() > self.min_chapter_chars {
                    Some(Chapter::new(marker.as_str().trim(), content))
                } else {
                    debug!(
                        "dropping chapter candidate {:?} ({} chars)",
                        marker.as_str(),
                        content.chars().count()
                    );
                    None
                }
            })
            .collect()
    }
}

fn strip_page_suffix(title: &str) -> String {
    TRAILING_PAGE_NUMBER.replace(title.trim(), "").trim().to_string()
}
