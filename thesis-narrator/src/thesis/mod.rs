// Thesis structure: the record narrated from a parsed paper

pub mod segmenter;

use serde::{Deserialize, Serialize};

use crate::text::normalize_pages;
pub use segmenter::Segmenter;

/// One chapter of the paper body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Marker text as it appeared (e.g. "Ⅱ.", "제 2 장")
    pub label: String,
    /// Normalized body text, heading words included
    pub body: String,
}

impl Chapter {
    pub fn new(label: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            body: body.into(),
        }
    }

    /// First `max_chars` characters of the body, with "..." when truncated.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.body.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

/// Parsed paper: title, summary and chapters in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThesisRecord {
    pub title: String,
    pub summary: String,
    pub chapters: Vec<Chapter>,
}

impl ThesisRecord {
    /// Copy of this record with a different title; other fields are untouched.
    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }

    /// Chapter by zero-based index.
    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    /// Script for the whole paper: title, summary, then every chapter body.
    pub fn full_script(&self) -> String {
        let bodies: Vec<&str> = self.chapters.iter().map(|c| c.body.as_str()).collect();
        format!("{}. {}. {}", self.title, self.summary, bodies.join(" "))
            .trim()
            .to_string()
    }

    /// Approximate character count of everything narratable.
    pub fn total_chars(&self) -> usize {
        self.summary.chars().count()
            + self
                .chapters
                .iter()
                .map(|c| c.body.chars().count())
                .sum::<usize>()
    }
}

/// Build a record from ordered page texts.
///
/// The title is located on the raw first page; everything else is segmented
/// from the normalized text of the whole document.
pub fn parse_document(pages: &[String], segmenter: &Segmenter) -> ThesisRecord {
    let first_page = pages.first().map(String::as_str).unwrap_or_default();
    let text = normalize_pages(pages);
    segmenter.segment(first_page, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ThesisRecord {
        ThesisRecord {
            title: "학습몰입 연구".to_string(),
            summary: "요약 내용".to_string(),
            chapters: vec![
                Chapter::new("Ⅰ.", "서론 본문"),
                Chapter::new("Ⅱ.", "방법 본문"),
            ],
        }
    }

    #[test]
    fn test_preview_truncates() {
        let chapter = Chapter::new("Ⅰ.", "가나다라마");
        assert_eq!(chapter.preview(3), "가나다...");
        assert_eq!(chapter.preview(5), "가나다라마");
        assert_eq!(chapter.preview(10), "가나다라마");
    }

    #[test]
    fn test_with_title_keeps_content() {
        let record = sample_record();
        let renamed = record.with_title("새 제목");
        assert_eq!(renamed.title, "새 제목");
        assert_eq!(renamed.summary, record.summary);
        assert_eq!(renamed.chapters, record.chapters);
        assert_eq!(record.title, "학습몰입 연구");
    }

    #[test]
    fn test_chapter_lookup() {
        let record = sample_record();
        assert_eq!(record.chapter(1).map(|c| c.label.as_str()), Some("Ⅱ."));
        assert!(record.chapter(2).is_none());
    }

    #[test]
    fn test_full_script() {
        assert_eq!(
            sample_record().full_script(),
            "학습몰입 연구. 요약 내용. 서론 본문 방법 본문"
        );
    }

    #[test]
    fn test_total_chars() {
        assert_eq!(sample_record().total_chars(), 5 + 5 + 5);
    }

    #[test]
    fn test_record_json_roundtrip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: ThesisRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_parse_document_end_to_end() {
        let body: String = std::iter::repeat_n("연구 내용이다. ", 20).collect();
        let pages = vec![
            "대학생 학습몰입 연구\n요 약\n본 연구는 몰입을 분석한다.\nAbstract\nThis study".to_string(),
            format!("Ⅰ. 서론\n{}\n12", body),
            format!("Ⅱ. 방법\n{}\n참고문헌\n김철수 (2020)", body),
        ];

        let record = parse_document(&pages, &Segmenter::new());
        assert_eq!(record.title, "대학생 학습몰입 연구");
        assert_eq!(record.summary, "본 연구는 몰입을 분석한다.");
        assert_eq!(record.chapters.len(), 2);
        assert!(record.chapters[0].body.starts_with("서론"));
        assert!(record.chapters[1].body.starts_with("방법"));
        assert!(!record.chapters[1].body.contains("참고문헌"));
        assert!(!record.chapters[0].body.contains("12"));
    }

    #[test]
    fn test_parse_document_no_pages() {
        assert_eq!(parse_document(&[], &Segmenter::new()), ThesisRecord::default());
    }
}
