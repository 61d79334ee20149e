//! Sanitizing text for spoken delivery inside an SSML document.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default pause inserted after the first sentence of a unit.
pub const DEFAULT_PAUSE_MS: u32 = 700;

/// `인공지능(Artificial Intelligence)` style glosses.
static RE_LATIN_GLOSS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\([A-Za-z][A-Za-z0-9\s.,'&/\[\]\-]*\)").expect("gloss pattern")
});

/// `(Kim, 2020)`, `(2019a)`, `(홍길동, 2021: 35)` style citations.
static RE_YEAR_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\([^()]*\b(?:1[5-9]|20)\d{2}[a-z]?\b[^()]*\)").expect("year citation pattern")
});

/// `[3]`, `[1, 4]`, `[2-5]` style citations.
static RE_NUMERIC_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\[\s*\d+(?:\s*[,\-–]\s*\d+)*\s*\]").expect("numeric citation pattern")
});

static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([,.;:!?])").expect("punctuation spacing pattern"));

/// End of the first sentence: terminal punctuation followed by space or end of text.
static RE_SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?。！？](?:\s|$)").expect("sentence end pattern"));

/// Apply `re` until nothing matches, so a removal that exposes an enclosing
/// match is also removed.
fn strip_all(re: &Regex, text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = re.replace_all(&current, "").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Remove parenthetical Latin-alphabet glosses.
pub fn strip_latin_glosses(text: &str) -> String {
    strip_all(&RE_LATIN_GLOSS, text)
}

/// Remove parenthetical citations that carry a four-digit year.
pub fn strip_year_citations(text: &str) -> String {
    strip_all(&RE_YEAR_CITATION, text)
}

/// Remove bracketed numeric citation lists.
pub fn strip_numeric_citations(text: &str) -> String {
    strip_all(&RE_NUMERIC_CITATION, text)
}

/// Escape the characters that are significant inside SSML element content.
pub fn escape_markup(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Collapse whitespace runs and close gaps left in front of punctuation.
fn tidy_spacing(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    RE_SPACE_BEFORE_PUNCT
        .replace_all(&collapsed, "$1")
        .into_owned()
}

/// Prepares one narration unit for synthesis.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    /// Pause after the first sentence, in milliseconds (None = no pause)
    pause_ms: Option<u32>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self {
            pause_ms: Some(DEFAULT_PAUSE_MS),
        }
    }
}

impl Sanitizer {
    /// Create a sanitizer with the default pause.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pause length; zero disables the pause.
    pub fn with_pause_ms(mut self, pause_ms: u32) -> Self {
        self.pause_ms = (pause_ms > 0).then_some(pause_ms);
        self
    }

    /// Strip citation noise and escape markup characters.
    ///
    /// The removal passes are independent: applying them in any order gives
    /// the same result.
    pub fn clean(&self, text: &str) -> String {
        let text = strip_numeric_citations(text);
        let text = strip_year_citations(&text);
        let text = strip_latin_glosses(&text);
        escape_markup(&tidy_spacing(&text))
    }

    /// Clean a unit and, when `section_break` is set, mark the spoken section
    /// break after its first sentence.
    pub fn sanitize(&self, text: &str, section_break: bool) -> String {
        let cleaned = self.clean(text);
        match self.pause_ms {
            Some(ms) if section_break => insert_pause(&cleaned, ms),
            _ => cleaned,
        }
    }
}

/// Insert one `<break>` right after the first sentence-like span.
///
/// Text without terminal punctuation is returned unchanged.
fn insert_pause(text: &str, pause_ms: u32) -> String {
    let Some(m) = RE_SENTENCE_END.find(text) else {
        return text.to_string();
    };

    // The match may include one trailing whitespace char; the tag goes before it.
    let punct_end = m.start() + m.as_str().chars().next().map_or(0, char::len_utf8);
    format!(
        "{}<break time=\"{}ms\"/>{}",
        &text[..punct_end],
        pause_ms,
        &text[punct_end..]
    )
}
