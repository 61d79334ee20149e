//! Repair of line-wrap artifacts and removal of page furniture in extracted text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Lines containing any of these are journal furniture, not content.
const METADATA_KEYWORDS: &[&str] = &[
    "ISSN",
    "DOI",
    "doi:",
    "doi.org",
    "http://",
    "https://",
    "www.",
    "Copyright",
    "©",
];

/// Characters a line can end on when a word (not a wrap) ended there.
const TRAILING_PARTICLES: &[char] = &[
    '은', '는', '을', '를', '의', '에', '와', '과', '도', '로', '며', '고', '서', '다',
];

/// Closing punctuation beyond ASCII that also ends a word.
const CLOSING_PUNCTUATION: &[char] = &[
    '」', '』', '》', '〉', '”', '’', '。', '、', '·', '…', '）', '，', '．',
];

static PAGE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-–—\s]*\d{1,3}[-–—\s]*$").expect("page number pattern"));

/// Whether a trimmed line is a bare page number such as `12` or `- 12 -`.
pub fn is_page_number(line: &str) -> bool {
    PAGE_NUMBER.is_match(line.trim())
}

/// Whether a line carries journal/ISSN/DOI/URL metadata.
pub fn is_metadata_line(line: &str) -> bool {
    METADATA_KEYWORDS.iter().any(|k| line.contains(k))
}

/// Whether a line is furniture to drop wherever it appears.
pub fn is_boilerplate_line(line: &str) -> bool {
    is_page_number(line) || is_metadata_line(line)
}

/// Hangul, CJK ideographs and kana: scripts where extraction wraps mid-word.
fn is_script_char(c: char) -> bool {
    matches!(c,
        '\u{AC00}'..='\u{D7A3}'
        | '\u{1100}'..='\u{11FF}'
        | '\u{3130}'..='\u{318F}'
        | '\u{3040}'..='\u{30FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}')
}

fn ends_word(c: char) -> bool {
    c.is_ascii_punctuation() || CLOSING_PUNCTUATION.contains(&c) || TRAILING_PARTICLES.contains(&c)
}

/// Separator to place where a line break used to be.
fn join_separator(prev: char, next: char) -> &'static str {
    if ends_word(prev) {
        " "
    } else if is_script_char(prev) && is_script_char(next) {
        ""
    } else {
        " "
    }
}

/// Normalize raw extracted text into a single line.
///
/// Page-number and metadata lines are dropped, wraps between two script
/// characters are joined, every other break becomes one space, and whitespace
/// runs collapse. Never fails; empty input gives an empty string. Running it
/// on its own output changes nothing.
pub fn normalize(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || is_boilerplate_line(line) {
            continue;
        }

        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");

        if let (Some(prev), Some(next)) = (result.chars().last(), collapsed.chars().next()) {
            result.push_str(join_separator(prev, next));
        }
        result.push_str(&collapsed);
    }

    result
}

/// Normalize an ordered sequence of page texts as one document.
///
/// Pages are joined with a line break so a word wrapped across a page
/// boundary is repaired like any other wrap.
pub fn normalize_pages(pages: &[String]) -> String {
    normalize(&pages.join("\n"))
}
