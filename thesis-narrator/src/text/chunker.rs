//! Boundary-aware chunk planning for synthesis requests.
//!
//! A plan is a lossless partition: concatenating the segment contents in
//! ordinal order gives back the input exactly. Each segment holds at most
//! `budget` characters. Split points prefer the end of a sentence, then any
//! whitespace, and fall back to a hard cut only when the window has neither.
//! Markup tags and character entities are never cut.

use super::TextSegment;

/// Default chunk budget in characters.
pub const DEFAULT_CHUNK_BUDGET: usize = 1500;

/// Characters that end a sentence when followed by whitespace.
const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '。', '！', '？'];

/// Longest entity the sanitizer emits (`&amp;`), used to avoid cutting one.
const MAX_ENTITY_LEN: usize = 5;

/// Split text into segments of at most `budget` characters.
///
/// A zero budget is treated as one.
pub fn plan_chunks(text: &str, budget: usize) -> Vec<TextSegment> {
    let budget = budget.max(1);
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let in_tag = tag_mask(&chars);
    let byte_at = |i: usize| chars.get(i).map_or(text.len(), |(b, _)| *b);

    let mut segments = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = if chars.len() - start <= budget {
            chars.len()
        } else {
            split_point(&chars, &in_tag, start, start + budget)
        };

        debug_assert!(end > start && end - start <= budget);
        segments.push(TextSegment::new(
            segments.len(),
            &text[byte_at(start)..byte_at(end)],
        ));
        start = end;
    }

    segments
}

/// Mark every character that lies inside a `<...>` tag.
fn tag_mask(chars: &[(usize, char)]) -> Vec<bool> {
    let mut mask = Vec::with_capacity(chars.len());
    let mut inside = false;
    for (_, c) in chars {
        if *c == '<' {
            inside = true;
        }
        mask.push(inside);
        if *c == '>' {
            inside = false;
        }
    }
    mask
}

/// Choose where the chunk starting at `start` ends, given the hard limit `limit`.
///
/// The returned index is exclusive and lies in `(start, limit]`.
fn split_point(chars: &[(usize, char)], in_tag: &[bool], start: usize, limit: usize) -> usize {
    let is_break = |i: usize| chars[i - 1].1.is_whitespace() && !in_tag[i - 1];
    let half = start + (limit - start) / 2;

    // A sentence end in the back half of the window wins.
    let sentence = (half.max(start + 2)..=limit).rev().find(|&i| {
        is_break(i) && SENTENCE_TERMINATORS.contains(&chars[i - 2].1) && !in_tag[i - 2]
    });
    if let Some(i) = sentence {
        return i;
    }

    // Otherwise the last whitespace in the window.
    if let Some(i) = (start + 1..=limit).rev().find(|&i| is_break(i)) {
        return i;
    }

    hard_cut(chars, in_tag, start, limit)
}

/// Cut at the limit, backing off to the start of a tag or entity that would
/// otherwise be split.
fn hard_cut(chars: &[(usize, char)], in_tag: &[bool], start: usize, limit: usize) -> usize {
    if in_tag[limit - 1] && chars[limit - 1].1 != '>' {
        if let Some(open) = (start + 1..limit).rev().find(|&i| chars[i].1 == '<') {
            return open;
        }
    }

    let window_start = limit.saturating_sub(MAX_ENTITY_LEN).max(start + 1);
    if let Some(amp) = (window_start..limit).rev().find(|&i| chars[i].1 == '&') {
        let closed = chars[amp..limit].iter().any(|(_, c)| *c == ';');
        if !closed {
            return amp;
        }
    }

    limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn joined(segments: &[TextSegment]) -> String {
        segments.iter().map(|s| s.content.as_str()).collect()
    }

    #[test]
    fn test_short_text_is_one_segment() {
        let segments = plan_chunks("짧은 문장이다.", 100);
        assert_eq!(segments, vec![TextSegment::new(0, "짧은 문장이다.")]);
    }

    #[test]
    fn test_empty_text() {
        assert!(plan_chunks("", 100).is_empty());
    }

    #[test]
    fn test_prefers_sentence_boundary() {
        let text = "First sentence here. Second one is longer than that.";
        let segments = plan_chunks(text, 30);
        assert_eq!(segments[0].content, "First sentence here. ");
        assert_eq!(joined(&segments), text);
    }

    #[test]
    fn test_falls_back_to_whitespace() {
        let text = "one two three four five six";
        let segments = plan_chunks(text, 10);
        assert_eq!(joined(&segments), text);
        assert_eq!(segments[0].content, "one two ");
        for segment in &segments {
            assert!(segment.char_len() <= 10);
            assert!(!segment.content.starts_with(' '));
        }
    }

    #[test]
    fn test_hard_cut_without_whitespace() {
        let text = "abcdefghij";
        let parts: Vec<String> = plan_chunks(text, 3).into_iter().map(|s| s.content).collect();
        assert_eq!(parts, vec!["abc", "def", "ghi", "j"]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "가나다라마바사";
        let segments = plan_chunks(text, 3);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].content, "가나다");
        assert_eq!(joined(&segments), text);
    }

    #[test]
    fn test_never_splits_break_tag() {
        let text = "서론.<break time=\"700ms\"/> 본문이 이어진다";
        // The tag itself is 21 characters; smaller budgets cannot hold it.
        for budget in 21..=text.chars().count() {
            let segments = plan_chunks(text, budget);
            assert_eq!(joined(&segments), text);
            for segment in &segments {
                let opens = segment.content.matches('<').count();
                let closes = segment.content.matches('>').count();
                assert_eq!(opens, closes, "tag split at budget {}: {:?}", budget, segment);
            }
        }
    }

    #[test]
    fn test_never_splits_entity() {
        let text = "abcd&amp;efgh";
        let segments = plan_chunks(text, 6);
        assert_eq!(segments[0].content, "abcd");
        assert_eq!(segments[1].content, "&amp;e");
        assert_eq!(joined(&segments), text);
    }

    #[test]
    fn test_ordinals_are_sequential() {
        let text = "a b c d e f g h i j k l m n o p";
        let segments = plan_chunks(text, 4);
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.ordinal, i);
        }
    }

    #[test]
    fn test_plan_is_deterministic() {
        let text = "반복 실행. 같은 결과가 나와야 한다. 경계도 같아야 한다.";
        assert_eq!(plan_chunks(text, 12), plan_chunks(text, 12));
    }

    proptest! {
        #[test]
        fn prop_partition_is_lossless_and_bounded(
            text in "[a-z가-힣 .<>/&;]{0,300}",
            budget in 1usize..60,
        ) {
            let segments = plan_chunks(&text, budget);
            prop_assert_eq!(joined(&segments), text);
            for segment in &segments {
                prop_assert!(segment.char_len() <= budget);
                prop_assert!(!segment.content.is_empty());
            }
        }
    }
}
