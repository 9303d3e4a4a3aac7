//! Paragraph and sentence segmentation with minimum-information filters.
//!
//! Sentence enders cover both Latin punctuation and the Persian question
//! mark / full stop, each of which only terminates a sentence when followed
//! by whitespace (so decimals and abbreviations survive).

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());
static BARE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:https?://|www\.)\S+$").unwrap());
static BARE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Characters that count as markdown syntax rather than information.
const SYNTAX_CHARS: &[char] = &[
    '#', '*', '_', '`', '~', '[', ']', '(', ')', '{', '}', '|', '>', '-', '=', '+', '.', ',', ':',
    ';', '!', '?',
];

/// Sentence-terminating punctuation, Latin and Persian.
const SENTENCE_ENDERS: &[char] = &['.', '!', '?', '؟', '۔'];

/// Split normalized text on blank-line boundaries, dropping paragraphs that
/// carry no useful information.
pub fn paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| keep_paragraph(p))
        .map(str::to_string)
        .collect()
}

fn keep_paragraph(paragraph: &str) -> bool {
    if paragraph.chars().count() < 10 {
        return false;
    }
    if informative_chars(paragraph) < 5 {
        return false;
    }
    if BARE_URL.is_match(paragraph) || BARE_EMAIL.is_match(paragraph) {
        return false;
    }
    true
}

/// Count characters that are neither whitespace nor markdown punctuation.
pub fn informative_chars(text: &str) -> usize {
    text.chars()
        .filter(|c| !c.is_whitespace() && !SYNTAX_CHARS.contains(c))
        .count()
}

/// Fraction of non-whitespace, non-syntax characters in `text`.
pub fn informative_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    informative_chars(text) as f64 / total as f64
}

/// Number of whitespace-delimited words in `text`.
pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}

/// Split `text` into sentences at ender punctuation followed by whitespace.
///
/// The ender stays attached to its sentence. Text without any ender comes
/// back as a single sentence.
pub fn sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if SENTENCE_ENDERS.contains(&c) {
            match chars.peek() {
                Some(next) if next.is_whitespace() => {
                    let sentence = current.trim();
                    if !sentence.is_empty() {
                        out.push(sentence.to_string());
                    }
                    current.clear();
                }
                None => {}
                _ => {}
            }
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let text = "First paragraph with enough text.\n\nSecond paragraph, also long enough.";
        let paras = paragraphs(text);
        assert_eq!(paras.len(), 2);
        assert!(paras[0].starts_with("First"));
    }

    #[test]
    fn short_paragraphs_are_dropped() {
        assert!(paragraphs("Hi.").is_empty());
        assert!(paragraphs("tiny\n\nalso tiny").is_empty());
    }

    #[test]
    fn punctuation_only_paragraphs_are_dropped() {
        assert!(paragraphs("### --- *** ___ >>> |||").is_empty());
    }

    #[test]
    fn bare_urls_and_emails_are_dropped() {
        assert!(paragraphs("https://example.com/some/long/path").is_empty());
        assert!(paragraphs("someone@example.com").is_empty());
        // A URL inside a sentence survives.
        let paras = paragraphs("Details live at https://example.com for the curious.");
        assert_eq!(paras.len(), 1);
    }

    #[test]
    fn sentences_split_on_enders_followed_by_whitespace() {
        let text = "First sentence. Second one! Third? Last without ender";
        let result = sentences(text);
        assert_eq!(result.len(), 4);
        assert_eq!(result[0], "First sentence.");
        assert_eq!(result[3], "Last without ender");
    }

    #[test]
    fn decimal_points_do_not_split() {
        let result = sentences("Pi is 3.14159 and that is all.");
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn persian_question_mark_splits() {
        let result = sentences("این چیست؟ این یک آزمون است.");
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], "این چیست؟");
    }

    #[test]
    fn informative_ratio_bounds() {
        assert_eq!(informative_ratio(""), 0.0);
        assert!(informative_ratio("### ***") < 0.3);
        assert!(informative_ratio("plain words here") > 0.5);
    }

    #[test]
    fn counts_persian_words() {
        assert!(word_count("این یک جمله فارسی است") >= 5);
    }
}
