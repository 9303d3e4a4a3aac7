//! Greedy token-bounded segment assembly with sentence-level overlap.
//!
//! Paragraphs are packed into a running segment until the next one would
//! exceed the token budget; the segment is then closed and the next one is
//! seeded with whole sentences taken from the tail of the closed segment.
//! A paragraph that alone exceeds the budget falls back to the same packing
//! at sentence granularity, and a single oversized sentence is hard-split on
//! token boundaries. Everything is iterative; no recursion is needed.

use tracing::debug;

use super::config::ChunkerConfig;
use super::segmenter;
use super::tokenizer::TokenCounter;
use super::types::TextSegment;

const MIN_SEGMENT_CHARS: usize = 20;
const MIN_SEGMENT_WORDS: usize = 5;
const MIN_SEGMENT_TOKENS: usize = 5;
const MIN_INFORMATIVE_RATIO: f64 = 0.3;

pub(crate) struct Assembler<'a> {
    counter: &'a TokenCounter,
    config: &'a ChunkerConfig,
}

impl<'a> Assembler<'a> {
    pub(crate) fn new(counter: &'a TokenCounter, config: &'a ChunkerConfig) -> Self {
        Self { counter, config }
    }

    /// Pack filtered paragraphs into final, filtered, re-indexed segments.
    pub(crate) fn assemble(&self, paragraphs: &[String]) -> Vec<TextSegment> {
        let mut closed: Vec<String> = Vec::new();
        let mut parts: Vec<String> = Vec::new();
        let mut tokens = 0usize;
        // False while `parts` holds nothing beyond an overlap seed; seeds
        // alone never become segments.
        let mut has_fresh = false;

        for paragraph in paragraphs {
            let paragraph_tokens = self.counter.count(paragraph);

            if paragraph_tokens > self.config.max_tokens {
                if has_fresh {
                    closed.push(parts.join("\n\n"));
                }
                parts.clear();
                tokens = 0;
                has_fresh = false;

                self.split_oversized_paragraph(paragraph, &mut closed);
                self.seed_overlap(closed.last(), &mut parts, &mut tokens);
                continue;
            }

            if has_fresh && tokens + paragraph_tokens > self.config.max_tokens {
                closed.push(parts.join("\n\n"));
                parts.clear();
                tokens = 0;
                self.seed_overlap(closed.last(), &mut parts, &mut tokens);
            }

            tokens += paragraph_tokens;
            parts.push(paragraph.clone());
            has_fresh = true;
        }

        if has_fresh {
            closed.push(parts.join("\n\n"));
        }

        self.finalize(closed)
    }

    /// Sentence-granularity packing for a paragraph over the token budget.
    fn split_oversized_paragraph(&self, paragraph: &str, closed: &mut Vec<String>) {
        let sentences = segmenter::sentences(paragraph);
        let mut parts: Vec<String> = Vec::new();
        let mut tokens = 0usize;
        let mut has_fresh = false;

        for sentence in sentences {
            let sentence_tokens = self.counter.count(&sentence);

            if sentence_tokens > self.config.max_tokens {
                if has_fresh {
                    closed.push(parts.join(" "));
                }
                parts.clear();
                tokens = 0;
                has_fresh = false;

                self.split_on_token_boundaries(&sentence, closed);
                self.seed_overlap(closed.last(), &mut parts, &mut tokens);
                continue;
            }

            if has_fresh && tokens + sentence_tokens > self.config.max_tokens {
                closed.push(parts.join(" "));
                parts.clear();
                tokens = 0;
                self.seed_overlap(closed.last(), &mut parts, &mut tokens);
            }

            tokens += sentence_tokens;
            parts.push(sentence);
            has_fresh = true;
        }

        if has_fresh {
            closed.push(parts.join(" "));
        }
    }

    /// Last resort for a single sentence that exceeds the budget on its own.
    ///
    /// Slice boundaries are adjusted to the nearest point where the tokens
    /// decode to valid UTF-8, so multi-byte characters straddling a boundary
    /// move whole into one slice instead of being dropped.
    fn split_on_token_boundaries(&self, sentence: &str, closed: &mut Vec<String>) {
        let encoded = self.counter.encode(sentence);
        let budget = self.config.max_tokens;
        let mut start = 0usize;

        while start < encoded.len() {
            let target = (start + budget).min(encoded.len());
            let mut chosen: Option<(usize, String)> = None;

            // Largest end within budget where the slice decodes cleanly.
            for end in (start + 1..=target).rev() {
                if let Some(text) = self.counter.decode(&encoded[start..end]) {
                    chosen = Some((end, text));
                    break;
                }
            }
            // A single character's byte tokens can outnumber the remaining
            // budget; grow past it rather than lose the character.
            if chosen.is_none() {
                for end in target + 1..=encoded.len() {
                    if let Some(text) = self.counter.decode(&encoded[start..end]) {
                        chosen = Some((end, text));
                        break;
                    }
                }
            }

            let Some((end, text)) = chosen else { break };
            let text = text.trim();
            if !text.is_empty() {
                closed.push(text.to_string());
            }
            start = end;
        }
    }

    fn seed_overlap(&self, previous: Option<&String>, parts: &mut Vec<String>, tokens: &mut usize) {
        let Some(previous) = previous else { return };
        if let Some(overlap) = self.build_overlap(previous) {
            *tokens = self.counter.count(&overlap);
            parts.push(overlap);
        }
    }

    /// Build overlap text from whole sentences at the tail of `previous`,
    /// falling back to a raw token tail when not even the last sentence fits.
    fn build_overlap(&self, previous: &str) -> Option<String> {
        let budget = self.config.effective_overlap_tokens();
        if budget == 0 {
            return None;
        }

        let sentences = segmenter::sentences(previous);
        let mut taken: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for sentence in sentences.iter().rev() {
            let count = self.counter.count(sentence);
            if total + count > budget {
                break;
            }
            total += count;
            taken.push(sentence);
        }

        if taken.is_empty() {
            return self.counter.decode_tail(previous, budget);
        }

        taken.reverse();
        Some(taken.join(" "))
    }

    /// Drop low-information segments and assign dense indices.
    fn finalize(&self, closed: Vec<String>) -> Vec<TextSegment> {
        let hard_max = self.config.hard_max_tokens();
        let mut segments = Vec::new();
        let mut dropped = 0usize;

        for text in closed {
            let text = text.trim().to_string();
            let token_count = self.counter.count(&text);

            let keep = text.chars().count() >= MIN_SEGMENT_CHARS
                && segmenter::word_count(&text) >= MIN_SEGMENT_WORDS
                && token_count >= MIN_SEGMENT_TOKENS
                && token_count <= hard_max
                && segmenter::informative_ratio(&text) >= MIN_INFORMATIVE_RATIO;

            if keep {
                let index = segments.len();
                segments.push(TextSegment::new(text, token_count, index));
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            debug!(dropped, kept = segments.len(), "final segment filter");
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler_fixture(
        max_tokens: usize,
        overlap_tokens: usize,
    ) -> (TokenCounter, ChunkerConfig) {
        let counter = TokenCounter::cl100k().unwrap();
        let config = ChunkerConfig::default()
            .with_max_tokens(max_tokens)
            .with_overlap_tokens(overlap_tokens);
        (counter, config)
    }

    fn sentence_bank(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| {
                format!(
                    "Paragraph number {i} talks about a distinct topic with enough words \
                     to carry real information for the packing logic."
                )
            })
            .collect()
    }

    #[test]
    fn single_small_paragraph_is_one_segment() {
        let (counter, config) = assembler_fixture(512, 50);
        let assembler = Assembler::new(&counter, &config);
        let paragraphs = sentence_bank(1);
        let segments = assembler.assemble(&paragraphs);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].index, 0);
        assert_eq!(segments[0].token_count, counter.count(&segments[0].content));
    }

    #[test]
    fn packing_respects_token_budget() {
        let (counter, config) = assembler_fixture(60, 10);
        let assembler = Assembler::new(&counter, &config);
        let segments = assembler.assemble(&sentence_bank(10));
        assert!(segments.len() > 1);
        for segment in &segments {
            assert!(
                segment.token_count <= config.hard_max_tokens(),
                "segment {} has {} tokens",
                segment.index,
                segment.token_count
            );
        }
    }

    #[test]
    fn indices_are_dense_and_ordered() {
        let (counter, config) = assembler_fixture(60, 10);
        let assembler = Assembler::new(&counter, &config);
        let segments = assembler.assemble(&sentence_bank(8));
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index, i);
        }
    }

    #[test]
    fn oversized_paragraph_splits_at_sentences() {
        let (counter, config) = assembler_fixture(64, 10);
        let assembler = Assembler::new(&counter, &config);
        // One giant paragraph made of many sentences.
        let paragraph = sentence_bank(12).join(" ");
        assert!(counter.count(&paragraph) > 64);

        let segments = assembler.assemble(&[paragraph]);
        assert!(segments.len() >= 2);
        for segment in &segments {
            assert!(segment.token_count <= config.hard_max_tokens());
        }
    }

    #[test]
    fn consecutive_segments_share_a_sentence() {
        let (counter, config) = assembler_fixture(64, 30);
        let assembler = Assembler::new(&counter, &config);
        let paragraph = sentence_bank(12).join(" ");
        let segments = assembler.assemble(&[paragraph]);
        assert!(segments.len() >= 2);

        for pair in segments.windows(2) {
            let prev_sentences = segmenter::sentences(&pair[0].content);
            let shared = prev_sentences
                .iter()
                .any(|s| pair[1].content.starts_with(s.as_str()));
            assert!(
                shared,
                "segments {} and {} share no sentence",
                pair[0].index, pair[1].index
            );
        }
    }

    #[test]
    fn near_maximal_overlap_stays_under_the_hard_ceiling() {
        // overlap_tokens just below max_tokens is legal; the clamped overlap
        // budget must keep every seeded segment under the hard ceiling.
        let (counter, config) = assembler_fixture(40, 39);
        let assembler = Assembler::new(&counter, &config);
        let paragraphs = sentence_bank(10);
        let segments = assembler.assemble(&paragraphs);
        assert!(segments.len() >= 2);

        for segment in &segments {
            assert!(
                segment.token_count <= config.hard_max_tokens(),
                "segment {} has {} tokens",
                segment.index,
                segment.token_count
            );
        }
        // Every paragraph survives into some segment.
        for i in 0..10 {
            let marker = format!("Paragraph number {i} ");
            assert!(
                segments.iter().any(|s| s.content.contains(&marker)),
                "paragraph {i} was dropped"
            );
        }
    }

    #[test]
    fn zero_overlap_carries_nothing() {
        let (counter, config) = assembler_fixture(64, 0);
        let assembler = Assembler::new(&counter, &config);
        let paragraph = sentence_bank(10).join(" ");
        let segments = assembler.assemble(&[paragraph]);
        assert!(segments.len() >= 2);

        for pair in segments.windows(2) {
            let prev_sentences = segmenter::sentences(&pair[0].content);
            let shared = prev_sentences
                .iter()
                .any(|s| pair[1].content.starts_with(s.as_str()));
            assert!(!shared, "overlap text appeared with overlap_tokens = 0");
        }
    }

    fn multiscript_sentence(repeats: usize) -> String {
        (0..repeats)
            .map(|i| format!("word{i} 汉字文本 देवनागरी 😀🚀"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn hard_split_preserves_multibyte_characters() {
        let (counter, config) = assembler_fixture(64, 0);
        let assembler = Assembler::new(&counter, &config);
        let sentence = multiscript_sentence(120);
        assert!(counter.count(&sentence) > 64 * 4);

        let mut closed = Vec::new();
        assembler.split_on_token_boundaries(&sentence, &mut closed);

        for piece in &closed {
            assert!(counter.count(piece) <= config.hard_max_tokens());
        }

        // Slice trimming only removes whitespace, so modulo whitespace the
        // pieces must reproduce the input exactly.
        let rejoined: String = closed.concat().split_whitespace().collect();
        let original: String = sentence.split_whitespace().collect();
        assert_eq!(rejoined, original, "hard split lost characters");
    }

    #[test]
    fn oversized_multiscript_sentence_keeps_nearly_all_tokens() {
        let (counter, config) = assembler_fixture(64, 0);
        let assembler = Assembler::new(&counter, &config);
        let paragraph = multiscript_sentence(150);
        let total = counter.count(&paragraph);

        let segments = assembler.assemble(&[paragraph]);
        assert!(segments.len() >= 2);

        let kept: usize = segments.iter().map(|s| s.token_count).sum();
        assert!(
            kept * 10 >= total * 9,
            "kept only {kept} of {total} tokens"
        );
    }

    #[test]
    fn assembly_is_deterministic() {
        let (counter, config) = assembler_fixture(60, 10);
        let assembler = Assembler::new(&counter, &config);
        let paragraphs = sentence_bank(10);
        let first = assembler.assemble(&paragraphs);
        let second = assembler.assemble(&paragraphs);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_yields_no_segments() {
        let (counter, config) = assembler_fixture(512, 50);
        let assembler = Assembler::new(&counter, &config);
        assert!(assembler.assemble(&[]).is_empty());
    }
}
