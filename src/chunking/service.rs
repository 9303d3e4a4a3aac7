//! Chunker facade tying normalization, segmentation, and assembly together.

use tracing::debug;

use super::assembly::Assembler;
use super::config::ChunkerConfig;
use super::markdown;
use super::segmenter;
use super::tokenizer::TokenCounter;
use super::types::{ChunkingStats, TextSegment};
use crate::types::RagError;

/// Turns raw markdown documents into token-bounded, overlapping
/// [`TextSegment`]s.
///
/// Construction loads the shared tokenizer vocabulary; the instance is cheap
/// to clone and safe to share across tasks since chunking is pure,
/// synchronous CPU work over its input and configuration.
///
/// # Examples
///
/// ```no_run
/// use ragprep::chunking::{Chunker, ChunkerConfig};
///
/// let chunker = Chunker::new(ChunkerConfig::default())?;
/// let segments = chunker.chunk("# Title\n\nBody text goes here with enough words.");
/// for segment in &segments {
///     println!("[{}] {} tokens", segment.index, segment.token_count);
/// }
/// # Ok::<(), ragprep::RagError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Chunker {
    counter: TokenCounter,
    config: ChunkerConfig,
}

impl Chunker {
    /// Build a chunker with the given budgets, loading the `cl100k_base`
    /// tokenizer.
    pub fn new(config: ChunkerConfig) -> Result<Self, RagError> {
        config.validate()?;
        let counter = TokenCounter::cl100k()?;
        Ok(Self { counter, config })
    }

    /// Build a chunker around an existing tokenizer handle.
    pub fn with_tokenizer(counter: TokenCounter, config: ChunkerConfig) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self { counter, config })
    }

    /// The configuration this chunker was built with.
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Access the underlying token counter, e.g. to count query tokens with
    /// the same vocabulary.
    pub fn tokenizer(&self) -> &TokenCounter {
        &self.counter
    }

    /// Chunk a document into ordered segments.
    ///
    /// Never fails: empty or whitespace-only input yields an empty list, and
    /// malformed markdown degrades to best-effort plain text.
    pub fn chunk(&self, document: &str) -> Vec<TextSegment> {
        self.chunk_with_stats(document).0
    }

    /// Chunk a document and report summary statistics alongside.
    pub fn chunk_with_stats(&self, document: &str) -> (Vec<TextSegment>, ChunkingStats) {
        let normalized = markdown::normalize(document);
        if normalized.is_empty() {
            return (Vec::new(), ChunkingStats::default());
        }

        let paragraphs = segmenter::paragraphs(&normalized);
        debug!(paragraphs = paragraphs.len(), "segmented document");

        let segments = Assembler::new(&self.counter, &self.config).assemble(&paragraphs);
        let stats = ChunkingStats::from_segments(&segments);
        debug!(
            segments = stats.segment_count,
            avg_tokens = stats.average_tokens,
            "chunking complete"
        );
        (segments, stats)
    }
}
