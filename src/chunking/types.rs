//! Output types produced by the chunking pipeline.

use serde::{Deserialize, Serialize};

/// A bounded span of document text prepared for embedding.
///
/// Segments are produced in document order with a dense, zero-based `index`
/// assigned after final filtering. `token_count` is always the tokenizer's
/// count of `content`, so it is directly comparable to provider token
/// limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    /// Trimmed segment text.
    pub content: String,
    /// Token count of `content` under the shared tokenizer.
    pub token_count: usize,
    /// Position of this segment within the document, dense from 0.
    pub index: usize,
}

impl TextSegment {
    pub(crate) fn new(content: String, token_count: usize, index: usize) -> Self {
        Self {
            content,
            token_count,
            index,
        }
    }
}

/// Summary statistics for one chunking run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChunkingStats {
    /// Number of segments that survived final filtering.
    pub segment_count: usize,
    /// Sum of token counts across surviving segments.
    pub total_tokens: usize,
    /// Mean token count per surviving segment (0.0 when empty).
    pub average_tokens: f64,
}

impl ChunkingStats {
    pub(crate) fn from_segments(segments: &[TextSegment]) -> Self {
        let total_tokens: usize = segments.iter().map(|s| s.token_count).sum();
        let average_tokens = if segments.is_empty() {
            0.0
        } else {
            total_tokens as f64 / segments.len() as f64
        };
        Self {
            segment_count: segments.len(),
            total_tokens,
            average_tokens,
        }
    }
}
