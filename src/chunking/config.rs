//! Chunker configuration.

use serde::{Deserialize, Serialize};

use crate::types::RagError;

/// Token budgets governing segment assembly.
///
/// Both fields are immutable for the lifetime of one [`Chunker`]
/// (`crate::chunking::Chunker`) instance; build a new chunker to change
/// them.
///
/// # Examples
///
/// ```
/// use ragprep::chunking::ChunkerConfig;
///
/// let config = ChunkerConfig::default()
///     .with_max_tokens(256)
///     .with_overlap_tokens(25);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Soft per-segment token budget. Segments may exceed it only through
    /// post-assembly overlap, up to a hard ceiling of `max_tokens * 3 / 2`.
    pub max_tokens: usize,
    /// Token budget for the text carried over between adjacent segments.
    /// Zero disables overlap entirely. Values above `max_tokens / 2` are
    /// clamped during assembly (see [`Self::effective_overlap_tokens`]) so a
    /// seeded segment stays under the hard ceiling.
    pub overlap_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            overlap_tokens: 50,
        }
    }
}

impl ChunkerConfig {
    /// Set the per-segment token budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the overlap token budget.
    #[must_use]
    pub fn with_overlap_tokens(mut self, overlap_tokens: usize) -> Self {
        self.overlap_tokens = overlap_tokens;
        self
    }

    /// Hard ceiling on segment size after overlap is folded in.
    pub fn hard_max_tokens(&self) -> usize {
        self.max_tokens * 3 / 2
    }

    /// The overlap budget assembly actually uses: `overlap_tokens` clamped
    /// to half of `max_tokens`, so an overlap seed plus a full paragraph
    /// never pushes a segment past [`Self::hard_max_tokens`].
    pub fn effective_overlap_tokens(&self) -> usize {
        self.overlap_tokens.min(self.max_tokens / 2)
    }

    /// Reject configurations that cannot produce forward progress.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.max_tokens == 0 {
            return Err(RagError::InvalidInput("max_tokens must be positive".into()));
        }
        if self.overlap_tokens >= self.max_tokens {
            return Err(RagError::InvalidInput(format!(
                "overlap_tokens ({}) must be smaller than max_tokens ({})",
                self.overlap_tokens, self.max_tokens
            )));
        }
        Ok(())
    }
}
