//! Shared error taxonomy and crate-wide constants.
//!
//! Three failure classes cross the public API:
//!
//! - [`RagError::InvalidInput`] — caller handed us something unusable (empty
//!   text, out-of-range options). Never retried.
//! - [`RagError::ProviderFailure`] — the embedding provider misbehaved
//!   (network error, timeout, degenerate vector). Retried locally for single
//!   embeddings; batch calls surface it for the caller to decide.
//! - [`RagError::DimensionMismatch`] — vectors of different lengths were
//!   compared. A programming-contract violation, always fatal.
//!
//! Chunking itself never fails on malformed input; [`RagError::Chunking`]
//! only covers construction-time faults such as tokenizer acquisition.

use thiserror::Error;

/// Dimensionality of every embedding vector produced or accepted by this
/// crate.
pub const EMBEDDING_DIM: usize = 1536;

/// Minimum Euclidean norm below which an embedding is considered degenerate.
pub const MIN_EMBEDDING_NORM: f32 = 0.001;

/// Errors surfaced by the chunking, embedding, and retrieval components.
#[derive(Debug, Error)]
pub enum RagError {
    /// Input rejected before any work was attempted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The embedding provider failed after local retries were exhausted, or
    /// returned a malformed/degenerate response.
    #[error("embedding provider failure: {0}")]
    ProviderFailure(String),

    /// Two vectors of different lengths were compared.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Chunker construction failed (for example the tokenizer vocabulary
    /// could not be loaded).
    #[error("chunking failed: {0}")]
    Chunking(String),
}
