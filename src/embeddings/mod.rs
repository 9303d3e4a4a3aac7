//! Embedding generation: provider capability, generator, and vector math.
//!
//! The [`EmbeddingGenerator`] owns preprocessing, retry/backoff, deadlines,
//! batching, and validation; concrete transport lives behind the
//! [`EmbeddingProvider`] trait ([`OpenAiProvider`] in production,
//! [`MockEmbeddingProvider`] in tests).

pub mod generator;
pub mod mock;
pub mod openai;
pub mod provider;

pub use generator::{preprocess, EmbeddingConfig, EmbeddingGenerator};
pub use mock::MockEmbeddingProvider;
pub use openai::OpenAiProvider;
pub use provider::{EmbeddingProvider, ProviderError};

use crate::types::RagError;

/// Cosine similarity between two vectors, in `[-1, 1]`.
///
/// Returns `0.0` when either vector has zero magnitude and
/// [`RagError::DimensionMismatch`] when the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, RagError> {
    if a.len() != b.len() {
        return Err(RagError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}
