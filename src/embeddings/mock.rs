//! Deterministic embedding provider for tests and offline runs.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use super::provider::{EmbeddingProvider, ProviderError};

/// Produces stable pseudo-random unit vectors derived from the input text.
///
/// The same text always maps to the same vector, different texts map to
/// different vectors with overwhelming probability, and every vector is
/// unit-normalized so it passes the degenerate-vector check.
#[derive(Clone, Debug, Default)]
pub struct MockEmbeddingProvider;

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self
    }

    fn vector_for(text: &str, dimensions: usize) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish() | 1;

        let mut vector: Vec<f32> = (0..dimensions)
            .map(|_| {
                // xorshift64 over the text hash.
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state as f64 / u64::MAX as f64) as f32 - 0.5
            })
            .collect();

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn create_embeddings(
        &self,
        _model: &str,
        inputs: &[String],
        dimensions: usize,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(inputs
            .iter()
            .map(|text| Self::vector_for(text, dimensions))
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
