//! Embedding provider capability.
//!
//! The generator never talks to a concrete service directly; it holds an
//! `Arc<dyn EmbeddingProvider>` injected at construction. Production code
//! uses [`OpenAiProvider`](super::openai::OpenAiProvider); tests use
//! [`MockEmbeddingProvider`](super::mock::MockEmbeddingProvider).

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by an embedding provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider asked us to slow down (HTTP 429 or equivalent).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider is temporarily unreachable (HTTP 502/503/504).
    #[error("provider unavailable (status {status}): {message}")]
    Unavailable { status: u16, message: String },

    /// The call exceeded its deadline; any late result is discarded.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Anything else: network faults, auth errors, malformed responses.
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Whether the failure is worth retrying with the same request.
    ///
    /// Besides the structured variants, provider error messages mentioning
    /// timeouts, rate limits, or temporary unavailability are treated as
    /// transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited(_)
            | ProviderError::Unavailable { .. }
            | ProviderError::Timeout(_) => true,
            ProviderError::Other(message) => {
                let message = message.to_lowercase();
                message.contains("timeout")
                    || message.contains("rate limit")
                    || message.contains("temporarily unavailable")
            }
        }
    }
}

/// External capability that turns texts into dense vectors.
///
/// Implementations must return exactly one vector per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `inputs` with the given model at the requested dimensionality.
    async fn create_embeddings(
        &self,
        model: &str,
        inputs: &[String],
        dimensions: usize,
    ) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Short provider name for telemetry.
    fn name(&self) -> &str;
}
