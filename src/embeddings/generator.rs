//! Embedding generation with preprocessing, retries, timeouts, and batching.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::provider::{EmbeddingProvider, ProviderError};
use crate::types::{RagError, EMBEDDING_DIM, MIN_EMBEDDING_NORM};

/// Minimum length (in characters) of preprocessed text worth embedding.
const MIN_EMBED_CHARS: usize = 10;

/// Tunables for the embedding generator.
///
/// Defaults mirror the provider-safety posture of a low-volume ingestion
/// pipeline: strictly sequential small batches, fixed one-second pauses, and
/// generous per-call deadlines.
#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    /// Provider model identifier.
    pub model: String,
    /// Requested vector dimensionality.
    pub dimensions: usize,
    /// Retry budget for single-text embedding calls.
    pub max_retries: u32,
    /// Fixed delay between retry attempts.
    pub retry_delay: Duration,
    /// Number of texts per provider call in batch mode.
    pub batch_size: usize,
    /// Fixed delay between consecutive batches.
    pub batch_delay: Duration,
    /// Deadline for a single-text call.
    pub single_timeout: Duration,
    /// Deadline for one batch call.
    pub batch_timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: EMBEDDING_DIM,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            batch_size: 5,
            batch_delay: Duration::from_secs(1),
            single_timeout: Duration::from_secs(60),
            batch_timeout: Duration::from_secs(120),
        }
    }
}

impl EmbeddingConfig {
    /// Set the provider model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the retry budget for single-text calls.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the fixed retry delay.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the batch size for batch mode.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the fixed inter-batch delay.
    #[must_use]
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }
}

/// Converts text into validated, fixed-dimension embedding vectors.
///
/// The provider capability is injected at construction; the generator owns
/// preprocessing, retry/backoff for transient failures, per-call deadlines,
/// and validation of every returned vector.
pub struct EmbeddingGenerator {
    provider: Arc<dyn EmbeddingProvider>,
    config: EmbeddingConfig,
}

impl EmbeddingGenerator {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EmbeddingConfig) -> Self {
        Self { provider, config }
    }

    /// The configuration this generator was built with.
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Embed a single text, retrying transient provider failures.
    ///
    /// Fails with [`RagError::InvalidInput`] when the preprocessed text is
    /// shorter than 10 characters, and with [`RagError::ProviderFailure`]
    /// when the retry budget is exhausted or the provider returns a
    /// malformed or degenerate vector.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let cleaned = preprocess(text);
        if cleaned.chars().count() < MIN_EMBED_CHARS {
            return Err(RagError::InvalidInput(
                "text too short to embed after preprocessing".into(),
            ));
        }

        let inputs = [cleaned];
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay).await;
                warn!(
                    attempt,
                    provider = self.provider.name(),
                    "retrying embedding call"
                );
            }

            match self.call(&inputs, self.config.single_timeout).await {
                Ok(mut vectors) => {
                    let vector = vectors.pop().ok_or_else(|| {
                        RagError::ProviderFailure("provider returned no vectors".into())
                    })?;
                    self.validate_vector(&vector)?;
                    return Ok(vector);
                }
                Err(err) if err.is_retryable() => {
                    last_error = Some(err);
                }
                Err(err) => return Err(RagError::ProviderFailure(err.to_string())),
            }
        }

        let last = last_error
            .map(|err| err.to_string())
            .unwrap_or_else(|| "unknown error".into());
        Err(RagError::ProviderFailure(format!(
            "retries exhausted after {} attempts: {last}",
            self.config.max_retries + 1
        )))
    }

    /// Embed many texts in fixed-size sequential batches.
    ///
    /// Inputs are preprocessed and filtered like [`embed`](Self::embed);
    /// output order matches the surviving inputs. A failure in any batch
    /// aborts the whole call with no partial results, and there is no
    /// within-batch retry.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        self.embed_batch_with_progress(texts, |_, _| {}).await
    }

    /// [`embed_batch`](Self::embed_batch) with a progress callback invoked
    /// as `(processed, total)` after each batch; counts are monotone.
    pub async fn embed_batch_with_progress<F>(
        &self,
        texts: &[String],
        mut on_progress: F,
    ) -> Result<Vec<Vec<f32>>, RagError>
    where
        F: FnMut(usize, usize),
    {
        let survivors: Vec<String> = texts
            .iter()
            .map(|t| preprocess(t))
            .filter(|t| t.chars().count() >= MIN_EMBED_CHARS)
            .collect();

        if survivors.is_empty() {
            return Err(RagError::InvalidInput(
                "no inputs remained after preprocessing".into(),
            ));
        }

        let total = survivors.len();
        let mut vectors = Vec::with_capacity(total);
        let mut processed = 0usize;

        for (batch_index, batch) in survivors.chunks(self.config.batch_size).enumerate() {
            if batch_index > 0 {
                tokio::time::sleep(self.config.batch_delay).await;
            }

            debug!(
                batch = batch_index,
                size = batch.len(),
                provider = self.provider.name(),
                "embedding batch"
            );

            let batch_vectors = self
                .call(batch, self.config.batch_timeout)
                .await
                .map_err(|err| RagError::ProviderFailure(err.to_string()))?;

            if batch_vectors.len() != batch.len() {
                return Err(RagError::ProviderFailure(format!(
                    "provider returned {} vectors for a batch of {}",
                    batch_vectors.len(),
                    batch.len()
                )));
            }

            for vector in &batch_vectors {
                self.validate_vector(vector)?;
            }

            processed += batch.len();
            vectors.extend(batch_vectors);
            on_progress(processed, total);
        }

        Ok(vectors)
    }

    async fn call(
        &self,
        inputs: &[String],
        deadline: Duration,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        let fut = self
            .provider
            .create_embeddings(&self.config.model, inputs, self.config.dimensions);
        match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            // The abandoned call's result, if it ever arrives, is dropped
            // with the future.
            Err(_) => Err(ProviderError::Timeout(deadline)),
        }
    }

    fn validate_vector(&self, vector: &[f32]) -> Result<(), RagError> {
        if vector.len() != self.config.dimensions {
            return Err(RagError::ProviderFailure(format!(
                "expected {}-dimension vector, got {}",
                self.config.dimensions,
                vector.len()
            )));
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm < MIN_EMBEDDING_NORM {
            warn!(norm, "rejecting near-zero embedding");
            return Err(RagError::ProviderFailure(format!(
                "degenerate embedding with norm {norm}"
            )));
        }
        Ok(())
    }
}

/// Normalize text before it reaches the provider.
///
/// Keeps printable ASCII, the Arabic Unicode block used by Persian, and the
/// zero-width joiners Persian orthography relies on; everything else becomes
/// a single space. Whitespace runs collapse and the result is trimmed.
pub fn preprocess(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| {
            let keep = (c.is_ascii() && !c.is_ascii_control())
                || ('\u{0600}'..='\u{06FF}').contains(&c)
                || c == '\u{200C}'
                || c == '\u{200D}';
            if keep {
                c
            } else {
                ' '
            }
        })
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::mock::MockEmbeddingProvider;

    fn generator() -> EmbeddingGenerator {
        EmbeddingGenerator::new(
            Arc::new(MockEmbeddingProvider::new()),
            EmbeddingConfig::default(),
        )
    }

    #[test]
    fn preprocess_keeps_english_and_persian() {
        let cleaned = preprocess("Hello دنیای قشنگ\u{200C}ها!");
        assert!(cleaned.contains("Hello"));
        assert!(cleaned.contains("دنیای"));
        assert!(cleaned.contains('\u{200C}'));
    }

    #[test]
    fn preprocess_replaces_other_scripts_with_spaces() {
        let cleaned = preprocess("abc\u{4E2D}\u{6587}def");
        assert_eq!(cleaned, "abc def");
    }

    #[test]
    fn preprocess_strips_controls_and_collapses_whitespace() {
        let cleaned = preprocess("a\u{0007}b   c\t\td\n\ne");
        assert_eq!(cleaned, "a b c d e");
    }

    #[tokio::test]
    async fn embed_rejects_short_text() {
        let generator = generator();
        let err = generator.embed("hi").await.unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn embed_returns_validated_vector() {
        let generator = generator();
        let vector = generator
            .embed("a perfectly reasonable sentence to embed")
            .await
            .unwrap();
        assert_eq!(vector.len(), EMBEDDING_DIM);
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!(norm >= MIN_EMBEDDING_NORM);
    }

    #[tokio::test]
    async fn batch_filters_short_inputs_before_calling() {
        let generator = generator();
        let vectors = generator
            .embed_batch(&[
                "valid long enough text here".to_string(),
                "x".to_string(),
            ])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 1);
    }

    #[tokio::test]
    async fn batch_with_no_survivors_is_invalid_input() {
        let generator = generator();
        let err = generator
            .embed_batch(&["x".to_string(), "y".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn progress_counts_are_monotone_and_complete() {
        let provider = Arc::new(MockEmbeddingProvider::new());
        let config = EmbeddingConfig::default()
            .with_batch_size(2)
            .with_batch_delay(Duration::from_millis(0));
        let generator = EmbeddingGenerator::new(provider, config);

        let texts: Vec<String> = (0..5)
            .map(|i| format!("input text number {i} padded for length"))
            .collect();

        let mut reports: Vec<(usize, usize)> = Vec::new();
        let vectors = generator
            .embed_batch_with_progress(&texts, |processed, total| {
                reports.push((processed, total));
            })
            .await
            .unwrap();

        assert_eq!(vectors.len(), 5);
        assert_eq!(reports.last(), Some(&(5, 5)));
        assert!(reports.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(reports.iter().all(|(_, total)| *total == 5));
    }

    #[tokio::test]
    async fn batch_output_order_matches_input_order() {
        let generator = generator();
        let texts = vec![
            "first input sentence with enough length".to_string(),
            "second input sentence with enough length".to_string(),
        ];
        let batch = generator.embed_batch(&texts).await.unwrap();
        let first = generator.embed(&texts[0]).await.unwrap();
        let second = generator.embed(&texts[1]).await.unwrap();
        assert_eq!(batch[0], first);
        assert_eq!(batch[1], second);
    }
}
