//! Model-consistent token counting.
//!
//! Token counts produced here must be comparable to the embedding provider's
//! limits, so the counter wraps the same BPE family the provider uses
//! (`cl100k_base`). The vocabulary is loaded once per [`TokenCounter`] and
//! shared behind an `Arc`; dropping the counter releases it.

use std::sync::Arc;

use tiktoken_rs::CoreBPE;

use crate::types::RagError;

/// Token counter backed by a tiktoken BPE vocabulary.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter").finish_non_exhaustive()
    }
}

impl TokenCounter {
    /// Load the `cl100k_base` vocabulary used by OpenAI embedding models.
    pub fn cl100k() -> Result<Self, RagError> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|err| RagError::Chunking(format!("failed to load tokenizer: {err}")))?;
        Ok(Self { bpe: Arc::new(bpe) })
    }

    /// Number of tokens in `text`.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    /// Encode `text` into its token sequence.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_with_special_tokens(text)
    }

    /// Decode a token sequence back to text.
    ///
    /// Returns `None` when the slice does not decode to valid UTF-8, which
    /// can happen when a tail slice starts mid-character.
    pub fn decode(&self, tokens: &[u32]) -> Option<String> {
        self.bpe.decode(tokens.to_vec()).ok()
    }

    /// Decode the last `budget` tokens of `text`, trimming leading tokens
    /// until the result is valid UTF-8.
    pub fn decode_tail(&self, text: &str, budget: usize) -> Option<String> {
        if budget == 0 {
            return None;
        }
        let tokens = self.encode(text);
        if tokens.is_empty() {
            return None;
        }
        let start = tokens.len().saturating_sub(budget);
        for offset in start..tokens.len() {
            if let Some(decoded) = self.decode(&tokens[offset..]) {
                let decoded = decoded.trim().to_string();
                if decoded.is_empty() {
                    return None;
                }
                return Some(decoded);
            }
        }
        None
    }
}
