//! # ragprep
//!
//! Document preparation for retrieval-augmented generation over
//! Persian/English markdown: token-bounded chunking with semantic overlap,
//! embedding generation with batching and retries, and similarity ranking
//! with optional diversity and recency adjustments.
//!
//! ```text
//! raw markdown ──► chunking::Chunker ──► Vec<TextSegment>
//!                                             │
//!                                             ▼
//!                      embeddings::EmbeddingGenerator ──► Vec<Vec<f32>>
//!                                             │
//!                              (persisted by the caller's store)
//!
//! query text ──► EmbeddingGenerator ──► query vector
//!                                             │
//!                                             ▼
//!            retrieval::rank(query, candidates, options) ──► RankedResult[]
//! ```
//!
//! Storage, HTTP surfaces, prompt construction, and answer generation are
//! the caller's concern; this crate only prepares and selects context.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ragprep::chunking::{Chunker, ChunkerConfig};
//! use ragprep::embeddings::{EmbeddingConfig, EmbeddingGenerator, OpenAiProvider};
//! use ragprep::retrieval::{rank, Candidate, RetrievalOptions};
//!
//! # async fn run() -> Result<(), ragprep::RagError> {
//! let chunker = Chunker::new(ChunkerConfig::default())?;
//! let segments = chunker.chunk("# Notes\n\nA paragraph worth keeping around.");
//!
//! let provider = Arc::new(OpenAiProvider::from_env().expect("credentials"));
//! let generator = EmbeddingGenerator::new(provider, EmbeddingConfig::default());
//! let texts: Vec<String> = segments.iter().map(|s| s.content.clone()).collect();
//! let vectors = generator.embed_batch(&texts).await?;
//!
//! let query = generator.embed("what do the notes say?").await?;
//! let candidates: Vec<Candidate> = segments
//!     .iter()
//!     .zip(vectors)
//!     .map(|(segment, vector)| Candidate::new(segment.index.to_string(), vector))
//!     .collect();
//! let ranked = rank(&query, &candidates, &RetrievalOptions::default())?;
//! # Ok(())
//! # }
//! ```

pub mod chunking;
pub mod embeddings;
pub mod retrieval;
pub mod types;

pub use chunking::{Chunker, ChunkerConfig, ChunkingStats, TextSegment};
pub use embeddings::{
    cosine_similarity, EmbeddingConfig, EmbeddingGenerator, EmbeddingProvider, OpenAiProvider,
};
pub use retrieval::{rank, Candidate, RankedResult, RetrievalOptions};
pub use types::{RagError, EMBEDDING_DIM, MIN_EMBEDDING_NORM};
