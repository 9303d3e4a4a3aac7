//! Text normalization and token-bounded chunking.
//!
//! ```text
//! raw markdown ──► markdown::normalize ──► segmenter::paragraphs
//!                                              │
//!                                              ▼
//!                      assembly::Assembler (greedy packing + overlap)
//!                                              │
//!                                              ▼
//!                              Vec<TextSegment> + ChunkingStats
//! ```
//!
//! The [`Chunker`] facade runs the whole pipeline; the stage modules are
//! public so callers can reuse individual pieces (for example counting query
//! tokens with the same [`tokenizer::TokenCounter`]).

mod assembly;
pub mod config;
pub mod markdown;
pub mod segmenter;
pub mod service;
pub mod tokenizer;
pub mod types;

pub use config::ChunkerConfig;
pub use service::Chunker;
pub use tokenizer::TokenCounter;
pub use types::{ChunkingStats, TextSegment};
