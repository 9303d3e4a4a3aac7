//! Similarity ranking of stored segments against a query embedding.
//!
//! The caller fetches candidate embeddings from wherever they live (this
//! crate never touches storage), builds a [`Candidate`] list, and calls
//! [`rank`] with per-query [`RetrievalOptions`]. Results come back ordered
//! with the score that placed each entry, so retrieval quality can be
//! reported downstream.

pub mod ranker;

pub use ranker::{
    rank, rank_with_config, Candidate, CandidateMetadata, RankedResult, RankerConfig,
    RetrievalOptions,
};
