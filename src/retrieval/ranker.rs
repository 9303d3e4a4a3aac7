//! Query-time scoring and selection of candidate segments.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::embeddings::cosine_similarity;
use crate::types::RagError;

/// Metadata carried alongside a candidate embedding.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CandidateMetadata {
    /// When the source document was ingested; feeds the temporal tie-break.
    pub ingested_at: Option<DateTime<Utc>>,
    /// Segment text, used by the lexical rerank pass when present.
    pub content: Option<String>,
}

/// One stored segment offered to the ranker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Candidate {
    /// Caller-assigned segment identifier.
    pub id: String,
    /// The segment's embedding vector.
    pub embedding: Vec<f32>,
    pub metadata: CandidateMetadata,
}

impl Candidate {
    pub fn new(id: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            embedding,
            metadata: CandidateMetadata::default(),
        }
    }

    /// Attach an ingestion timestamp.
    #[must_use]
    pub fn with_ingested_at(mut self, at: DateTime<Utc>) -> Self {
        self.metadata.ingested_at = Some(at);
        self
    }

    /// Attach the segment text for lexical reranking.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.metadata.content = Some(content.into());
        self
    }
}

/// Per-query retrieval options.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetrievalOptions {
    /// Candidates scoring below this cosine similarity are discarded.
    pub similarity_threshold: f32,
    /// Upper bound on returned results, in `1..=20`.
    pub max_chunks: usize,
    /// Suppress near-duplicate results via greedy marginal selection.
    pub diversity_boost: bool,
    /// Break score ties in favor of more recently ingested content.
    pub temporal_boost: bool,
    /// Blend a lexical-overlap score into the ranking.
    pub rerank: bool,
    /// Query text for the lexical rerank pass; without it the pass is a
    /// no-op.
    pub query_text: Option<String>,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            max_chunks: 6,
            diversity_boost: false,
            temporal_boost: false,
            rerank: false,
            query_text: None,
        }
    }
}

impl RetrievalOptions {
    pub fn validate(&self) -> Result<(), RagError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(RagError::InvalidInput(format!(
                "similarity_threshold {} outside [0, 1]",
                self.similarity_threshold
            )));
        }
        if !(1..=20).contains(&self.max_chunks) {
            return Err(RagError::InvalidInput(format!(
                "max_chunks {} outside 1..=20",
                self.max_chunks
            )));
        }
        Ok(())
    }
}

/// Tunable knobs for the diversity and rerank passes.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RankerConfig {
    /// A candidate is skipped by the diversity pass when its average
    /// similarity to already-selected results reaches this value.
    pub diversity_threshold: f32,
    /// Weight of the lexical score in the rerank blend; the cosine score
    /// gets `1 - rerank_weight`.
    pub rerank_weight: f32,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            diversity_threshold: 0.9,
            rerank_weight: 0.3,
        }
    }
}

/// One ranked retrieval result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Identifier of the selected candidate.
    pub id: String,
    /// The score that placed it here (cosine, or the rerank blend).
    pub score: f32,
}

/// Rank `candidates` against `query` with default [`RankerConfig`] knobs.
pub fn rank(
    query: &[f32],
    candidates: &[Candidate],
    options: &RetrievalOptions,
) -> Result<Vec<RankedResult>, RagError> {
    rank_with_config(query, candidates, options, &RankerConfig::default())
}

/// Rank `candidates` against `query`.
///
/// Empty candidate sets and thresholds that filter everything out return an
/// empty list, not an error; the caller decides whether to retry with a
/// lower threshold.
pub fn rank_with_config(
    query: &[f32],
    candidates: &[Candidate],
    options: &RetrievalOptions,
    config: &RankerConfig,
) -> Result<Vec<RankedResult>, RagError> {
    options.validate()?;

    let mut scored: Vec<(&Candidate, f32)> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let score = cosine_similarity(query, &candidate.embedding)?;
        if score >= options.similarity_threshold {
            scored.push((candidate, score));
        }
    }

    if scored.is_empty() {
        debug!(
            threshold = options.similarity_threshold,
            candidates = candidates.len(),
            "no candidates above threshold"
        );
        return Ok(Vec::new());
    }

    // Stable sort: equal scores keep insertion order unless the temporal
    // tie-break is requested.
    scored.sort_by(|a, b| {
        match b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal) {
            Ordering::Equal if options.temporal_boost => {
                b.0.metadata.ingested_at.cmp(&a.0.metadata.ingested_at)
            }
            ordering => ordering,
        }
    });

    let selected = if options.diversity_boost {
        select_diverse(&scored, options.max_chunks, config.diversity_threshold)?
    } else {
        scored
    };

    let mut results: Vec<RankedResult> = selected
        .iter()
        .map(|(candidate, score)| RankedResult {
            id: candidate.id.clone(),
            score: *score,
        })
        .collect();

    if options.rerank {
        if let Some(query_text) = options.query_text.as_deref() {
            blend_lexical(&mut results, &selected, query_text, config.rerank_weight);
        }
    }

    results.truncate(options.max_chunks);
    Ok(results)
}

/// Greedy marginal selection: accept the next best candidate only when it is
/// not a near-duplicate of what was already chosen.
fn select_diverse<'a>(
    scored: &[(&'a Candidate, f32)],
    max_chunks: usize,
    diversity_threshold: f32,
) -> Result<Vec<(&'a Candidate, f32)>, RagError> {
    let mut selected: Vec<(&Candidate, f32)> = Vec::new();

    for &(candidate, score) in scored {
        if selected.len() >= max_chunks {
            break;
        }
        if selected.is_empty() {
            selected.push((candidate, score));
            continue;
        }

        let mut total = 0.0f32;
        for (chosen, _) in &selected {
            total += cosine_similarity(&candidate.embedding, &chosen.embedding)?;
        }
        let average = total / selected.len() as f32;

        if average < diversity_threshold {
            selected.push((candidate, score));
        } else {
            debug!(id = %candidate.id, average, "diversity pass skipped near-duplicate");
        }
    }

    Ok(selected)
}

/// Blend a lexical word-overlap score into the cosine ranking and re-sort.
fn blend_lexical(
    results: &mut Vec<RankedResult>,
    selected: &[(&Candidate, f32)],
    query_text: &str,
    rerank_weight: f32,
) {
    let query_words = word_set(query_text);
    if query_words.is_empty() {
        return;
    }

    for (result, &(candidate, cosine)) in results.iter_mut().zip(selected) {
        let lexical = candidate
            .metadata
            .content
            .as_deref()
            .map(|content| jaccard(&query_words, &word_set(content)))
            .unwrap_or(0.0);
        result.score = (1.0 - rerank_weight) * cosine + rerank_weight * lexical;
    }

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

fn word_set(text: &str) -> HashSet<String> {
    text.unicode_words()
        .map(|w| w.to_lowercase())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}
