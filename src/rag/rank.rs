//! Ranker - exhaustive cosine scoring with stable top-k selection

use serde::{Deserialize, Serialize};
use tracing::error;

use super::chunker::Passage;
use super::store::StoreEntry;
use crate::error::{RagError, Result};

/// Added to the cosine denominator so zero vectors score 0 instead of NaN
pub const COSINE_EPSILON: f32 = 1e-9;

/// A passage with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub score: f32,
    pub passage: Passage,
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// `dot(a, b) / (|a| * |b| + eps)`. Callers guarantee equal lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    dot(a, b) / (magnitude(a) * magnitude(b) + COSINE_EPSILON)
}

/// Score `query` against every entry and return the `top_k` best,
/// highest first. Equal scores keep store order.
pub fn rank(query: &[f32], entries: &[StoreEntry], top_k: usize) -> Result<Vec<ScoredPassage>> {
    if entries.is_empty() || top_k == 0 {
        return Ok(Vec::new());
    }

    let query_norm = magnitude(query);
    let mut scored = Vec::with_capacity(entries.len());

    for entry in entries {
        if entry.vector.len() != query.len() {
            error!(
                expected = entry.vector.len(),
                actual = query.len(),
                "query vector width disagrees with the index"
            );
            debug_assert_eq!(
                entry.vector.len(),
                query.len(),
                "query vector width disagrees with the index"
            );
            return Err(RagError::DimensionMismatch {
                expected: entry.vector.len(),
                actual: query.len(),
            });
        }
        let score = dot(query, &entry.vector) / (query_norm * magnitude(&entry.vector) + COSINE_EPSILON);
        scored.push((score, entry));
    }

    // sort_by is stable
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(top_k);

    Ok(scored
        .into_iter()
        .map(|(score, entry)| ScoredPassage {
            score,
            passage: entry.passage.clone(),
        })
        .collect())
}
