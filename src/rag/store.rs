//! Vector Store - ordered in-memory (passage, vector) entries
//!
//! Single collection, append-only until cleared. Ranking scans every entry,
//! which is fast enough for one document's worth of passages.

use serde::{Deserialize, Serialize};

use super::chunker::Passage;
use crate::error::{RagError, Result};

/// Numeric representation of a passage or query
pub type Vector = Vec<f32>;

/// One passage paired with its vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub passage: Passage,
    pub vector: Vector,
}

impl StoreEntry {
    pub fn new(passage: Passage, vector: Vector) -> Self {
        Self { passage, vector }
    }
}

/// Ordered collection of store entries sharing one dimensionality
#[derive(Debug, Default)]
pub struct VectorStore {
    entries: Vec<StoreEntry>,
    dimensions: Option<usize>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries, preserving order.
    ///
    /// Rejects the whole batch if any vector's width differs from the
    /// store's (or from the batch's first vector when the store is empty).
    pub fn add(&mut self, entries: Vec<StoreEntry>) -> Result<()> {
        let Some(first) = entries.first() else {
            return Ok(());
        };
        let expected = self.dimensions.unwrap_or(first.vector.len());

        if let Some(bad) = entries.iter().find(|e| e.vector.len() != expected) {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: bad.vector.len(),
            });
        }

        self.dimensions = Some(expected);
        self.entries.extend(entries);
        Ok(())
    }

    /// Drop every entry and forget the dimensionality
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dimensions = None;
    }

    /// Read view of all entries in insertion order
    pub fn all(&self) -> &[StoreEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Width of every stored vector, `None` while empty
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Passages in insertion order
    pub fn passages(&self) -> impl Iterator<Item = &Passage> {
        self.entries.iter().map(|e| &e.passage)
    }
}
