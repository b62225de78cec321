//! Retrieval pipeline for grounded answering
//!
//! # Architecture
//! ```text
//! Document → Chunker → Vectorizer → VectorStore
//!                                        ↓
//! Question → Vectorizer → Ranker (cosine, top-k) → AnswerGenerator / ContextEcho
//! ```

mod answer;
mod chunker;
mod pipeline;
mod rank;
mod store;

#[cfg(test)]
mod tests;

pub use answer::{build_context, Answer, AnswerGenerator, AnswerSource, ContextEcho, CONTEXT_SEPARATOR, NO_CONTEXT};
pub use chunker::{Chunker, Passage};
pub use pipeline::{EngineStats, RagEngine};
pub use rank::{cosine_similarity, rank, ScoredPassage, COSINE_EPSILON};
pub use store::{StoreEntry, Vector, VectorStore};
