//! RagCore: passage retrieval for grounded answering
//!
//! A Rust/WASM implementation of a minimal retrieval-augmented answering
//! engine: ingest text, split it into bounded passages, embed them, keep
//! them in memory and return the passages most similar to a question.
//!
//! # Architecture
//!
//! ## Retrieval (`rag`)
//! - `chunker.rs` - Chunker: paragraph/sentence-aware passage splitting
//! - `store.rs` - VectorStore: ordered (passage, vector) entries
//! - `rank.rs` - Ranker: cosine similarity, stable top-k
//! - `pipeline.rs` - RagEngine: ingest / replace / clear / retrieve / ask
//! - `answer.rs` - AnswerGenerator seam and the ContextEcho fallback
//!
//! ## Embeddings (`embeddings`)
//! - `dense.rs` - DenseVectorizer over any SentenceEncoder
//! - `model.rs` - OnnxEncoder: tract ONNX inference + pooling
//! - `sparse.rs` - TfIdfVectorizer fitted on the ingested corpus
//!
//! # Usage
//! ```no_run
//! use ragcore::{RagConfig, RagEngine};
//!
//! let engine = RagEngine::sparse(RagConfig::default())?;
//! engine.ingest("Cats are mammals.\n\nDogs are mammals too.")?;
//! let passages = engine.retrieve("What are cats?", 3)?;
//! let answer = engine.synthesize_answer("What are cats?", &passages);
//! println!("{}", answer.text);
//! # Ok::<(), ragcore::RagError>(())
//! ```

pub mod config;
pub mod embeddings;
pub mod error;
pub mod rag;
pub mod wasm;

pub use config::{ChunkConfig, ChunkStrategy, ConfigError, RagConfig};
pub use embeddings::{DenseVectorizer, OnnxEncoder, SentenceEncoder, TfIdfVectorizer, Vectorizer};
pub use error::{EmbedError, GenerationError, RagError, Result};
pub use rag::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Install the panic hook so panics reach the browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub fn version() -> String {
    format!("ragcore v{}", env!("CARGO_PKG_VERSION"))
}
