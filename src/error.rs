//! Error taxonomy for the retrieval pipeline.
//!
//! Input and embedding failures surface to the caller. Generation failures
//! are recovered by the answer fallback and never escape `RagEngine`.
//! Dimension mismatches indicate a broken index and abort the operation.

use thiserror::Error;

use crate::config::ConfigError;
use crate::embeddings::ModelError;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors returned by the pipeline operations
#[derive(Debug, Error)]
pub enum RagError {
    /// Nothing usable in the input after trimming
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// The vectorizer could not produce vectors
    #[error("embedding unavailable: {0}")]
    Embedding(#[from] EmbedError),

    /// A vector's width disagrees with the index. Always a bug.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Vectorizer failures
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Sparse strategy asked to embed before any corpus was fitted
    #[error("vectorizer has not been fitted on a corpus")]
    NotFitted,

    #[error(transparent)]
    Model(#[from] ModelError),

    /// The encoder returned vectors of an unexpected width
    #[error("encoder returned {actual}-d vectors, expected {expected}-d")]
    WidthMismatch { expected: usize, actual: usize },

    /// The encoder returned a different number of vectors than inputs
    #[error("encoder returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

/// Failure of the external answer generator
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// No generator configured or reachable
    #[error("answer generator unavailable: {0}")]
    Unavailable(String),

    /// Generator was reached but the call failed
    #[error("answer generation failed: {0}")]
    Failed(String),

    /// Generator answered with nothing
    #[error("answer generator returned an empty answer")]
    EmptyAnswer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_error_converts_into_rag_error() {
        let err: RagError = EmbedError::NotFitted.into();
        assert!(matches!(err, RagError::Embedding(EmbedError::NotFitted)));
        assert!(err.to_string().contains("not been fitted"));
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = RagError::DimensionMismatch { expected: 384, actual: 3 };
        assert_eq!(err.to_string(), "vector dimension mismatch: expected 384, got 3");
    }
}
