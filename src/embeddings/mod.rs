// ragcore/src/embeddings/mod.rs
//
// Vectorizer strategies for passages and queries.
//
// - Dense: a pretrained sentence encoder (`OnnxEncoder` via `tract-onnx`),
//   fixed dimensionality, no fitting.
// - Sparse: TF-IDF over the ingested corpus, dimensionality = vocabulary size.
//
// The strategy is chosen once, when the engine is built.

pub mod config;
pub mod dense;
pub mod model;
pub mod sparse;
pub mod tokenize;

pub use config::{EmbedConfig, OnnxModel, PoolingStrategy};
pub use dense::{DenseVectorizer, SentenceEncoder};
pub use model::{ModelError, OnnxEncoder};
pub use sparse::TfIdfVectorizer;
pub use tokenize::{EmbedTokenizer, TokenizedInput, TokenizerError};

use crate::error::EmbedError;
use crate::rag::Vector;

/// Turns text into vectors.
///
/// `fit` must run before embedding for strategies that report
/// `requires_fit`; for the others it is a no-op. Empty input slices embed
/// to an empty result.
pub trait Vectorizer: Send + Sync {
    /// Short strategy name for logs and stats
    fn name(&self) -> &'static str;

    /// Whether vectors depend on the fitted corpus
    fn requires_fit(&self) -> bool;

    /// Learn corpus state from the full set of passages
    fn fit(&mut self, corpus: &[String]) -> Result<(), EmbedError>;

    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vector>, EmbedError>;

    fn embed_one(&self, text: &str) -> Result<Vector, EmbedError> {
        let mut vectors = self.embed_many(&[text.to_string()])?;
        vectors.pop().ok_or(EmbedError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }

    /// Width of produced vectors, `None` until known
    fn dimensions(&self) -> Option<usize>;

    /// Forget fitted state
    fn reset(&mut self);
}

impl<V: Vectorizer + ?Sized> Vectorizer for Box<V> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn requires_fit(&self) -> bool {
        (**self).requires_fit()
    }

    fn fit(&mut self, corpus: &[String]) -> Result<(), EmbedError> {
        (**self).fit(corpus)
    }

    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vector>, EmbedError> {
        (**self).embed_many(texts)
    }

    fn embed_one(&self, text: &str) -> Result<Vector, EmbedError> {
        (**self).embed_one(text)
    }

    fn dimensions(&self) -> Option<usize> {
        (**self).dimensions()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// L2-normalize in place; zero vectors are left untouched
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}
