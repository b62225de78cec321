// ragcore/src/embeddings/dense.rs
//
// Dense strategy: batches texts through a sentence encoder

use tracing::{debug, warn};

use super::model::{ModelError, OnnxEncoder};
use super::{l2_normalize, Vectorizer};
use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::EmbedError;
use crate::rag::Vector;

/// A pretrained model mapping texts to fixed-width vectors
pub trait SentenceEncoder: Send + Sync {
    /// Output width
    fn dimensions(&self) -> usize;

    /// Encode a batch, one vector per text, in input order
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError>;
}

/// Dense vectorizer over any sentence encoder
pub struct DenseVectorizer<E> {
    encoder: E,
    batch_size: usize,
    truncate_dim: Option<usize>,
}

impl<E: SentenceEncoder> DenseVectorizer<E> {
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            batch_size: DEFAULT_BATCH_SIZE,
            truncate_dim: None,
        }
    }

    /// Builder: texts per encoder call
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Builder: Matryoshka truncation. Vectors keep their first `dim`
    /// components and are re-normalized. Only meaningful for MRL models.
    pub fn with_truncate_dim(mut self, dim: usize) -> Self {
        self.truncate_dim = Some(dim);
        self
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    fn output_dim(&self) -> usize {
        let full = self.encoder.dimensions();
        self.truncate_dim.map_or(full, |dim| dim.min(full))
    }
}

impl DenseVectorizer<OnnxEncoder> {
    /// Dense vectorizer applying the encoder config's `truncate_dim`
    pub fn from_onnx(encoder: OnnxEncoder) -> Self {
        let config = encoder.config();
        if config.is_lossy_truncation() {
            warn!(
                model = %config.model,
                dims = config.output_dimensions(),
                "truncating a model not trained for Matryoshka embeddings"
            );
        }
        let truncate_dim = config.truncate_dim;
        Self {
            encoder,
            batch_size: DEFAULT_BATCH_SIZE,
            truncate_dim,
        }
    }
}

impl<E: SentenceEncoder> Vectorizer for DenseVectorizer<E> {
    fn name(&self) -> &'static str {
        "dense"
    }

    fn requires_fit(&self) -> bool {
        false
    }

    fn fit(&mut self, _corpus: &[String]) -> Result<(), EmbedError> {
        Ok(())
    }

    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vector>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let full = self.encoder.dimensions();
        let out_dim = self.output_dim();
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let encoded = self.encoder.encode(batch)?;
            if encoded.len() != batch.len() {
                return Err(EmbedError::CountMismatch {
                    expected: batch.len(),
                    actual: encoded.len(),
                });
            }

            for mut vector in encoded {
                if vector.len() != full {
                    return Err(EmbedError::WidthMismatch {
                        expected: full,
                        actual: vector.len(),
                    });
                }
                if out_dim < full {
                    vector.truncate(out_dim);
                    l2_normalize(&mut vector);
                }
                vectors.push(vector);
            }
        }

        debug!(count = vectors.len(), dims = out_dim, "dense embeddings computed");
        Ok(vectors)
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.output_dim())
    }

    fn reset(&mut self) {}
}
