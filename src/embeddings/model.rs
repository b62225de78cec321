// ragcore/src/embeddings/model.rs
//
// Sentence encoder backed by tract ONNX inference

use std::io::Cursor;
use std::path::Path;

use ndarray::{Array1, ArrayView2, ArrayView3, Axis};
use thiserror::Error;
use tracing::info;
use tract_onnx::prelude::*;

use super::config::{EmbedConfig, PoolingStrategy};
use super::dense::SentenceEncoder;
use super::l2_normalize;
use super::tokenize::{EmbedTokenizer, TokenizedInput, TokenizerError};

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model load failed: {0}")]
    Load(String),

    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    #[error("unexpected output shape: {0}")]
    Shape(String),
}

/// ONNX sentence encoder (BERT-style graph + HuggingFace tokenizer)
pub struct OnnxEncoder {
    plan: TractModel,
    tokenizer: EmbedTokenizer,
    config: EmbedConfig,
}

impl OnnxEncoder {
    /// Load from ONNX bytes and `tokenizer.json` contents
    pub fn from_bytes(model_bytes: &[u8], tokenizer_json: &str, config: EmbedConfig) -> Result<Self, ModelError> {
        let plan = load_plan(model_bytes)?;
        let tokenizer = EmbedTokenizer::from_json(tokenizer_json, config.model.max_length())?;
        Ok(Self::assemble(plan, tokenizer, config))
    }

    /// Load from `model.onnx` and `tokenizer.json` on disk
    pub fn from_files(
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
        config: EmbedConfig,
    ) -> Result<Self, ModelError> {
        let model_bytes = std::fs::read(model_path)?;
        let plan = load_plan(&model_bytes)?;
        let tokenizer = EmbedTokenizer::from_file(tokenizer_path, config.model.max_length())?;
        Ok(Self::assemble(plan, tokenizer, config))
    }

    fn assemble(plan: TractModel, tokenizer: EmbedTokenizer, config: EmbedConfig) -> Self {
        info!(model = %config.model, dims = config.output_dimensions(), "onnx encoder loaded");
        Self { plan, tokenizer, config }
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    fn input_tensor(
        inputs: &[TokenizedInput],
        seq_len: usize,
        row: impl Fn(&TokenizedInput) -> &[i64],
    ) -> Result<Tensor, ModelError> {
        let data: Vec<i64> = inputs.iter().flat_map(|i| row(i).iter().copied()).collect();
        Tensor::from_shape(&[inputs.len(), seq_len], &data).map_err(|e| ModelError::Shape(e.to_string()))
    }

    fn run(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        let (padded, seq_len) = self.tokenizer.encode_padded(texts)?;

        let mut inputs: TVec<TValue> = tvec![
            Self::input_tensor(&padded, seq_len, |t| &t.input_ids)?.into(),
            Self::input_tensor(&padded, seq_len, |t| &t.attention_mask)?.into(),
        ];
        if self.config.model.uses_token_type_ids() {
            inputs.push(Self::input_tensor(&padded, seq_len, |t| &t.token_type_ids)?.into());
        }

        let outputs = self
            .plan
            .run(inputs)
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        // (batch, seq_len, hidden)
        let output = &outputs[0];
        let shape = output.shape();
        if shape.len() != 3 {
            return Err(ModelError::Shape(format!("expected 3 dims, got {:?}", shape)));
        }
        let data = output
            .as_slice::<f32>()
            .map_err(|e| ModelError::Shape(e.to_string()))?;
        let hidden = ArrayView3::from_shape((shape[0], shape[1], shape[2]), data)
            .map_err(|e| ModelError::Shape(e.to_string()))?;

        let mut sentences = Vec::with_capacity(padded.len());
        for (i, input) in padded.iter().enumerate() {
            let mask = Array1::from_iter(input.attention_mask.iter().map(|&m| m as f32));
            let mut vector = pool(hidden.index_axis(Axis(0), i), &mask, self.config.pooling);
            if self.config.normalize {
                l2_normalize(&mut vector);
            }
            sentences.push(vector);
        }
        Ok(sentences)
    }
}

fn load_plan(model_bytes: &[u8]) -> Result<TractModel, ModelError> {
    tract_onnx::onnx()
        .model_for_read(&mut Cursor::new(model_bytes))
        .and_then(|m| m.into_optimized())
        .and_then(|m| m.into_runnable())
        .map_err(|e| ModelError::Load(e.to_string()))
}

impl SentenceEncoder for OnnxEncoder {
    fn dimensions(&self) -> usize {
        self.config.model.dimensions()
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.run(texts)
    }
}

/// Collapse `(seq_len, hidden)` token embeddings to one vector
pub fn pool(tokens: ArrayView2<f32>, mask: &Array1<f32>, strategy: PoolingStrategy) -> Vec<f32> {
    match strategy {
        PoolingStrategy::Mean => {
            let count = mask.sum();
            let summed = tokens.t().dot(mask);
            if count > 0.0 {
                (summed / count).to_vec()
            } else {
                summed.to_vec()
            }
        }
        PoolingStrategy::Cls => tokens.row(0).to_vec(),
        PoolingStrategy::Max => {
            let mut max = Array1::from_elem(tokens.ncols(), f32::NEG_INFINITY);
            for (row, &m) in tokens.outer_iter().zip(mask) {
                if m > 0.0 {
                    max.zip_mut_with(&row, |acc, &x| *acc = acc.max(x));
                }
            }
            max.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_model_error_display() {
        let err = ModelError::Load("bad graph".to_string());
        assert!(err.to_string().contains("bad graph"));
    }

    #[test]
    fn test_mean_pooling_ignores_padding() {
        let tokens = array![[1.0, 2.0], [3.0, 4.0], [100.0, 100.0]];
        let mask = array![1.0, 1.0, 0.0];
        assert_eq!(pool(tokens.view(), &mask, PoolingStrategy::Mean), vec![2.0, 3.0]);
    }

    #[test]
    fn test_cls_pooling() {
        let tokens = array![[0.5, -0.5], [3.0, 4.0]];
        let mask = array![1.0, 1.0];
        assert_eq!(pool(tokens.view(), &mask, PoolingStrategy::Cls), vec![0.5, -0.5]);
    }

    #[test]
    fn test_max_pooling_ignores_padding() {
        let tokens = array![[1.0, 5.0], [3.0, 2.0], [9.0, 9.0]];
        let mask = array![1.0, 1.0, 0.0];
        assert_eq!(pool(tokens.view(), &mask, PoolingStrategy::Max), vec![3.0, 5.0]);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let result = OnnxEncoder::from_bytes(b"not onnx", "{}", EmbedConfig::default());
        assert!(matches!(result, Err(ModelError::Load(_))));
    }

    #[test]
    fn test_missing_model_file() {
        let result = OnnxEncoder::from_files("/nonexistent/model.onnx", "/nonexistent/tokenizer.json", EmbedConfig::default());
        assert!(matches!(result, Err(ModelError::Io(_))));
    }
}
