// ragcore/src/embeddings/config.rs
//
// ONNX encoder configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentence-embedding models the ONNX encoder knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OnnxModel {
    /// sentence-transformers/all-MiniLM-L6-v2 - 384 dimensions, lightweight
    #[default]
    #[serde(rename = "all-minilm-l6-v2")]
    AllMiniLML6V2,

    /// BAAI/bge-small-en-v1.5 - 384 dimensions
    #[serde(rename = "bge-small-en-v1.5")]
    BGESmallENV15,

    /// nomic-ai/modernbert-embed-base - 768 dimensions, long context
    #[serde(rename = "modernbert-embed-base")]
    ModernBERTBase,
}

impl fmt::Display for OnnxModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllMiniLML6V2 => write!(f, "all-minilm-l6-v2"),
            Self::BGESmallENV15 => write!(f, "bge-small-en-v1.5"),
            Self::ModernBERTBase => write!(f, "modernbert-embed-base"),
        }
    }
}

impl OnnxModel {
    /// Resolve a model from its short or full name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "minilm" | "all-minilm-l6-v2" | "all-MiniLM-L6-v2" => Some(Self::AllMiniLML6V2),
            "bge-small" | "bge-small-en-v1.5" => Some(Self::BGESmallENV15),
            "modernbert-base" | "modernbert-embed-base" => Some(Self::ModernBERTBase),
            _ => None,
        }
    }

    pub fn dimensions(&self) -> usize {
        match self {
            Self::AllMiniLML6V2 | Self::BGESmallENV15 => 384,
            Self::ModernBERTBase => 768,
        }
    }

    /// Tokens kept per input before truncation
    pub fn max_length(&self) -> usize {
        match self {
            Self::AllMiniLML6V2 => 256,
            Self::BGESmallENV15 => 512,
            Self::ModernBERTBase => 8192,
        }
    }

    /// BERT-family graphs take a third `token_type_ids` input
    pub fn uses_token_type_ids(&self) -> bool {
        !matches!(self, Self::ModernBERTBase)
    }

    /// Pooling the model was trained with
    pub fn default_pooling(&self) -> PoolingStrategy {
        match self {
            Self::BGESmallENV15 => PoolingStrategy::Cls,
            Self::AllMiniLML6V2 | Self::ModernBERTBase => PoolingStrategy::Mean,
        }
    }

    /// Matryoshka models front-load signal, so truncated vectors stay useful
    pub fn supports_matryoshka(&self) -> bool {
        matches!(self, Self::BGESmallENV15 | Self::ModernBERTBase)
    }
}

/// Token embeddings -> sentence embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PoolingStrategy {
    /// Mask-weighted mean over tokens
    #[default]
    Mean,

    /// First ([CLS]) token
    Cls,

    /// Element-wise max over unmasked tokens
    Max,
}

/// Encoder configuration. Fields missing from serialized input fall back
/// to the chosen model's own settings, not to the default model's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EmbedConfigFields")]
pub struct EmbedConfig {
    pub model: OnnxModel,
    pub pooling: PoolingStrategy,
    /// L2-normalize sentence vectors
    pub normalize: bool,
    /// Matryoshka truncation: keep the first `n` components, re-normalized
    pub truncate_dim: Option<usize>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct EmbedConfigFields {
    model: OnnxModel,
    pooling: Option<PoolingStrategy>,
    normalize: Option<bool>,
    truncate_dim: Option<usize>,
}

impl From<EmbedConfigFields> for EmbedConfig {
    fn from(fields: EmbedConfigFields) -> Self {
        let mut config = Self::for_model(fields.model);
        if let Some(pooling) = fields.pooling {
            config.pooling = pooling;
        }
        if let Some(normalize) = fields.normalize {
            config.normalize = normalize;
        }
        config.truncate_dim = fields.truncate_dim;
        config
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self::for_model(OnnxModel::default())
    }
}

impl EmbedConfig {
    /// Config with the model's own pooling
    pub fn for_model(model: OnnxModel) -> Self {
        Self {
            model,
            pooling: model.default_pooling(),
            normalize: true,
            truncate_dim: None,
        }
    }

    /// Builder: override pooling
    pub fn with_pooling(mut self, pooling: PoolingStrategy) -> Self {
        self.pooling = pooling;
        self
    }

    /// Builder: Matryoshka truncation to `dim` components
    pub fn with_truncate_dim(mut self, dim: usize) -> Self {
        self.truncate_dim = Some(dim);
        self
    }

    /// Width of the vectors handed to the index
    pub fn output_dimensions(&self) -> usize {
        let full = self.model.dimensions();
        self.truncate_dim.map_or(full, |dim| dim.min(full))
    }

    /// Truncation requested on a model not trained for it
    pub fn is_lossy_truncation(&self) -> bool {
        self.output_dimensions() < self.model.dimensions() && !self.model.supports_matryoshka()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_dimensions() {
        assert_eq!(OnnxModel::AllMiniLML6V2.dimensions(), 384);
        assert_eq!(OnnxModel::BGESmallENV15.dimensions(), 384);
        assert_eq!(OnnxModel::ModernBERTBase.dimensions(), 768);
    }

    #[test]
    fn test_default_config() {
        let config = EmbedConfig::default();
        assert_eq!(config.model, OnnxModel::AllMiniLML6V2);
        assert_eq!(config.pooling, PoolingStrategy::Mean);
        assert!(config.normalize);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(OnnxModel::from_name("bge-small"), Some(OnnxModel::BGESmallENV15));
        assert_eq!(OnnxModel::from_name("all-MiniLM-L6-v2"), Some(OnnxModel::AllMiniLML6V2));
        assert_eq!(OnnxModel::from_name("unknown-model"), None);
    }

    #[test]
    fn test_for_model_uses_native_pooling() {
        assert_eq!(EmbedConfig::for_model(OnnxModel::BGESmallENV15).pooling, PoolingStrategy::Cls);
        let config = EmbedConfig::for_model(OnnxModel::BGESmallENV15).with_pooling(PoolingStrategy::Max);
        assert_eq!(config.pooling, PoolingStrategy::Max);
    }

    #[test]
    fn test_matryoshka_support() {
        assert!(OnnxModel::BGESmallENV15.supports_matryoshka());
        assert!(!OnnxModel::AllMiniLML6V2.supports_matryoshka());
    }

    #[test]
    fn test_truncation_dimensions() {
        let config = EmbedConfig::for_model(OnnxModel::ModernBERTBase).with_truncate_dim(256);
        assert_eq!(config.output_dimensions(), 256);
        assert!(!config.is_lossy_truncation());

        let oversized = EmbedConfig::for_model(OnnxModel::BGESmallENV15).with_truncate_dim(1024);
        assert_eq!(oversized.output_dimensions(), 384);

        let minilm = EmbedConfig::default().with_truncate_dim(128);
        assert!(minilm.is_lossy_truncation());
        assert!(!EmbedConfig::default().is_lossy_truncation());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&OnnxModel::ModernBERTBase).unwrap();
        assert_eq!(json, "\"modernbert-embed-base\"");
        let config: EmbedConfig = serde_json::from_str(r#"{"model":"bge-small-en-v1.5"}"#).unwrap();
        assert_eq!(config.model, OnnxModel::BGESmallENV15);
        assert_eq!(config.pooling, PoolingStrategy::Cls);
        assert!(config.normalize);
        assert_eq!(config.truncate_dim, None);
    }

    #[test]
    fn test_deserialize_explicit_fields_win() {
        let config: EmbedConfig = serde_json::from_str(
            r#"{"model":"bge-small-en-v1.5","pooling":"Mean","normalize":false,"truncate_dim":128}"#,
        )
        .unwrap();
        assert_eq!(config.pooling, PoolingStrategy::Mean);
        assert!(!config.normalize);
        assert_eq!(config.truncate_dim, Some(128));

        let empty: EmbedConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, EmbedConfig::default());
    }

    #[test]
    fn test_serialized_config_reads_back() {
        let config = EmbedConfig::for_model(OnnxModel::ModernBERTBase).with_truncate_dim(256);
        let json = serde_json::to_string(&config).unwrap();
        let back: EmbedConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
