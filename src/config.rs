// ragcore/src/config.rs
//
// Pipeline configuration: chunking, retrieval depth and answer fallback

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default passage budget in characters
pub const DEFAULT_MAX_SIZE: usize = 400;

/// Default number of passages returned by `ask`
pub const DEFAULT_TOP_K: usize = 3;

/// Characters of context echoed by the fallback answer
pub const DEFAULT_FALLBACK_CHARS: usize = 800;

/// Texts sent to the encoder per call
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("overlap ({overlap}) must be smaller than max_size ({max_size})")]
    OverlapTooLarge { overlap: usize, max_size: usize },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How documents are split into passages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Pack paragraphs, falling back to sentences for oversized paragraphs
    #[default]
    Paragraph,

    /// Fixed groups of whitespace-delimited words
    Words { words_per_chunk: usize },
}

/// Chunker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Passage budget in characters
    pub max_size: usize,

    /// Characters of the previous passage carried into the next one (0 = off)
    pub overlap: usize,

    pub strategy: ChunkStrategy,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            overlap: 0,
            strategy: ChunkStrategy::default(),
        }
    }
}

/// Retrieval pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunk: ChunkConfig,

    /// Passages retrieved by `ask`
    pub top_k: usize,

    /// Context characters kept in the fallback answer
    pub fallback_chars: usize,

    /// Texts per encoder call on the dense path
    pub batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk: ChunkConfig::default(),
            top_k: DEFAULT_TOP_K,
            fallback_chars: DEFAULT_FALLBACK_CHARS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl RagConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder: set the passage budget
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.chunk.max_size = max_size;
        self
    }

    /// Builder: set passage overlap
    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.chunk.overlap = overlap;
        self
    }

    /// Builder: set chunking strategy
    pub fn with_strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.chunk.strategy = strategy;
        self
    }

    /// Builder: set default retrieval depth
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Builder: set encoder batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk.max_size == 0 {
            return Err(ConfigError::Zero { field: "chunk.max_size" });
        }
        if let ChunkStrategy::Words { words_per_chunk: 0 } = self.chunk.strategy {
            return Err(ConfigError::Zero { field: "chunk.strategy.words_per_chunk" });
        }
        if self.chunk.overlap >= self.chunk.max_size {
            return Err(ConfigError::OverlapTooLarge {
                overlap: self.chunk.overlap,
                max_size: self.chunk.max_size,
            });
        }
        if self.top_k == 0 {
            return Err(ConfigError::Zero { field: "top_k" });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Zero { field: "batch_size" });
        }
        Ok(())
    }
}
