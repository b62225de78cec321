//! JavaScript bindings for the retrieval engine
//!
//! Starts with the TF-IDF strategy; `loadModel` switches to the ONNX
//! sentence encoder and clears the collection.

use wasm_bindgen::prelude::*;

use crate::config::RagConfig;
use crate::embeddings::{DenseVectorizer, EmbedConfig, OnnxEncoder, OnnxModel, TfIdfVectorizer};
use crate::error::RagError;
use crate::rag::RagEngine;

fn to_js(err: RagError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn embed_config(model_name: Option<&str>, truncate_dim: Option<usize>) -> Result<EmbedConfig, String> {
    let model = match model_name {
        Some(name) => OnnxModel::from_name(name).ok_or_else(|| format!("Unknown model: {}", name))?,
        None => OnnxModel::default(),
    };
    let config = EmbedConfig::for_model(model);
    Ok(match truncate_dim {
        Some(dim) => config.with_truncate_dim(dim),
        None => config,
    })
}

/// # Example (TypeScript)
/// ```typescript
/// const rag = new RagHandle();
/// rag.ingest(documentText);
/// const passages = rag.retrieve("What are cats?", 3);
/// const { text, context, source } = rag.ask("What are cats?");
/// ```
#[wasm_bindgen]
pub struct RagHandle {
    engine: RagEngine,
}

#[wasm_bindgen]
impl RagHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            engine: RagEngine::new(TfIdfVectorizer::new()),
        }
    }

    /// Create with a `RagConfig` object; missing fields take defaults
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_js: JsValue) -> Result<RagHandle, JsValue> {
        let config: RagConfig = serde_wasm_bindgen::from_value(config_js)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
        let engine = RagEngine::sparse(config).map_err(to_js)?;
        Ok(Self { engine })
    }

    /// Switch to dense embeddings from ONNX bytes and tokenizer.json.
    /// `truncate_dim` enables Matryoshka truncation.
    #[wasm_bindgen(js_name = loadModel)]
    pub fn load_model(
        &mut self,
        model_bytes: &[u8],
        tokenizer_json: &str,
        model_name: Option<String>,
        truncate_dim: Option<usize>,
    ) -> Result<(), JsValue> {
        let config = embed_config(model_name.as_deref(), truncate_dim).map_err(|e| JsValue::from_str(&e))?;
        let encoder = OnnxEncoder::from_bytes(model_bytes, tokenizer_json, config)
            .map_err(|e| JsValue::from_str(&format!("Model load failed: {}", e)))?;
        let batch_size = self.engine.config().batch_size;
        self.engine
            .set_vectorizer(DenseVectorizer::from_onnx(encoder).with_batch_size(batch_size));
        Ok(())
    }

    /// Append a document; returns passages added
    pub fn ingest(&self, text: &str) -> Result<usize, JsValue> {
        self.engine.ingest(text).map_err(to_js)
    }

    /// Replace the collection with a document; returns passages added
    pub fn replace(&self, text: &str) -> Result<usize, JsValue> {
        self.engine.replace(text).map_err(to_js)
    }

    pub fn clear(&self) {
        self.engine.clear();
    }

    /// Passage texts, best first
    pub fn retrieve(&self, question: &str, top_k: usize) -> Result<JsValue, JsValue> {
        let passages = self.engine.retrieve(question, top_k).map_err(to_js)?;
        serde_wasm_bindgen::to_value(&passages)
            .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
    }

    /// `{ score, passage: { text, index } }[]`, best first
    #[wasm_bindgen(js_name = retrieveScored)]
    pub fn retrieve_scored(&self, question: &str, top_k: usize) -> Result<JsValue, JsValue> {
        let scored = self.engine.retrieve_scored(question, top_k).map_err(to_js)?;
        serde_wasm_bindgen::to_value(&scored)
            .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
    }

    /// Retrieve and answer; `{ text, context, source }`
    pub fn ask(&self, question: &str) -> Result<JsValue, JsValue> {
        let answer = self.engine.ask(question).map_err(to_js)?;
        serde_wasm_bindgen::to_value(&answer)
            .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
    }

    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.engine.stats()).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = passageCount)]
    pub fn passage_count(&self) -> usize {
        self.engine.stats().passages
    }
}

impl Default for RagHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_ingest_and_clear() {
        let handle = RagHandle::new();
        assert_eq!(handle.ingest("Cats are mammals.\n\nDogs are mammals too.").unwrap(), 1);
        assert_eq!(handle.passage_count(), 1);
        assert_eq!(handle.replace("Rockets reach orbit.").unwrap(), 1);
        handle.clear();
        assert_eq!(handle.passage_count(), 0);
    }

    #[test]
    fn test_embed_config_from_js_arguments() {
        let config = embed_config(Some("bge-small"), Some(128)).unwrap();
        assert_eq!(config.model, OnnxModel::BGESmallENV15);
        assert_eq!(config.output_dimensions(), 128);

        assert_eq!(embed_config(None, None).unwrap(), EmbedConfig::default());
        assert!(embed_config(Some("gpt-2"), None).is_err());
    }
}
