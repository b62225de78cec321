// ragcore/src/embeddings/tokenize.rs
//
// HuggingFace tokenizer wrapper producing padded model inputs

use std::path::Path;

use thiserror::Error;
use tokenizers::Tokenizer;

#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("failed to load tokenizer: {0}")]
    Load(String),

    #[error("failed to encode text: {0}")]
    Encode(String),
}

/// One tokenized text, all three rows the same length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl TokenizedInput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    fn truncate(&mut self, max_length: usize) {
        self.input_ids.truncate(max_length);
        self.attention_mask.truncate(max_length);
        self.token_type_ids.truncate(max_length);
    }

    fn pad_to(&mut self, length: usize) {
        self.input_ids.resize(length, 0);
        self.attention_mask.resize(length, 0);
        self.token_type_ids.resize(length, 0);
    }
}

/// Tokenizer bound to a model's maximum sequence length
pub struct EmbedTokenizer {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl EmbedTokenizer {
    /// From `tokenizer.json` contents
    pub fn from_json(tokenizer_json: &str, max_length: usize) -> Result<Self, TokenizerError> {
        let tokenizer = Tokenizer::from_bytes(tokenizer_json.as_bytes())
            .map_err(|e| TokenizerError::Load(e.to_string()))?;
        Ok(Self { tokenizer, max_length })
    }

    /// From a `tokenizer.json` file on disk
    pub fn from_file(path: impl AsRef<Path>, max_length: usize) -> Result<Self, TokenizerError> {
        let tokenizer = Tokenizer::from_file(path.as_ref())
            .map_err(|e| TokenizerError::Load(format!("{}: {}", path.as_ref().display(), e)))?;
        Ok(Self { tokenizer, max_length })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn encode(&self, text: &str) -> Result<TokenizedInput, TokenizerError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| TokenizerError::Encode(e.to_string()))?;

        let widen = |xs: &[u32]| xs.iter().map(|&x| x as i64).collect::<Vec<_>>();
        let mut input = TokenizedInput {
            input_ids: widen(encoding.get_ids()),
            attention_mask: widen(encoding.get_attention_mask()),
            token_type_ids: widen(encoding.get_type_ids()),
        };
        input.truncate(self.max_length);
        Ok(input)
    }

    /// Encode and right-pad to the longest input. Returns the padded length.
    pub fn encode_padded(&self, texts: &[String]) -> Result<(Vec<TokenizedInput>, usize), TokenizerError> {
        let encoded = texts
            .iter()
            .map(|t| self.encode(t))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pad_batch(encoded))
    }
}

/// Right-pad every input with zeros to the longest length
pub fn pad_batch(mut inputs: Vec<TokenizedInput>) -> (Vec<TokenizedInput>, usize) {
    let seq_len = inputs.iter().map(TokenizedInput::len).max().unwrap_or(0);
    for input in &mut inputs {
        input.pad_to(seq_len);
    }
    (inputs, seq_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(ids: &[i64]) -> TokenizedInput {
        TokenizedInput {
            input_ids: ids.to_vec(),
            attention_mask: vec![1; ids.len()],
            token_type_ids: vec![0; ids.len()],
        }
    }

    #[test]
    fn test_pad_batch() {
        let (padded, seq_len) = pad_batch(vec![input(&[101, 7592, 102]), input(&[101, 102])]);
        assert_eq!(seq_len, 3);
        assert_eq!(padded[1].input_ids, vec![101, 102, 0]);
        assert_eq!(padded[1].attention_mask, vec![1, 1, 0]);
        assert_eq!(padded[1].token_type_ids, vec![0, 0, 0]);
        assert_eq!(padded[0], input(&[101, 7592, 102]));
    }

    #[test]
    fn test_pad_empty_batch() {
        let (padded, seq_len) = pad_batch(Vec::new());
        assert!(padded.is_empty());
        assert_eq!(seq_len, 0);
    }

    #[test]
    fn test_truncate() {
        let mut i = input(&[1, 2, 3, 4]);
        i.truncate(2);
        assert_eq!(i.len(), 2);
        assert_eq!(i.attention_mask.len(), 2);
    }

    #[test]
    fn test_missing_tokenizer_file() {
        match EmbedTokenizer::from_file("/nonexistent/tokenizer.json", 128) {
            Err(TokenizerError::Load(msg)) => assert!(msg.contains("/nonexistent/tokenizer.json")),
            Err(other) => panic!("expected load error, got {:?}", other),
            Ok(_) => panic!("expected load error"),
        }
    }

    #[test]
    fn test_invalid_tokenizer_json() {
        assert!(matches!(
            EmbedTokenizer::from_json("not a tokenizer", 128),
            Err(TokenizerError::Load(_))
        ));
    }
}
