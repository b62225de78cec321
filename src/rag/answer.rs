//! Answer synthesis seam
//!
//! The generative model lives outside this crate behind `AnswerGenerator`.
//! When it is missing or fails, `ContextEcho` builds a deterministic answer
//! from the retrieved passages so retrieval can be evaluated on its own.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_FALLBACK_CHARS;
use crate::error::GenerationError;

/// Separator between passages in the context block
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Context used when retrieval found nothing
pub const NO_CONTEXT: &str = "(No relevant text found.)";

/// External answer generator (e.g. a hosted chat model)
pub trait AnswerGenerator: Send + Sync {
    /// Answer `question` from `passages`, ordered most relevant first
    fn generate(&self, question: &str, passages: &[String]) -> Result<String, GenerationError>;
}

/// Where an answer came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerSource {
    Generated,
    Fallback { reason: String },
}

/// Synthesized answer plus the context it was grounded on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub context: String,
    pub source: AnswerSource,
}

impl Answer {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, AnswerSource::Fallback { .. })
    }
}

/// Join passages into one context block
pub fn build_context(passages: &[String]) -> String {
    if passages.is_empty() {
        NO_CONTEXT.to_string()
    } else {
        passages.join(CONTEXT_SEPARATOR)
    }
}

/// Deterministic fallback: echo the top of the context
#[derive(Debug, Clone, Copy)]
pub struct ContextEcho {
    max_chars: usize,
}

impl Default for ContextEcho {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_CHARS)
    }
}

impl ContextEcho {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn answer(&self, passage_count: usize, context: &str) -> String {
        let (excerpt, truncated) = truncate_chars(context, self.max_chars);
        format!(
            "Based on the uploaded document ({} relevant chunk(s)):\n\nThe relevant text says:\n\n{}{}",
            passage_count,
            excerpt,
            if truncated { "..." } else { "" }
        )
    }
}

/// First `max_chars` characters of `text`, and whether anything was cut
fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => (&text[..cut], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_context() {
        let passages = vec!["one".to_string(), "two".to_string()];
        assert_eq!(build_context(&passages), "one\n\n---\n\ntwo");
        assert_eq!(build_context(&[]), NO_CONTEXT);
    }

    #[test]
    fn test_echo_short_context() {
        let echo = ContextEcho::new(800);
        let text = echo.answer(1, "Cats are mammals.");
        assert_eq!(
            text,
            "Based on the uploaded document (1 relevant chunk(s)):\n\nThe relevant text says:\n\nCats are mammals."
        );
    }

    #[test]
    fn test_echo_truncates_long_context() {
        let echo = ContextEcho::new(5);
        let text = echo.answer(2, "abcdefghij");
        assert!(text.ends_with("abcde..."));
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("héllo", 5), ("héllo", false));
    }

    #[test]
    fn test_answer_source_serialization() {
        let source = AnswerSource::Fallback {
            reason: "offline".to_string(),
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "fallback", "reason": "offline"}));
    }
}
