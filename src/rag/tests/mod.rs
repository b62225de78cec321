mod concurrency_tests;

use crate::embeddings::{ModelError, SentenceEncoder};

/// Deterministic stand-in for a sentence model.
///
/// Each axis is a topic; a text's vector counts its topic keywords, plus a
/// small constant so no vector is zero.
pub(super) struct TopicEncoder;

const TOPICS: &[&[&str]] = &[
    &["apple", "apples", "fruit", "fruits", "nutrition", "vitamin", "vitamins", "fiber", "orchard", "banana"],
    &["rocket", "rockets", "engine", "engines", "thrust", "fuel", "launch", "orbit", "propellant"],
    &["cat", "cats", "dog", "dogs", "mammal", "mammals", "pet", "pets"],
];

impl SentenceEncoder for TopicEncoder {
    fn dimensions(&self) -> usize {
        TOPICS.len() + 1
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; TOPICS.len() + 1];
                for word in text.split(|c: char| !c.is_alphanumeric()) {
                    let word = word.to_lowercase();
                    for (axis, keywords) in TOPICS.iter().enumerate() {
                        if keywords.contains(&word.as_str()) {
                            v[axis] += 1.0;
                        }
                    }
                }
                v[TOPICS.len()] = 0.1;
                v
            })
            .collect())
    }
}
