// ragcore/src/embeddings/sparse.rs
//
// Sparse strategy: TF-IDF over the ingested corpus.
//
// Tokens are lowercase Unicode words of at least two characters. The
// vocabulary is sorted so component order does not depend on ingestion
// order. idf(t) = ln((1 + n) / (1 + df(t))) + 1.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use super::{l2_normalize, Vectorizer};
use crate::error::EmbedError;
use crate::rag::Vector;

/// Lowercased word tokens with at least two characters
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= 2)
        .collect()
}

/// Smoothed inverse document frequency
#[inline]
pub fn smoothed_idf(total_documents: usize, doc_frequency: usize) -> f32 {
    ((1.0 + total_documents as f32) / (1.0 + doc_frequency as f32)).ln() + 1.0
}

/// Corpus-fitted TF-IDF vectorizer
#[derive(Debug, Default)]
pub struct TfIdfVectorizer {
    /// term -> component index
    vocabulary: HashMap<String, usize>,
    /// idf per component
    idf: Vec<f32>,
    fitted: bool,
}

impl TfIdfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Component index of a term, if it was seen during `fit`
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    fn embed_text(&self, text: &str) -> Vector {
        let mut vector = vec![0.0f32; self.idf.len()];
        for token in tokenize(text) {
            if let Some(&i) = self.vocabulary.get(&token) {
                vector[i] += 1.0;
            }
        }
        for (value, idf) in vector.iter_mut().zip(&self.idf) {
            *value *= idf;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl Vectorizer for TfIdfVectorizer {
    fn name(&self) -> &'static str {
        "tfidf"
    }

    fn requires_fit(&self) -> bool {
        true
    }

    fn fit(&mut self, corpus: &[String]) -> Result<(), EmbedError> {
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        for doc in corpus {
            let mut terms = tokenize(doc);
            terms.sort_unstable();
            terms.dedup();
            for term in terms {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n = corpus.len();
        self.vocabulary = doc_freq
            .keys()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
        self.idf = doc_freq.values().map(|&df| smoothed_idf(n, df)).collect();
        self.fitted = true;

        debug!(documents = n, vocabulary = self.idf.len(), "tf-idf fitted");
        Ok(())
    }

    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vector>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if !self.fitted {
            return Err(EmbedError::NotFitted);
        }
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn embed_one(&self, text: &str) -> Result<Vector, EmbedError> {
        if !self.fitted {
            return Err(EmbedError::NotFitted);
        }
        Ok(self.embed_text(text))
    }

    fn dimensions(&self) -> Option<usize> {
        self.fitted.then(|| self.idf.len())
    }

    fn reset(&mut self) {
        self.vocabulary.clear();
        self.idf.clear();
        self.fitted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::cosine_similarity;

    fn corpus(docs: &[&str]) -> Vec<String> {
        docs.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("Hello World! This is a test.");
        assert_eq!(tokens, vec!["hello", "world", "this", "is", "test"]);
    }

    #[test]
    fn test_smoothed_idf() {
        // Term in every document keeps weight 1
        assert!((smoothed_idf(4, 4) - 1.0).abs() < 1e-6);
        // Rare terms weigh more
        assert!(smoothed_idf(4, 1) > smoothed_idf(4, 2));
    }

    #[test]
    fn test_vocabulary_sorted() {
        let mut v = TfIdfVectorizer::new();
        v.fit(&corpus(&["zebra apple", "mango"])).unwrap();
        assert_eq!(v.dimensions(), Some(3));
        assert_eq!(v.term_index("apple"), Some(0));
        assert_eq!(v.term_index("mango"), Some(1));
        assert_eq!(v.term_index("zebra"), Some(2));
    }

    #[test]
    fn test_embed_before_fit() {
        let v = TfIdfVectorizer::new();
        assert_eq!(v.dimensions(), None);
        assert!(matches!(v.embed_one("query"), Err(EmbedError::NotFitted)));
        assert!(matches!(
            v.embed_many(&corpus(&["query"])),
            Err(EmbedError::NotFitted)
        ));
        assert!(v.embed_many(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_terms_contribute_nothing() {
        let mut v = TfIdfVectorizer::new();
        v.fit(&corpus(&["cats are mammals", "rockets burn fuel"])).unwrap();
        let q = v.embed_one("quantum chromodynamics").unwrap();
        assert_eq!(q.len(), 6);
        assert!(q.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_vectors_are_normalized() {
        let mut v = TfIdfVectorizer::new();
        v.fit(&corpus(&["cats are mammals", "dogs are mammals too"])).unwrap();
        let e = v.embed_one("cats cats mammals").unwrap();
        let norm: f32 = e.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_query_matches_relevant_document() {
        let docs = corpus(&[
            "Apples are a fruit rich in fiber.",
            "Rocket engines burn propellant to produce thrust.",
        ]);
        let mut v = TfIdfVectorizer::new();
        v.fit(&docs).unwrap();
        let vectors = v.embed_many(&docs).unwrap();
        let q = v.embed_one("how do rocket engines work").unwrap();
        assert!(cosine_similarity(&q, &vectors[1]) > cosine_similarity(&q, &vectors[0]));
    }

    #[test]
    fn test_reset_forgets_vocabulary() {
        let mut v = TfIdfVectorizer::new();
        v.fit(&corpus(&["alpha beta"])).unwrap();
        v.reset();
        assert!(!v.is_fitted());
        assert_eq!(v.vocabulary_size(), 0);
        assert_eq!(v.term_index("alpha"), None);
    }

    #[test]
    fn test_refit_replaces_vocabulary() {
        let mut v = TfIdfVectorizer::new();
        v.fit(&corpus(&["alpha beta gamma"])).unwrap();
        v.fit(&corpus(&["delta"])).unwrap();
        assert_eq!(v.dimensions(), Some(1));
        assert_eq!(v.term_index("alpha"), None);
    }
}
