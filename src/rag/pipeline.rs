//! RAG Pipeline Orchestrator
//!
//! Ingestion: chunk -> embed -> store. Query: embed -> rank.
//!
//! The vectorizer and the store live together behind one `RwLock`. Writers
//! (ingest, replace, clear) hold the write lock for the whole mutation, so
//! a query never sees a store that disagrees with the fitted vectorizer,
//! and at most one writer runs at a time.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::answer::{build_context, Answer, AnswerGenerator, AnswerSource, ContextEcho};
use super::chunker::{Chunker, Passage};
use super::rank::{rank, ScoredPassage};
use super::store::{StoreEntry, Vector, VectorStore};
use crate::config::RagConfig;
use crate::embeddings::{DenseVectorizer, SentenceEncoder, TfIdfVectorizer, Vectorizer};
use crate::error::{EmbedError, GenerationError, RagError, Result};

/// Index statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub passages: usize,
    pub dimensions: Option<usize>,
    pub strategy: String,
}

/// Vectorizer and store, always mutated together. Failed mutations leave
/// both as they were.
struct Index {
    vectorizer: Box<dyn Vectorizer>,
    store: VectorStore,
}

impl Index {
    fn clear(&mut self) {
        self.store.clear();
        self.vectorizer.reset();
    }

    fn append(&mut self, passages: Vec<Passage>) -> Result<usize> {
        let added = passages.len();

        if !self.vectorizer.requires_fit() {
            let vectors = self.vectorizer.embed_many(&texts_of(&passages))?;
            self.store.add(pair(passages, vectors)?)?;
            return Ok(added);
        }

        // Corpus-relative vectors: refit on everything and re-embed
        let mut corpus: Vec<Passage> = self.store.passages().cloned().collect();
        corpus.extend(passages);
        self.rebuild(corpus)?;
        Ok(added)
    }

    fn replace(&mut self, passages: Vec<Passage>) -> Result<usize> {
        let added = passages.len();

        if !self.vectorizer.requires_fit() {
            let vectors = self.vectorizer.embed_many(&texts_of(&passages))?;
            let mut store = VectorStore::new();
            store.add(pair(passages, vectors)?)?;
            self.store = store;
            return Ok(added);
        }

        self.rebuild(passages)?;
        Ok(added)
    }

    /// Refit on `corpus` and swap in its store
    fn rebuild(&mut self, corpus: Vec<Passage>) -> Result<()> {
        match self.fit_store(corpus) {
            Ok(store) => {
                self.store = store;
                Ok(())
            }
            Err(e) => {
                self.restore_fit();
                Err(e)
            }
        }
    }

    fn fit_store(&mut self, corpus: Vec<Passage>) -> Result<VectorStore> {
        let texts = texts_of(&corpus);
        self.vectorizer.fit(&texts)?;
        let vectors = self.vectorizer.embed_many(&texts)?;

        let mut store = VectorStore::new();
        store.add(pair(corpus, vectors)?)?;
        Ok(store)
    }

    /// Refit the vectorizer on the current store after a failed rebuild.
    /// Fitting is deterministic, so this restores the previous state.
    fn restore_fit(&mut self) {
        if self.store.is_empty() {
            self.vectorizer.reset();
            return;
        }
        let texts: Vec<String> = self.store.passages().map(|p| p.text.clone()).collect();
        match self.vectorizer.fit(&texts) {
            Ok(()) => warn!(kept = self.store.len(), "refit failed, previous collection kept"),
            Err(e) => {
                warn!(error = %e, "vectorizer could not be restored, index cleared");
                self.clear();
            }
        }
    }
}

fn texts_of(passages: &[Passage]) -> Vec<String> {
    passages.iter().map(|p| p.text.clone()).collect()
}

fn pair(passages: Vec<Passage>, vectors: Vec<Vector>) -> Result<Vec<StoreEntry>> {
    if passages.len() != vectors.len() {
        return Err(EmbedError::CountMismatch {
            expected: passages.len(),
            actual: vectors.len(),
        }
        .into());
    }
    Ok(passages
        .into_iter()
        .zip(vectors)
        .map(|(passage, vector)| StoreEntry::new(passage, vector))
        .collect())
}

/// Retrieval pipeline over a single in-memory collection
pub struct RagEngine {
    config: RagConfig,
    chunker: Chunker,
    index: RwLock<Index>,
    generator: Option<Box<dyn AnswerGenerator>>,
}

impl RagEngine {
    /// Engine with default configuration
    pub fn new(vectorizer: impl Vectorizer + 'static) -> Self {
        Self::build(vectorizer, RagConfig::default())
    }

    /// Engine with a validated configuration
    pub fn with_config(vectorizer: impl Vectorizer + 'static, config: RagConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(vectorizer, config))
    }

    /// TF-IDF engine
    pub fn sparse(config: RagConfig) -> Result<Self> {
        Self::with_config(TfIdfVectorizer::new(), config)
    }

    /// Sentence-encoder engine
    pub fn dense<E: SentenceEncoder + 'static>(encoder: E, config: RagConfig) -> Result<Self> {
        let vectorizer = DenseVectorizer::new(encoder).with_batch_size(config.batch_size);
        Self::with_config(vectorizer, config)
    }

    fn build(vectorizer: impl Vectorizer + 'static, config: RagConfig) -> Self {
        Self {
            chunker: Chunker::from_config(&config.chunk),
            config,
            index: RwLock::new(Index {
                vectorizer: Box::new(vectorizer),
                store: VectorStore::new(),
            }),
            generator: None,
        }
    }

    /// Builder: attach the external answer generator
    pub fn with_generator(mut self, generator: impl AnswerGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Chunk, embed and append a document. Returns passages added. On
    /// failure the collection is unchanged.
    pub fn ingest(&self, raw_text: &str) -> Result<usize> {
        let passages = self.chunk_document(raw_text)?;
        let mut index = self.index.write();
        let added = index.append(passages)?;
        info!(
            added,
            total = index.store.len(),
            strategy = index.vectorizer.name(),
            "document ingested"
        );
        Ok(added)
    }

    /// Discard the current collection and ingest `raw_text` in its place,
    /// as one atomic step. On failure the previous collection is kept.
    pub fn replace(&self, raw_text: &str) -> Result<usize> {
        let passages = self.chunk_document(raw_text)?;
        let mut index = self.index.write();
        let added = index.replace(passages)?;
        info!(added, strategy = index.vectorizer.name(), "collection replaced");
        Ok(added)
    }

    /// Drop all passages and any fitted vectorizer state
    pub fn clear(&self) {
        let mut index = self.index.write();
        let dropped = index.store.len();
        index.clear();
        info!(dropped, "index cleared");
    }

    /// Top `top_k` passages for `question`, best first
    pub fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<String>> {
        Ok(self
            .retrieve_scored(question, top_k)?
            .into_iter()
            .map(|s| s.passage.text)
            .collect())
    }

    /// Like `retrieve`, keeping scores and passage metadata
    pub fn retrieve_scored(&self, question: &str, top_k: usize) -> Result<Vec<ScoredPassage>> {
        let index = self.index.read();
        if index.store.is_empty() {
            return Ok(Vec::new());
        }

        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::EmptyInput("question"));
        }

        let query = index.vectorizer.embed_one(question)?;
        let ranked = rank(&query, index.store.all(), top_k)?;
        debug!(top_k, returned = ranked.len(), "passages ranked");
        Ok(ranked)
    }

    /// Answer from ranked passages. Generator failures fall back to
    /// `ContextEcho` and are reported in `Answer::source`.
    pub fn synthesize_answer(&self, question: &str, passages: &[String]) -> Answer {
        let context = build_context(passages);

        let generated = match &self.generator {
            Some(generator) => generator.generate(question, passages).and_then(|text| {
                if text.trim().is_empty() {
                    Err(GenerationError::EmptyAnswer)
                } else {
                    Ok(text)
                }
            }),
            None => Err(GenerationError::Unavailable("no generator configured".to_string())),
        };

        match generated {
            Ok(text) => Answer {
                text,
                context,
                source: AnswerSource::Generated,
            },
            Err(reason) => {
                if self.generator.is_some() {
                    warn!(error = %reason, "answer generation failed, echoing context");
                }
                Answer {
                    text: ContextEcho::new(self.config.fallback_chars).answer(passages.len(), &context),
                    context,
                    source: AnswerSource::Fallback {
                        reason: reason.to_string(),
                    },
                }
            }
        }
    }

    /// Retrieve the configured `top_k` passages and answer from them
    pub fn ask(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::EmptyInput("question"));
        }
        let passages = self.retrieve(question, self.config.top_k)?;
        Ok(self.synthesize_answer(question, &passages))
    }

    pub fn stats(&self) -> EngineStats {
        let index = self.index.read();
        EngineStats {
            passages: index.store.len(),
            dimensions: index.store.dimensions(),
            strategy: index.vectorizer.name().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().store.is_empty()
    }

    /// Swap the vectorizer. The collection is cleared since stored vectors
    /// belong to the old vector space.
    pub fn set_vectorizer(&self, vectorizer: impl Vectorizer + 'static) {
        let mut index = self.index.write();
        index.store.clear();
        index.vectorizer = Box::new(vectorizer);
        info!(strategy = index.vectorizer.name(), "vectorizer replaced");
    }

    fn chunk_document(&self, raw_text: &str) -> Result<Vec<Passage>> {
        if raw_text.trim().is_empty() {
            return Err(RagError::EmptyInput("document"));
        }
        let passages = self.chunker.chunk(raw_text);
        if passages.is_empty() {
            return Err(RagError::EmptyInput("document"));
        }
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_count_mismatch() {
        let passages = vec![Passage {
            text: "a".to_string(),
            index: 0,
        }];
        let result = pair(passages, Vec::new());
        assert!(matches!(
            result,
            Err(RagError::Embedding(EmbedError::CountMismatch { expected: 1, actual: 0 }))
        ));
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RagEngine>();
    }

    #[test]
    fn test_with_config_validates() {
        let config = RagConfig::default().with_max_size(0);
        assert!(matches!(
            RagEngine::with_config(TfIdfVectorizer::new(), config),
            Err(RagError::Config(_))
        ));
    }
}
