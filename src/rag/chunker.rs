//! Passage Chunker
//!
//! Splits a document into bounded passages along paragraph and sentence
//! boundaries. Sizes are counted in characters (Unicode scalar values) and
//! include the separators that join packed pieces.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::config::{ChunkConfig, ChunkStrategy};

static PARAGRAPH_BREAK: OnceLock<Regex> = OnceLock::new();
static SENTENCE_END: OnceLock<Regex> = OnceLock::new();

fn paragraph_break() -> &'static Regex {
    PARAGRAPH_BREAK.get_or_init(|| Regex::new(r"\n\s*\n").expect("paragraph pattern"))
}

fn sentence_end() -> &'static Regex {
    SENTENCE_END.get_or_init(|| Regex::new(r"[.!?]\s+").expect("sentence pattern"))
}

/// A piece of source text produced by chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Trimmed, non-empty passage text
    pub text: String,
    /// Position within the chunking run
    pub index: usize,
}

/// Document chunker
#[derive(Debug, Clone)]
pub struct Chunker {
    max_size: usize,
    overlap: usize,
    strategy: ChunkStrategy,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::from_config(&ChunkConfig::default())
    }
}

impl Chunker {
    /// Paragraph-aware chunker with no overlap
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            overlap: 0,
            strategy: ChunkStrategy::Paragraph,
        }
    }

    pub fn from_config(config: &ChunkConfig) -> Self {
        Self {
            max_size: config.max_size,
            overlap: config.overlap,
            strategy: config.strategy,
        }
    }

    /// Builder: carry up to `overlap` trailing characters of each passage
    /// into the next one. Passages may then exceed `max_size`.
    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Chunk a document. Empty or whitespace-only input yields no passages.
    pub fn chunk(&self, text: &str) -> Vec<Passage> {
        let mut pieces = match self.strategy {
            ChunkStrategy::Paragraph => self.pack_paragraphs(text),
            ChunkStrategy::Words { words_per_chunk } => pack_words(text, words_per_chunk),
        };

        if self.overlap > 0 && pieces.len() > 1 {
            pieces = self.apply_overlap(pieces);
        }

        pieces
            .into_iter()
            .enumerate()
            .map(|(index, text)| Passage { text, index })
            .collect()
    }

    fn pack_paragraphs(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let mut passages = Vec::new();
        let mut buffer = Packer::new("\n\n");

        for paragraph in paragraph_break().split(trimmed) {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            let len = char_len(paragraph);

            if !buffer.is_empty() && buffer.len_with(len) > self.max_size {
                passages.push(buffer.take());
            }

            if len > self.max_size {
                // Buffer was flushed above; pack sentences on their own
                let mut sentences = Packer::new(" ");
                for sentence in split_sentences(paragraph) {
                    let sentence_len = char_len(sentence);
                    if !sentences.is_empty() && sentences.len_with(sentence_len) > self.max_size {
                        passages.push(sentences.take());
                    }
                    sentences.push(sentence, sentence_len);
                }
                if !sentences.is_empty() {
                    let len = sentences.chars;
                    buffer.push(&sentences.take(), len);
                }
                continue;
            }

            buffer.push(paragraph, len);
        }

        if !buffer.is_empty() {
            passages.push(buffer.take());
        }

        if passages.is_empty() {
            passages.push(trimmed.to_string());
        }

        passages
    }

    /// Prefix each passage with the tail of its predecessor
    fn apply_overlap(&self, pieces: Vec<String>) -> Vec<String> {
        let mut out = Vec::with_capacity(pieces.len());
        for (i, piece) in pieces.iter().enumerate() {
            if i == 0 {
                out.push(piece.clone());
                continue;
            }
            let tail = overlap_tail(&pieces[i - 1], self.overlap);
            if tail.is_empty() {
                out.push(piece.clone());
            } else {
                out.push(format!("{} {}", tail, piece));
            }
        }
        out
    }
}

/// Accumulates pieces joined by a separator, tracking the joined length
struct Packer {
    text: String,
    chars: usize,
    separator: &'static str,
}

impl Packer {
    fn new(separator: &'static str) -> Self {
        Self {
            text: String::new(),
            chars: 0,
            separator,
        }
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Joined length if a piece of `len` characters were appended
    fn len_with(&self, len: usize) -> usize {
        if self.is_empty() {
            len
        } else {
            self.chars + char_len(self.separator) + len
        }
    }

    fn push(&mut self, piece: &str, len: usize) {
        self.chars = self.len_with(len);
        if !self.text.is_empty() {
            self.text.push_str(self.separator);
        }
        self.text.push_str(piece);
    }

    fn take(&mut self) -> String {
        self.chars = 0;
        std::mem::take(&mut self.text)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split on `.`, `!` or `?` followed by whitespace, keeping the punctuation
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in sentence_end().find_iter(paragraph) {
        // Punctuation is a single byte
        let end = m.start() + 1;
        sentences.push(&paragraph[start..end]);
        start = m.end();
    }
    if start < paragraph.len() {
        sentences.push(&paragraph[start..]);
    }
    sentences
}

fn pack_words(text: &str, words_per_chunk: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(words_per_chunk.max(1))
        .map(|group| group.join(" "))
        .collect()
}

/// Last `overlap` characters of `text`, moved forward to a word start
fn overlap_tail(text: &str, overlap: usize) -> &str {
    let total = char_len(text);
    if overlap >= total {
        return text;
    }
    let start = text
        .char_indices()
        .nth(total - overlap)
        .map(|(i, _)| i)
        .unwrap_or(text.len());

    let mid_word = text[..start]
        .chars()
        .next_back()
        .map_or(false, |c| !c.is_whitespace());
    let tail = &text[start..];
    if !mid_word {
        return tail.trim();
    }
    match tail.find(char::is_whitespace) {
        Some(offset) => tail[offset..].trim(),
        None => "",
    }
}
