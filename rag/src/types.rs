//! Core types for the RAG crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dedup::content_hash;

/// Key/value metadata attached to documents and chunks.
pub type Metadata = BTreeMap<String, String>;

/// A document to be chunked and indexed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier for the document, usually its file name.
    pub id: String,
    /// Raw text content. May be empty.
    pub text: String,
    /// Arbitrary metadata for citations.
    pub metadata: Metadata,
}

impl Document {
    /// Creates a new document with empty metadata.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Creates a new document with metadata.
    #[must_use]
    pub fn with_metadata(
        id: impl Into<String>,
        text: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }
}

/// A bounded slice of a document's text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier (format: `{doc_id}#chunk_{n}`).
    pub id: String,
    /// Text content of the chunk.
    pub text: String,
    /// Parent document ID.
    pub source_id: String,
    /// Position of this chunk within the document.
    pub index: usize,
    /// Character offset of the chunk's first character in the document text.
    pub start: usize,
    /// Metadata inherited from the document.
    pub metadata: Metadata,
    /// xxh3 hash of `text`.
    pub content_hash: u64,
}

impl Chunk {
    /// Creates the `index`-th chunk of `source_id`, deriving its id and content hash.
    #[must_use]
    pub fn new(
        source_id: impl Into<String>,
        index: usize,
        start: usize,
        text: impl Into<String>,
    ) -> Self {
        let source_id = source_id.into();
        let text = text.into();
        Self {
            id: format!("{source_id}#chunk_{index}"),
            content_hash: content_hash(&text),
            text,
            source_id,
            index,
            start,
            metadata: Metadata::new(),
        }
    }

    /// Replaces the chunk metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Length of the chunk in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A search result containing a chunk and its similarity score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is better).
    pub score: f32,
}

/// A chunk paired with its embedding vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The chunk.
    pub chunk: Chunk,
    /// The embedding vector.
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// Creates a new index entry.
    #[must_use]
    pub const fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { chunk, embedding }
    }
}
