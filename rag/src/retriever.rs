//! Query-time retrieval: embed the question, search the index.

use std::sync::Arc;

use nyaya_core::EmbeddingModel;

use crate::error::{RagError, Result};
use crate::knowledge::KnowledgeIndex;
use crate::types::SearchResult;

/// Ranked chunks returned for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    /// Matches in non-increasing score order.
    pub results: Vec<SearchResult>,
}

impl RetrievalResult {
    /// A result with no matches.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            results: Vec::new(),
        }
    }

    /// Returns `true` if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Chunk texts in rank order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|result| result.chunk.text.as_str())
    }

    /// Chunk texts joined by single spaces, the form handed to the language model.
    #[must_use]
    pub fn context(&self) -> String {
        self.texts().collect::<Vec<_>>().join(" ")
    }
}

/// Embeds queries with `M` and searches a shared [`KnowledgeIndex`].
///
/// A retriever without an index answers every query with an empty result, so callers
/// can degrade to ungrounded answers instead of failing.
pub struct Retriever<M> {
    embedder: Arc<M>,
    index: Option<Arc<KnowledgeIndex>>,
    threshold: f32,
}

impl<M> Clone for Retriever<M> {
    fn clone(&self) -> Self {
        Self {
            embedder: Arc::clone(&self.embedder),
            index: self.index.clone(),
            threshold: self.threshold,
        }
    }
}

impl<M> std::fmt::Debug for Retriever<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("chunks", &self.index.as_ref().map(|index| index.len()))
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl<M: EmbeddingModel> Retriever<M> {
    /// Creates a retriever over `index`, keeping every score.
    #[must_use]
    pub const fn new(embedder: Arc<M>, index: Option<Arc<KnowledgeIndex>>) -> Self {
        Self {
            embedder,
            index,
            threshold: -1.0,
        }
    }

    /// Drops matches scoring below `threshold`.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// The index being searched, if any.
    #[must_use]
    pub const fn index(&self) -> Option<&Arc<KnowledgeIndex>> {
        self.index.as_ref()
    }

    /// Returns up to `top_k` chunks most similar to `query`.
    ///
    /// The embedder is not called when there is nothing to search.
    ///
    /// # Errors
    /// [`RagError::InvalidConfig`] for `top_k == 0`, [`RagError::Embedding`] when the
    /// provider fails, [`RagError::DimensionMismatch`] when it returns a vector of the
    /// wrong width.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<RetrievalResult> {
        if top_k == 0 {
            return Err(RagError::InvalidConfig("k must be at least 1".into()));
        }
        let Some(index) = self.index.as_ref().filter(|index| !index.is_empty()) else {
            tracing::debug!("no index loaded, returning empty retrieval");
            return Ok(RetrievalResult::empty());
        };

        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(RagError::Embedding)?;
        let results = index.search(&vector, top_k, self.threshold)?;
        tracing::debug!(k = top_k, hits = results.len(), "retrieved chunks");
        Ok(RetrievalResult { results })
    }
}
