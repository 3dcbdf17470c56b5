//! Configuration for indexing and retrieval.

use serde::{Deserialize, Serialize};

use crate::chunking::FixedSizeChunker;
use crate::error::{RagError, Result};
use crate::index::IndexKind;

/// Configuration shared by the indexer and the retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Prefer paragraph, sentence and word boundaries when cutting chunks.
    pub preserve_boundaries: bool,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Minimum cosine similarity for search results. `-1.0` keeps everything.
    pub similarity_threshold: f32,
    /// Drop chunks whose text was already indexed.
    pub deduplication: bool,
    /// Normalize extracted text before chunking.
    pub clean_text: bool,
    /// Search structure built over the embeddings.
    pub index_kind: IndexKind,
    /// Texts sent to the embedding provider per request.
    pub embedding_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 20,
            preserve_boundaries: true,
            top_k: 4,
            similarity_threshold: -1.0,
            deduplication: true,
            clean_text: true,
            index_kind: IndexKind::Flat,
            embedding_batch_size: 32,
        }
    }
}

impl RagConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for custom configuration.
    #[must_use]
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::new()
    }

    /// Checks every parameter is in range.
    ///
    /// # Errors
    /// Returns [`RagError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::InvalidConfig("chunk_size must be at least 1".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::InvalidConfig(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::InvalidConfig("top_k must be at least 1".into()));
        }
        if self.embedding_batch_size == 0 {
            return Err(RagError::InvalidConfig(
                "embedding_batch_size must be at least 1".into(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(RagError::InvalidConfig(format!(
                "similarity_threshold ({}) must lie in [-1, 1]",
                self.similarity_threshold
            )));
        }
        Ok(())
    }

    /// Builds the chunker these settings describe.
    ///
    /// # Errors
    /// Returns [`RagError::InvalidConfig`] for an unusable size/overlap pair.
    pub fn chunker(&self) -> Result<FixedSizeChunker> {
        let chunker = FixedSizeChunker::new(self.chunk_size, self.chunk_overlap)?;
        Ok(if self.preserve_boundaries {
            chunker
        } else {
            chunker.hard_cuts()
        })
    }
}

/// Builder for [`RagConfig`].
#[derive(Debug, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Creates a new configuration builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RagConfig::default(),
        }
    }

    /// Sets the maximum chunk length in characters.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Sets the overlap between consecutive chunks.
    #[must_use]
    pub const fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Enables or disables boundary-aware cuts.
    #[must_use]
    pub const fn preserve_boundaries(mut self, enabled: bool) -> Self {
        self.config.preserve_boundaries = enabled;
        self
    }

    /// Sets the number of results to retrieve.
    #[must_use]
    pub const fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Sets the minimum similarity threshold for search results.
    #[must_use]
    pub const fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Enables or disables content deduplication.
    #[must_use]
    pub const fn deduplication(mut self, enabled: bool) -> Self {
        self.config.deduplication = enabled;
        self
    }

    /// Enables or disables text cleaning before chunking.
    #[must_use]
    pub const fn clean_text(mut self, enabled: bool) -> Self {
        self.config.clean_text = enabled;
        self
    }

    /// Selects the search structure.
    #[must_use]
    pub const fn index_kind(mut self, kind: IndexKind) -> Self {
        self.config.index_kind = kind;
        self
    }

    /// Sets how many texts are embedded per provider call.
    #[must_use]
    pub const fn embedding_batch_size(mut self, size: usize) -> Self {
        self.config.embedding_batch_size = size;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> RagConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::float_cmp)]
    fn default_config() {
        let config = RagConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 20);
        assert_eq!(config.top_k, 4);
        assert_eq!(config.similarity_threshold, -1.0);
        assert_eq!(config.index_kind, IndexKind::Flat);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn builder_config() {
        let config = RagConfig::builder()
            .chunk_size(500)
            .chunk_overlap(50)
            .top_k(8)
            .similarity_threshold(0.5)
            .deduplication(false)
            .index_kind(IndexKind::Hnsw)
            .build();

        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.top_k, 8);
        assert_eq!(config.similarity_threshold, 0.5);
        assert!(!config.deduplication);
        assert_eq!(config.index_kind, IndexKind::Hnsw);
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let config = RagConfig::builder().chunk_size(20).chunk_overlap(20).build();
        assert!(matches!(config.validate(), Err(RagError::InvalidConfig(_))));
        assert!(matches!(config.chunker(), Err(RagError::InvalidConfig(_))));
    }

    #[test]
    fn zero_k_is_rejected() {
        let config = RagConfig::builder().top_k(0).build();
        assert!(matches!(config.validate(), Err(RagError::InvalidConfig(_))));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RagConfig = serde_json::from_str(r#"{"chunk_size": 800}"#).unwrap();
        assert_eq!(config.chunk_size, 800);
        assert_eq!(config.chunk_overlap, 20);
    }
}
