//! Vector index implementations for RAG.
//!
//! Indexes are built once from a complete set of entries and never mutated afterwards;
//! a rebuilt corpus produces a new index that replaces the old one wholesale.
//!
//! - [`FlatIndex`] scores every entry (exact, deterministic). The default.
//! - [`HnswIndex`] searches an HNSW graph (approximate: it may miss true nearest
//!   neighbours, in exchange for sub-linear query time on large corpora).

mod flat;
mod hnsw;

pub use flat::FlatIndex;
pub use hnsw::HnswIndex;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::types::{Chunk, IndexEntry, SearchResult};

/// Search structure to build over the embeddings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Exhaustive cosine scan.
    #[default]
    Flat,
    /// Approximate HNSW graph.
    Hnsw,
}

impl IndexKind {
    /// Builds an index of this kind.
    ///
    /// # Errors
    /// Returns [`RagError::DimensionMismatch`] if any embedding is not `dimension` wide.
    pub fn build(self, dimension: usize, entries: Vec<IndexEntry>) -> Result<Box<dyn VectorIndex>> {
        Ok(match self {
            Self::Flat => Box::new(FlatIndex::build(dimension, entries)?),
            Self::Hnsw => Box::new(HnswIndex::build(dimension, entries)?),
        })
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Hnsw => "hnsw",
        }
    }
}

/// Trait for read-only vector indexes.
pub trait VectorIndex: Send + Sync + std::fmt::Debug {
    /// Searches for the most similar chunks to the query vector.
    ///
    /// Returns at most `top_k` results in non-increasing score order, dropping results
    /// scoring below `threshold`.
    ///
    /// # Errors
    /// [`RagError::InvalidConfig`] when `top_k` is zero,
    /// [`RagError::DimensionMismatch`] when the query width differs from the index.
    fn search(&self, query: &[f32], top_k: usize, threshold: f32) -> Result<Vec<SearchResult>>;

    /// Returns the embedding dimension.
    fn dimension(&self) -> usize;

    /// Returns all entries in insertion order.
    fn entries(&self) -> &[IndexEntry];

    /// Returns which structure this is.
    fn kind(&self) -> IndexKind;

    /// Returns the number of indexed chunks.
    fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns `true` if the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pairs chunks with their embeddings one-to-one.
///
/// # Errors
/// Returns [`RagError::LengthMismatch`] when the counts differ.
pub fn pair_entries(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Vec<IndexEntry>> {
    if chunks.len() != embeddings.len() {
        return Err(RagError::LengthMismatch {
            chunks: chunks.len(),
            embeddings: embeddings.len(),
        });
    }
    Ok(chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| IndexEntry::new(chunk, embedding))
        .collect())
}

/// Computes cosine similarity between two vectors.
///
/// Zero vectors have similarity `0.0` with everything.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (lhs, rhs) in a.iter().zip(b) {
        dot += lhs * rhs;
        norm_a += lhs * lhs;
        norm_b += rhs * rhs;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

fn check_entries(dimension: usize, entries: &[IndexEntry]) -> Result<()> {
    if dimension == 0 {
        return Err(RagError::InvalidConfig("index dimension must be at least 1".into()));
    }
    match entries.iter().find(|entry| entry.embedding.len() != dimension) {
        Some(entry) => Err(RagError::DimensionMismatch {
            expected: dimension,
            actual: entry.embedding.len(),
        }),
        None => Ok(()),
    }
}

fn check_query(dimension: usize, query: &[f32], top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(RagError::InvalidConfig("k must be at least 1".into()));
    }
    if query.len() != dimension {
        return Err(RagError::DimensionMismatch {
            expected: dimension,
            actual: query.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn entry(id: usize, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry::new(Chunk::new("doc", id, id * 10, format!("chunk {id}")), embedding)
    }

    #[test]
    fn pair_entries_requires_equal_lengths() {
        let chunks = vec![Chunk::new("d", 0, 0, "a"), Chunk::new("d", 1, 1, "b")];
        let result = pair_entries(chunks, vec![vec![1.0]]);
        assert!(matches!(
            result,
            Err(RagError::LengthMismatch {
                chunks: 2,
                embeddings: 1
            })
        ));
    }

    #[test]
    fn cosine_similarity_handles_zero_norms() {
        assert!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]).abs() < f32::EPSILON);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < f32::EPSILON);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn non_uniform_dimensions_fail_to_build() {
        for kind in [IndexKind::Flat, IndexKind::Hnsw] {
            let entries = vec![entry(0, vec![1.0, 0.0]), entry(1, vec![1.0, 0.0, 0.0])];
            let result = kind.build(2, entries);
            assert!(matches!(
                result,
                Err(RagError::DimensionMismatch {
                    expected: 2,
                    actual: 3
                })
            ));
        }
    }

    #[test]
    fn kinds_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&IndexKind::Hnsw).unwrap(), "\"hnsw\"");
        assert_eq!(IndexKind::Flat.as_str(), "flat");
    }
}
