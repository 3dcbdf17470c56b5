//! Exhaustive cosine-similarity index.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::error::Result;
use crate::types::{IndexEntry, SearchResult};

use super::{IndexKind, VectorIndex, check_entries, check_query, cosine_similarity};

/// Exact index that scores every entry in parallel.
///
/// Equal scores are ordered by insertion position, so results are identical across
/// runs and across a save/load cycle.
///
/// # Example
///
/// ```rust
/// use nyaya_rag::index::{FlatIndex, VectorIndex};
/// use nyaya_rag::{Chunk, IndexEntry};
///
/// let index = FlatIndex::build(2, vec![
///     IndexEntry::new(Chunk::new("ipc", 0, 0, "murder"), vec![1.0, 0.0]),
///     IndexEntry::new(Chunk::new("ipc", 1, 10, "theft"), vec![0.0, 1.0]),
/// ]).unwrap();
/// let results = index.search(&[0.9, 0.1], 1, -1.0).unwrap();
/// assert_eq!(results[0].chunk.text, "murder");
/// ```
#[derive(Debug)]
pub struct FlatIndex {
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl FlatIndex {
    /// Builds an index over `entries`.
    ///
    /// # Errors
    /// Returns [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch) if any
    /// embedding is not `dimension` wide.
    pub fn build(dimension: usize, entries: Vec<IndexEntry>) -> Result<Self> {
        check_entries(dimension, &entries)?;
        Ok(Self { dimension, entries })
    }
}

impl VectorIndex for FlatIndex {
    fn search(&self, query: &[f32], top_k: usize, threshold: f32) -> Result<Vec<SearchResult>> {
        check_query(self.dimension, query, top_k)?;

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .par_iter()
            .enumerate()
            .map(|(position, entry)| (position, cosine_similarity(&entry.embedding, query)))
            .filter(|&(_, score)| score >= threshold)
            .collect();

        scored.par_sort_unstable_by_key(|&(position, score)| (Reverse(OrderedFloat(score)), position));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchResult {
                chunk: self.entries[position].chunk.clone(),
                score,
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    fn kind(&self) -> IndexKind {
        IndexKind::Flat
    }
}
