//! HNSW-based vector index using instant-distance.

use std::cmp::Reverse;

use instant_distance::{Builder, HnswMap, Point, Search};
use ordered_float::OrderedFloat;

use crate::error::Result;
use crate::types::{IndexEntry, SearchResult};

use super::{IndexKind, VectorIndex, check_entries, check_query, cosine_similarity};

/// Graph construction seed. Fixed so the same entries always build the same graph.
const BUILD_SEED: u64 = 0x6e79_6179_61;

#[derive(Clone, Debug)]
struct EmbeddingPoint {
    embedding: Vec<f32>,
}

impl Point for EmbeddingPoint {
    fn distance(&self, other: &Self) -> f32 {
        1.0 - cosine_similarity(&self.embedding, &other.embedding)
    }
}

/// Approximate nearest-neighbour index.
///
/// Search cost grows roughly logarithmically with corpus size, but results may omit a
/// true nearest neighbour. Use [`FlatIndex`](super::FlatIndex) when exact top-k matters.
pub struct HnswIndex {
    dimension: usize,
    entries: Vec<IndexEntry>,
    graph: Option<HnswMap<EmbeddingPoint, usize>>,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("dimension", &self.dimension)
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl HnswIndex {
    /// Builds the graph over `entries`.
    ///
    /// # Errors
    /// Returns [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch) if any
    /// embedding is not `dimension` wide.
    pub fn build(dimension: usize, entries: Vec<IndexEntry>) -> Result<Self> {
        check_entries(dimension, &entries)?;

        let graph = if entries.is_empty() {
            None
        } else {
            let points: Vec<EmbeddingPoint> = entries
                .iter()
                .map(|entry| EmbeddingPoint {
                    embedding: entry.embedding.clone(),
                })
                .collect();
            let positions: Vec<usize> = (0..entries.len()).collect();
            Some(Builder::default().seed(BUILD_SEED).build(points, positions))
        };

        Ok(Self {
            dimension,
            entries,
            graph,
        })
    }
}

impl VectorIndex for HnswIndex {
    fn search(&self, query: &[f32], top_k: usize, threshold: f32) -> Result<Vec<SearchResult>> {
        check_query(self.dimension, query, top_k)?;

        let Some(graph) = &self.graph else {
            return Ok(Vec::new());
        };

        let query_point = EmbeddingPoint {
            embedding: query.to_vec(),
        };
        let mut search = Search::default();

        let mut hits: Vec<(usize, f32)> = graph
            .search(&query_point, &mut search)
            .take(top_k)
            .map(|candidate| (*candidate.value, 1.0 - candidate.distance))
            .filter(|&(_, score)| score >= threshold)
            .collect();
        hits.sort_by_key(|&(position, score)| (Reverse(OrderedFloat(score)), position));

        Ok(hits
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
        IndexKind::Hnsw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;
    use crate::index::tests::entry;

    #[test]
    fn finds_nearest_in_small_index() {
        let index = HnswIndex::build(
            4,
            vec![
                entry(0, vec![1.0, 0.0, 0.0, 0.0]),
                entry(1, vec![0.0, 1.0, 0.0, 0.0]),
            ],
        )
        .unwrap();

        let results = index.search(&[1.0, 0.0, 0.0, 0.0], 1, -1.0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.index, 0);
    }

    #[test]
    fn threshold_filtering() {
        let index = HnswIndex::build(
            4,
            vec![
                entry(0, vec![1.0, 0.0, 0.0, 0.0]),
                entry(1, vec![0.0, 1.0, 0.0, 0.0]),
            ],
        )
        .unwrap();

        let results = index.search(&[1.0, 0.0, 0.0, 0.0], 10, 0.9).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.index, 0);
    }

    #[test]
    fn results_are_sorted_and_bounded() {
        let entries: Vec<IndexEntry> = (0..40)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let angle = i as f32 * 0.15;
                entry(i, vec![angle.cos(), angle.sin()])
            })
            .collect();
        let index = HnswIndex::build(2, entries).unwrap();
        let results = index.search(&[1.0, 0.0], 5, -1.0).unwrap();

        assert!(results.len() <= 5);
        assert!(!results.is_empty());
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn empty_index_still_validates_query() {
        let index = HnswIndex::build(3, Vec::new()).unwrap();
        assert!(index.search(&[1.0, 0.0, 0.0], 3, -1.0).unwrap().is_empty());
        assert!(matches!(
            index.search(&[1.0], 3, -1.0),
            Err(RagError::DimensionMismatch { .. })
        ));
    }
}
