//! A built index together with the manifest describing it.

use std::path::Path;

use nyaya_core::{EmbeddingIdentity, EmbeddingModel};

use crate::error::Result;
use crate::index::{IndexKind, VectorIndex};
use crate::persistence::{ChunkingParams, IndexManifest, Persistence, RkyvPersistence};
use crate::types::{IndexEntry, SearchResult};

/// The immutable unit shared between ingestion and querying.
///
/// A `KnowledgeIndex` is never modified after construction. Re-ingesting a corpus
/// builds a new one, and holders swap their `Arc` to it.
#[derive(Debug)]
pub struct KnowledgeIndex {
    manifest: IndexManifest,
    index: Box<dyn VectorIndex>,
}

impl KnowledgeIndex {
    /// Builds a fresh index over `entries` and describes it.
    ///
    /// # Errors
    /// Returns [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch) when an
    /// entry is not `embedding.dimension` wide.
    pub fn build(
        embedding: EmbeddingIdentity,
        kind: IndexKind,
        chunking: ChunkingParams,
        documents: usize,
        entries: Vec<IndexEntry>,
    ) -> Result<Self> {
        let manifest = IndexManifest::describe(embedding, kind, chunking, documents, &entries);
        Self::from_parts(manifest, entries)
    }

    /// Rebuilds the search structure recorded in `manifest` over `entries`.
    ///
    /// # Errors
    /// Returns [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch) when the
    /// entries disagree with the manifest's dimension.
    pub fn from_parts(manifest: IndexManifest, entries: Vec<IndexEntry>) -> Result<Self> {
        let index = manifest
            .index_kind
            .build(manifest.embedding.dimension, entries)?;
        Ok(Self { manifest, index })
    }

    /// Writes the manifest and entries through `persistence`.
    ///
    /// # Errors
    /// Propagates the backend's write errors.
    pub fn save(&self, persistence: &impl Persistence) -> Result<()> {
        persistence.save(&self.manifest, self.index.entries())
    }

    /// Loads an index without checking who will query it.
    ///
    /// # Errors
    /// [`RagError::IndexNotFound`](crate::RagError::IndexNotFound) when nothing usable is
    /// stored.
    pub fn load(persistence: &impl Persistence) -> Result<Self> {
        let (manifest, entries) = persistence.load()?;
        Self::from_parts(manifest, entries)
    }

    /// Loads the index in `dir` and checks it was built by `embedder`'s model.
    ///
    /// # Errors
    /// [`RagError::IndexNotFound`](crate::RagError::IndexNotFound) when nothing usable is
    /// stored, [`RagError::ManifestMismatch`](crate::RagError::ManifestMismatch) when the
    /// stored vectors came from a different model or dimension.
    pub fn open<M: EmbeddingModel>(dir: impl AsRef<Path>, embedder: &M) -> Result<Self> {
        let persistence = RkyvPersistence::new(dir.as_ref());
        let (manifest, entries) = persistence.load()?;
        manifest.check_compatible(&embedder.identity())?;
        let index = Self::from_parts(manifest, entries)?;
        tracing::info!(
            path = %dir.as_ref().display(),
            chunks = index.len(),
            model = %index.manifest.embedding.model,
            kind = index.manifest.index_kind.as_str(),
            "loaded index"
        );
        Ok(index)
    }

    /// Searches for the `top_k` chunks most similar to `query`.
    ///
    /// # Errors
    /// See [`VectorIndex::search`].
    pub fn search(&self, query: &[f32], top_k: usize, threshold: f32) -> Result<Vec<SearchResult>> {
        self.index.search(query, top_k, threshold)
    }

    /// How this index was built.
    #[must_use]
    pub const fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Stored entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        self.index.entries()
    }

    /// Number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if nothing was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;
    use crate::index::tests::entry;
    use tempfile::tempdir;

    struct Fixed {
        dim: usize,
        id: &'static str,
    }

    impl EmbeddingModel for Fixed {
        fn dim(&self) -> usize {
            self.dim
        }

        fn model_id(&self) -> &str {
            self.id
        }

        async fn embed(&self, _text: &str) -> nyaya_core::Result<Vec<f32>> {
            Ok(vec![1.0; self.dim])
        }
    }

    const CHUNKING: ChunkingParams = ChunkingParams {
        chunk_size: 1000,
        chunk_overlap: 20,
    };

    fn sample(kind: IndexKind) -> KnowledgeIndex {
        let entries = (0..12)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let angle = i as f32 * 0.4;
                entry(i, vec![angle.cos(), angle.sin(), 0.25])
            })
            .collect();
        KnowledgeIndex::build(EmbeddingIdentity::new("fixed", 3), kind, CHUNKING, 1, entries)
            .unwrap()
    }

    #[test]
    fn build_describes_entries() {
        let index = sample(IndexKind::Flat);
        assert_eq!(index.len(), 12);
        assert_eq!(index.manifest().chunks, 12);
        assert_eq!(index.manifest().embedding.dimension, 3);
    }

    #[test]
    fn reload_gives_identical_results() {
        for kind in [IndexKind::Flat, IndexKind::Hnsw] {
            let dir = tempdir().unwrap();
            let original = sample(kind);
            original.save(&RkyvPersistence::new(dir.path())).unwrap();

            let embedder = Fixed { dim: 3, id: "fixed" };
            let reloaded = KnowledgeIndex::open(dir.path(), &embedder).unwrap();
            assert_eq!(reloaded.manifest(), original.manifest());

            let query = [0.3, 0.9, 0.1];
            assert_eq!(
                reloaded.search(&query, 5, -1.0).unwrap(),
                original.search(&query, 5, -1.0).unwrap()
            );
        }
    }

    #[test]
    fn open_rejects_other_model() {
        let dir = tempdir().unwrap();
        sample(IndexKind::Flat)
            .save(&RkyvPersistence::new(dir.path()))
            .unwrap();

        let other = Fixed { dim: 3, id: "other" };
        assert!(matches!(
            KnowledgeIndex::open(dir.path(), &other),
            Err(RagError::ManifestMismatch { .. })
        ));

        let wider = Fixed { dim: 4, id: "fixed" };
        assert!(matches!(
            KnowledgeIndex::open(dir.path(), &wider),
            Err(RagError::ManifestMismatch { .. })
        ));
    }

    #[test]
    fn open_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let embedder = Fixed { dim: 3, id: "fixed" };
        let err = KnowledgeIndex::open(dir.path().join("index"), &embedder).unwrap_err();
        assert!(err.is_not_found());
    }
}
