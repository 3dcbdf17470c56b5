//! The JSON sidecar describing how an index was built.

use nyaya_core::EmbeddingIdentity;
use serde::{Deserialize, Serialize};

use crate::dedup::corpus_fingerprint;
use crate::error::{RagError, Result};
use crate::index::IndexKind;
use crate::types::IndexEntry;

/// Current on-disk layout version.
pub const FORMAT_VERSION: u32 = 1;

/// Chunking parameters an index was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingParams {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
}

/// Metadata stored next to the index entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Layout version, see [`FORMAT_VERSION`].
    pub format_version: u32,
    /// Embedding model the vectors came from.
    pub embedding: EmbeddingIdentity,
    /// Search structure to rebuild on load.
    pub index_kind: IndexKind,
    /// How documents were split.
    pub chunking: ChunkingParams,
    /// Number of source documents that contributed chunks.
    pub documents: usize,
    /// Number of stored entries.
    pub chunks: usize,
    /// xxh3 fingerprint over the chunk content hashes, in entry order.
    pub fingerprint: u64,
}

impl IndexManifest {
    /// Describes `entries` as built by `embedding`.
    #[must_use]
    pub fn describe(
        embedding: EmbeddingIdentity,
        index_kind: IndexKind,
        chunking: ChunkingParams,
        documents: usize,
        entries: &[IndexEntry],
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            embedding,
            index_kind,
            chunking,
            documents,
            chunks: entries.len(),
            fingerprint: corpus_fingerprint(entries.iter().map(|entry| &entry.chunk)),
        }
    }

    /// Fails unless the index can be queried with `provider`.
    ///
    /// # Errors
    /// Returns [`RagError::ManifestMismatch`] when model or dimension differ.
    pub fn check_compatible(&self, provider: &EmbeddingIdentity) -> Result<()> {
        if &self.embedding == provider {
            Ok(())
        } else {
            Err(RagError::ManifestMismatch {
                built: self.embedding.clone(),
                provider: provider.clone(),
            })
        }
    }

    /// Explains why `entries` do not belong to this manifest, if they don't.
    #[must_use]
    pub fn entries_problem(&self, entries: &[IndexEntry]) -> Option<String> {
        if entries.len() != self.chunks {
            return Some(format!(
                "manifest lists {} chunks but {} entries are stored",
                self.chunks,
                entries.len()
            ));
        }
        if corpus_fingerprint(entries.iter().map(|entry| &entry.chunk)) != self.fingerprint {
            return Some("stored entries do not match the manifest fingerprint".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn manifest(entries: &[IndexEntry]) -> IndexManifest {
        IndexManifest::describe(
            EmbeddingIdentity::new("all-MiniLM-L6-v2", 2),
            IndexKind::Flat,
            ChunkingParams {
                chunk_size: 1000,
                chunk_overlap: 20,
            },
            1,
            entries,
        )
    }

    #[test]
    fn compatible_only_with_same_identity() {
        let m = manifest(&[]);
        assert!(m.check_compatible(&EmbeddingIdentity::new("all-MiniLM-L6-v2", 2)).is_ok());
        assert!(matches!(
            m.check_compatible(&EmbeddingIdentity::new("gemini-embedding-001", 2)),
            Err(RagError::ManifestMismatch { .. })
        ));
    }

    #[test]
    fn detects_foreign_entries() {
        let original = vec![IndexEntry::new(Chunk::new("d", 0, 0, "a"), vec![1.0, 0.0])];
        let other = vec![IndexEntry::new(Chunk::new("d", 0, 0, "b"), vec![1.0, 0.0])];
        let m = manifest(&original);
        assert!(m.entries_problem(&original).is_none());
        assert!(m.entries_problem(&other).is_some());
        assert!(m.entries_problem(&[]).is_some());
    }

    #[test]
    fn json_round_trip() {
        let m = manifest(&[]);
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"index_kind\":\"flat\""));
        assert_eq!(serde_json::from_str::<IndexManifest>(&json).unwrap(), m);
    }
}
