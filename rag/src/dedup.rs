//! Content hashing with xxh3: chunk deduplication and corpus fingerprints.

use std::collections::HashSet;

use xxhash_rust::xxh3::{Xxh3, xxh3_64};

use crate::types::Chunk;

/// Computes a content hash for deduplication.
#[must_use]
pub fn content_hash(text: &str) -> u64 {
    xxh3_64(text.as_bytes())
}

/// Order-sensitive hash over a sequence of chunk hashes.
///
/// Stored in the index manifest so a loader can tell whether the entry file still
/// belongs to the manifest next to it.
pub fn corpus_fingerprint<'a>(chunks: impl IntoIterator<Item = &'a Chunk>) -> u64 {
    let mut hasher = Xxh3::new();
    for chunk in chunks {
        hasher.update(&chunk.content_hash.to_le_bytes());
    }
    hasher.digest()
}

/// Tracks which chunk texts have already been admitted.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<u64>,
}

impl Deduplicator {
    /// Creates an empty deduplicator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a chunk's content is seen.
    pub fn admit(&mut self, chunk: &Chunk) -> bool {
        self.seen.insert(chunk.content_hash)
    }
}
