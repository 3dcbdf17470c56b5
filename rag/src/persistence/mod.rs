//! Persistence backends for RAG indexes.
//!
//! An index is saved as a directory holding two files:
//!
//! | File | Format | Contents |
//! |------|--------|----------|
//! | `manifest.json` | JSON | [`IndexManifest`]: embedding identity, chunking, counts, fingerprint |
//! | `entries.rkyv` | rkyv | chunks and their embedding vectors |
//!
//! Both files are written to a temporary name and renamed into place, manifest last.
//! A loader that finds the manifest but not matching entries reports the index as
//! unusable instead of serving a mix of two builds.

mod manifest;
mod rkyv_backend;

pub use manifest::{ChunkingParams, FORMAT_VERSION, IndexManifest};
pub use rkyv_backend::RkyvPersistence;

use crate::error::Result;
use crate::types::IndexEntry;
use std::path::Path;

/// Manifest file name inside an index directory.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Entry file name inside an index directory.
pub const ENTRIES_FILE: &str = "entries.rkyv";

/// Trait for persistence backends.
pub trait Persistence: Send + Sync {
    /// Writes the manifest and entries, replacing any previous index at this location.
    fn save(&self, manifest: &IndexManifest, entries: &[IndexEntry]) -> Result<()>;

    /// Reads a previously saved index.
    ///
    /// Missing, unreadable or corrupt data is reported as
    /// [`RagError::IndexNotFound`](crate::RagError::IndexNotFound).
    fn load(&self) -> Result<(IndexManifest, Vec<IndexEntry>)>;

    /// Returns `true` if a manifest is present.
    fn exists(&self) -> bool;

    /// Returns the storage location.
    fn path(&self) -> &Path;
}
