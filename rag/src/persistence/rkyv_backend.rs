//! rkyv entries plus a JSON manifest, stored in one directory.

use rkyv::rancor::Error as RkyvError;
use rkyv::{from_bytes, to_bytes};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};
use crate::types::{Chunk, IndexEntry, Metadata};

use super::{ENTRIES_FILE, FORMAT_VERSION, IndexManifest, MANIFEST_FILE, Persistence};

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct EntriesWrapper {
    entries: Vec<EntryData>,
}

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct EntryData {
    source_id: String,
    index: u64,
    start: u64,
    text: String,
    metadata: Vec<(String, String)>,
    embedding: Vec<f32>,
}

impl From<&IndexEntry> for EntryData {
    fn from(entry: &IndexEntry) -> Self {
        Self {
            source_id: entry.chunk.source_id.clone(),
            index: entry.chunk.index as u64,
            start: entry.chunk.start as u64,
            text: entry.chunk.text.clone(),
            metadata: entry
                .chunk
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            embedding: entry.embedding.clone(),
        }
    }
}

impl From<EntryData> for IndexEntry {
    #[allow(clippy::cast_possible_truncation)]
    fn from(data: EntryData) -> Self {
        let metadata: Metadata = data.metadata.into_iter().collect();
        let chunk = Chunk::new(
            data.source_id,
            data.index as usize,
            data.start as usize,
            data.text,
        )
        .with_metadata(metadata);
        Self::new(chunk, data.embedding)
    }
}

/// Directory persistence: rkyv-encoded entries next to a JSON manifest.
///
/// # Example
///
/// ```rust,no_run
/// use nyaya_rag::persistence::{Persistence, RkyvPersistence};
///
/// let persistence = RkyvPersistence::new("./index");
/// let (manifest, entries) = persistence.load()?;
/// println!("{} chunks built with {}", entries.len(), manifest.embedding);
/// # Ok::<(), nyaya_rag::RagError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RkyvPersistence {
    dir: PathBuf,
}

impl RkyvPersistence {
    /// Creates a backend rooted at `dir`. Nothing is touched until save or load.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn not_found(&self, reason: impl Into<String>) -> RagError {
        RagError::IndexNotFound {
            path: self.dir.clone(),
            reason: reason.into(),
        }
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        fs::read(self.dir.join(name)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => self.not_found(format!("{name} is missing")),
            _ => self.not_found(format!("{name} is unreadable: {e}")),
        })
    }
}

/// Writes `bytes` beside `path` and renames over it.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    let persist_err = |source| RagError::Persistence {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&staging, bytes).map_err(persist_err)?;
    fs::rename(&staging, path).map_err(persist_err)
}

impl Persistence for RkyvPersistence {
    fn save(&self, manifest: &IndexManifest, entries: &[IndexEntry]) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| RagError::Persistence {
            path: self.dir.clone(),
            source,
        })?;

        let wrapper = EntriesWrapper {
            entries: entries.iter().map(EntryData::from).collect(),
        };
        let bytes =
            to_bytes::<RkyvError>(&wrapper).map_err(|e| RagError::Serialization(e.to_string()))?;
        write_atomic(&self.dir.join(ENTRIES_FILE), &bytes)?;

        let json = serde_json::to_vec_pretty(manifest)
            .map_err(|e| RagError::Serialization(e.to_string()))?;
        write_atomic(&self.dir.join(MANIFEST_FILE), &json)?;

        tracing::info!(
            path = %self.dir.display(),
            chunks = entries.len(),
            bytes = bytes.len(),
            "saved index"
        );
        Ok(())
    }

    fn load(&self) -> Result<(IndexManifest, Vec<IndexEntry>)> {
        if !self.dir.is_dir() {
            return Err(self.not_found("directory does not exist"));
        }

        let manifest: IndexManifest = serde_json::from_slice(&self.read(MANIFEST_FILE)?)
            .map_err(|e| self.not_found(format!("{MANIFEST_FILE} is corrupt: {e}")))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(self.not_found(format!(
                "format version {} is not supported (expected {FORMAT_VERSION})",
                manifest.format_version
            )));
        }

        let bytes = self.read(ENTRIES_FILE)?;
        let wrapper = from_bytes::<EntriesWrapper, RkyvError>(&bytes)
            .map_err(|e| self.not_found(format!("{ENTRIES_FILE} is corrupt: {e}")))?;
        let entries: Vec<IndexEntry> = wrapper.entries.into_iter().map(IndexEntry::from).collect();

        if let Some(problem) = manifest.entries_problem(&entries) {
            return Err(self.not_found(problem));
        }
        Ok((manifest, entries))
    }

    fn exists(&self) -> bool {
        self.dir.join(MANIFEST_FILE).is_file()
    }

    fn path(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexKind;
    use crate::persistence::ChunkingParams;
    use nyaya_core::EmbeddingIdentity;
    use tempfile::tempdir;

    fn make_entries() -> Vec<IndexEntry> {
        let mut metadata = Metadata::new();
        metadata.insert("title".into(), "IPC".into());
        vec![
            IndexEntry::new(
                Chunk::new("ipc.pdf", 0, 0, "Section 302").with_metadata(metadata),
                vec![1.0, 2.0, 3.0],
            ),
            IndexEntry::new(Chunk::new("ipc.pdf", 1, 980, "Section 441"), vec![4.0, 5.0, 6.0]),
        ]
    }

    fn manifest_for(entries: &[IndexEntry]) -> IndexManifest {
        IndexManifest::describe(
            EmbeddingIdentity::new("mock", 3),
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
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let persistence = RkyvPersistence::new(dir.path().join("nested").join("index"));
        let entries = make_entries();
        let manifest = manifest_for(&entries);

        persistence.save(&manifest, &entries).unwrap();
        assert!(persistence.exists());

        let (loaded_manifest, loaded) = persistence.load().unwrap();
        assert_eq!(loaded_manifest, manifest);
        assert_eq!(loaded, entries);
    }

    #[test]
    fn save_overwrites_previous_index() {
        let dir = tempdir().unwrap();
        let persistence = RkyvPersistence::new(dir.path());
        let entries = make_entries();
        persistence.save(&manifest_for(&entries), &entries).unwrap();

        let fewer = entries[..1].to_vec();
        persistence.save(&manifest_for(&fewer), &fewer).unwrap();
        let (_, loaded) = persistence.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!dir.path().join("entries.rkyv.tmp").exists());
    }

    #[test]
    fn load_nonexistent_is_not_found() {
        let dir = tempdir().unwrap();
        let persistence = RkyvPersistence::new(dir.path().join("missing"));
        assert!(!persistence.exists());
        assert!(persistence.load().unwrap_err().is_not_found());
    }

    #[test]
    fn corrupt_entries_are_not_found() {
        let dir = tempdir().unwrap();
        let persistence = RkyvPersistence::new(dir.path());
        let entries = make_entries();
        persistence.save(&manifest_for(&entries), &entries).unwrap();
        fs::write(dir.path().join(ENTRIES_FILE), b"garbage").unwrap();

        let err = persistence.load().unwrap_err();
        assert!(err.is_not_found(), "got {err}");
    }

    #[test]
    fn corrupt_manifest_is_not_found() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), b"{not json").unwrap();
        let err = RkyvPersistence::new(dir.path()).load().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn entries_from_another_build_are_rejected() {
        let dir = tempdir().unwrap();
        let persistence = RkyvPersistence::new(dir.path());
        let entries = make_entries();
        let stale_manifest = manifest_for(&entries[..1]);
        persistence.save(&stale_manifest, &entries).unwrap();
        assert!(persistence.load().unwrap_err().is_not_found());
    }

    #[test]
    fn save_empty() {
        let dir = tempdir().unwrap();
        let persistence = RkyvPersistence::new(dir.path());
        persistence.save(&manifest_for(&[]), &[]).unwrap();
        let (manifest, loaded) = persistence.load().unwrap();
        assert!(loaded.is_empty());
        assert_eq!(manifest.chunks, 0);
    }

    #[test]
    fn save_into_file_path_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file").unwrap();
        let persistence = RkyvPersistence::new(blocker.join("index"));
        let err = persistence.save(&manifest_for(&[]), &[]).unwrap_err();
        assert!(matches!(err, RagError::Persistence { .. }));
    }
}
