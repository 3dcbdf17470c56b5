//! Index construction with progress tracking.
//!
//! [`Indexer`] turns a set of documents into a [`KnowledgeIndex`] in one pass:
//! clean, chunk, drop duplicate chunks, embed in batches, then build the search
//! structure once over everything.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nyaya_core::EmbeddingModel;

use crate::chunking::Chunker;
use crate::cleaning::{BasicCleaner, Cleaner};
use crate::config::RagConfig;
use crate::dedup::Deduplicator;
use crate::error::{RagError, Result};
use crate::index::pair_entries;
use crate::knowledge::KnowledgeIndex;
use crate::types::{Chunk, Document};

/// Progress update during indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexProgress {
    /// Units processed so far in the current stage.
    pub processed: usize,
    /// Units in the current stage.
    pub total: usize,
    /// Document being processed, if any.
    pub current: Option<String>,
    /// Current stage of indexing.
    pub stage: IndexStage,
}

impl IndexProgress {
    /// Creates a new progress update.
    #[must_use]
    pub const fn new(
        processed: usize,
        total: usize,
        current: Option<String>,
        stage: IndexStage,
    ) -> Self {
        Self {
            processed,
            total,
            current,
            stage,
        }
    }
}

/// Stages of the indexing process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStage {
    /// Cleaning and splitting documents; units are documents.
    Chunking,
    /// Embedding chunks; units are chunks.
    Embedding,
    /// Building the search structure.
    Indexing,
    /// Writing the index to disk.
    Saving,
    /// Indexing completed successfully.
    Done,
    /// A document contributed nothing.
    Skipped {
        /// Reason the document was skipped.
        reason: String,
    },
}

/// Lists files in `dir` (not recursing) whose extension matches `extension`
/// case-insensitively, sorted by path.
///
/// # Errors
/// Returns [`RagError::Io`] if the directory cannot be read.
pub fn collect_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Builds [`KnowledgeIndex`]es from documents.
pub struct Indexer<M> {
    embedder: Arc<M>,
    config: RagConfig,
    chunker: Arc<dyn Chunker>,
    cleaner: Arc<dyn Cleaner>,
}

impl<M> std::fmt::Debug for Indexer<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("config", &self.config)
            .field("chunker", &self.chunker.name())
            .field("cleaner", &self.cleaner.name())
            .finish_non_exhaustive()
    }
}

impl<M: EmbeddingModel> Indexer<M> {
    /// Creates an indexer with the chunker described by `config` and [`BasicCleaner`].
    ///
    /// # Errors
    /// Returns [`RagError::InvalidConfig`] if `config` does not validate.
    pub fn new(embedder: Arc<M>, config: RagConfig) -> Result<Self> {
        config.validate()?;
        let chunker = Arc::new(config.chunker()?);
        Ok(Self {
            embedder,
            config,
            chunker,
            cleaner: Arc::new(BasicCleaner),
        })
    }

    /// Replaces the chunking strategy. The manifest records this chunker's parameters.
    #[must_use]
    pub fn with_chunker(mut self, chunker: impl Chunker + 'static) -> Self {
        self.chunker = Arc::new(chunker);
        self
    }

    /// Replaces the cleaning strategy.
    #[must_use]
    pub fn with_cleaner(mut self, cleaner: impl Cleaner + 'static) -> Self {
        self.cleaner = Arc::new(cleaner);
        self
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Builds an index over `documents`.
    ///
    /// # Errors
    /// See [`build_with_progress`](Self::build_with_progress).
    pub async fn build(&self, documents: &[Document]) -> Result<KnowledgeIndex> {
        self.build_with_progress(documents, |_| {}).await
    }

    /// Builds an index over `documents`, reporting each stage to `on_progress`.
    ///
    /// Documents with no text are reported as [`IndexStage::Skipped`]. An empty corpus
    /// produces an empty index.
    ///
    /// # Errors
    /// [`RagError::Chunking`] from the chunker, [`RagError::Embedding`] when the
    /// provider fails, [`RagError::LengthMismatch`] when it returns the wrong number of
    /// vectors, [`RagError::DimensionMismatch`] when a vector has the wrong width.
    pub async fn build_with_progress<F>(
        &self,
        documents: &[Document],
        mut on_progress: F,
    ) -> Result<KnowledgeIndex>
    where
        F: FnMut(IndexProgress) + Send,
    {
        let total_docs = documents.len();
        let mut dedup = Deduplicator::new();
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut contributing = 0usize;

        for (position, document) in documents.iter().enumerate() {
            on_progress(IndexProgress::new(
                position,
                total_docs,
                Some(document.id.clone()),
                IndexStage::Chunking,
            ));

            let cleaned;
            let document = if self.config.clean_text {
                cleaned = self.cleaner.clean(document);
                &cleaned
            } else {
                document
            };

            let pieces = self.chunker.chunk(document)?;
            let before = chunks.len();
            chunks.extend(
                pieces
                    .into_iter()
                    .filter(|chunk| !self.config.deduplication || dedup.admit(chunk)),
            );
            let added = chunks.len() - before;

            if added == 0 {
                let reason = if document.text.trim().is_empty() {
                    "no text".to_string()
                } else {
                    "all chunks duplicate earlier content".to_string()
                };
                tracing::warn!(document = %document.id, %reason, "document skipped");
                on_progress(IndexProgress::new(
                    position + 1,
                    total_docs,
                    Some(document.id.clone()),
                    IndexStage::Skipped { reason },
                ));
            } else {
                contributing += 1;
                tracing::debug!(document = %document.id, chunks = added, "chunked document");
            }
        }

        let embeddings = self.embed_chunks(&chunks, &mut on_progress).await?;
        let total_chunks = chunks.len();

        on_progress(IndexProgress::new(0, total_chunks, None, IndexStage::Indexing));
        let entries = pair_entries(chunks, embeddings)?;
        let index = KnowledgeIndex::build(
            self.embedder.identity(),
            self.config.index_kind,
            self.chunker.params(),
            contributing,
            entries,
        )?;

        tracing::info!(
            documents = contributing,
            chunks = index.len(),
            model = self.embedder.model_id(),
            kind = self.config.index_kind.as_str(),
            "built index"
        );
        on_progress(IndexProgress::new(total_chunks, total_chunks, None, IndexStage::Done));
        Ok(index)
    }

    async fn embed_chunks<F>(&self, chunks: &[Chunk], on_progress: &mut F) -> Result<Vec<Vec<f32>>>
    where
        F: FnMut(IndexProgress) + Send,
    {
        let total = chunks.len();
        let mut embeddings = Vec::with_capacity(total);

        for batch in chunks.chunks(self.config.embedding_batch_size) {
            on_progress(IndexProgress::new(
                embeddings.len(),
                total,
                None,
                IndexStage::Embedding,
            ));
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let vectors = self
                .embedder
                .embed_batch(&texts)
                .await
                .map_err(RagError::Embedding)?;
            if vectors.len() != batch.len() {
                return Err(RagError::LengthMismatch {
                    chunks: batch.len(),
                    embeddings: vectors.len(),
                });
            }
            embeddings.extend(vectors);
        }
        Ok(embeddings)
    }
}
