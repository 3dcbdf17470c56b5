//! Offline ingestion: a directory of PDFs in, a persisted knowledge index out.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use nyaya_core::EmbeddingModel;
use nyaya_pdf::{PdfError, PdfExtractor};
use nyaya_rag::{
    Document, IndexProgress, Indexer, KnowledgeIndex, Metadata, RagConfig, RagError,
    RkyvPersistence, collect_files,
};
use rayon::prelude::*;

/// Texts recovered from a set of PDF files.
#[derive(Debug, Default)]
pub struct Extraction {
    /// One document per PDF that yielded text, in file order.
    pub documents: Vec<Document>,
    /// Files that could not be opened or parsed.
    pub failed: Vec<(PathBuf, PdfError)>,
    /// Files that opened but produced no text.
    pub empty: Vec<PathBuf>,
    /// Pages skipped across all files.
    pub skipped_pages: usize,
}

/// Extracts every file in parallel. Unreadable files are recorded, not fatal.
#[must_use]
pub fn extract_documents(files: &[PathBuf]) -> Extraction {
    let results: Vec<_> = files
        .par_iter()
        .map(|path| (path, PdfExtractor::from_path(path).extract()))
        .collect();

    let mut extraction = Extraction::default();
    for (path, result) in results {
        let document = match result {
            Ok(document) => document,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping unreadable PDF");
                extraction.failed.push((path.clone(), error));
                continue;
            }
        };
        for page in document.skipped_pages() {
            tracing::warn!(path = %path.display(), %page, "skipped page");
        }
        extraction.skipped_pages += document.skipped_pages().count();
        if document.is_empty() {
            tracing::warn!(path = %path.display(), "no text extracted");
            extraction.empty.push(path.clone());
            continue;
        }

        let mut metadata = Metadata::new();
        metadata.insert("path".into(), path.display().to_string());
        metadata.insert("pages".into(), document.page_count.to_string());
        if let Some(title) = &document.metadata.title {
            metadata.insert("title".into(), title.clone());
        }
        extraction
            .documents
            .push(Document::with_metadata(file_label(path), document.text(), metadata));
    }
    extraction
}

/// What an ingestion run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// An index was built and written.
    Written(IngestReport),
    /// Nothing was written.
    NothingToIngest {
        /// Why there was nothing to index.
        reason: String,
    },
}

/// Summary of a written index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// PDF files found.
    pub files: usize,
    /// Documents that contributed chunks.
    pub documents: usize,
    /// Files skipped because they could not be read or held no text.
    pub skipped_files: Vec<PathBuf>,
    /// Pages skipped across all documents.
    pub skipped_pages: usize,
    /// Chunks in the index.
    pub chunks: usize,
    /// Directory the index was written to.
    pub index_dir: PathBuf,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "indexed {} of {} PDF files into {} chunks at {}",
            self.documents,
            self.files,
            self.chunks,
            self.index_dir.display()
        )?;
        if !self.skipped_files.is_empty() {
            write!(f, "; skipped {} files", self.skipped_files.len())?;
        }
        if self.skipped_pages > 0 {
            write!(f, "; skipped {} pages", self.skipped_pages)?;
        }
        Ok(())
    }
}

/// Builds the knowledge index for every PDF in `pdf_dir` and writes it to `index_dir`.
///
/// A missing directory, a directory without PDFs, or PDFs without any extractable text
/// leave `index_dir` untouched and return [`IngestOutcome::NothingToIngest`].
///
/// # Errors
/// [`RagError`] when the configuration is invalid, embedding fails or the index cannot
/// be written.
pub async fn ingest<M, F>(
    pdf_dir: &Path,
    index_dir: &Path,
    embedder: Arc<M>,
    config: RagConfig,
    on_progress: F,
) -> Result<IngestOutcome, RagError>
where
    M: EmbeddingModel,
    F: FnMut(IndexProgress) + Send,
{
    let indexer = Indexer::new(embedder, config)?;

    if !pdf_dir.is_dir() {
        let reason = format!("PDF directory {} does not exist", pdf_dir.display());
        tracing::warn!("{reason}");
        return Ok(IngestOutcome::NothingToIngest { reason });
    }
    let files = collect_files(pdf_dir, "pdf")?;
    if files.is_empty() {
        let reason = format!("no PDF files in {}", pdf_dir.display());
        tracing::warn!("{reason}");
        return Ok(IngestOutcome::NothingToIngest { reason });
    }
    tracing::info!(files = files.len(), dir = %pdf_dir.display(), "extracting PDFs");

    let extraction = extract_documents(&files);
    if extraction.documents.is_empty() {
        let reason = format!("no text could be extracted from {} PDF files", files.len());
        tracing::warn!("{reason}");
        return Ok(IngestOutcome::NothingToIngest { reason });
    }

    let index = indexer
        .build_with_progress(&extraction.documents, on_progress)
        .await?;
    write_index(&index, index_dir)?;

    let skipped_files = extraction
        .failed
        .into_iter()
        .map(|(path, _)| path)
        .chain(extraction.empty)
        .collect();
    Ok(IngestOutcome::Written(IngestReport {
        files: files.len(),
        documents: index.manifest().documents,
        skipped_files,
        skipped_pages: extraction.skipped_pages,
        chunks: index.len(),
        index_dir: index_dir.to_path_buf(),
    }))
}

/// Persists `index` in `dir`.
///
/// # Errors
/// [`RagError::Persistence`] when the files cannot be written.
pub fn write_index(index: &KnowledgeIndex, dir: &Path) -> Result<(), RagError> {
    index.save(&RkyvPersistence::new(dir))
}

fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
