//! Page-level PDF text extraction.
//!
//! A document either opens or it does not ([`PdfError`]). Once open, every page produces a
//! [`PageOutcome`]: pages whose content cannot be decoded are recorded as
//! [`ExtractionError`]s and skipped, so one damaged page never costs the whole document.

mod error;
mod model;
mod parser;

pub use error::{ExtractionError, PdfError, Result};
pub use model::{DocumentMeta, ExtractOptions, ExtractedDocument, PageOutcome};

use std::path::{Path, PathBuf};

/// PDF extractor entrypoint.
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    source: PdfSource,
    options: ExtractOptions,
}

#[derive(Debug, Clone)]
enum PdfSource {
    Path(PathBuf),
    Bytes { name: String, bytes: Vec<u8> },
}

impl PdfExtractor {
    /// Build an extractor from a PDF file path.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: PdfSource::Path(path.into()),
            options: ExtractOptions::default(),
        }
    }

    /// Build an extractor from PDF bytes labelled with `name`.
    #[must_use]
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            source: PdfSource::Bytes {
                name: name.into(),
                bytes: bytes.into(),
            },
            options: ExtractOptions::default(),
        }
    }

    /// Replace the extraction options.
    #[must_use]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Extract text from every selected page.
    ///
    /// The file is opened, read and closed within this call.
    ///
    /// # Errors
    /// Returns [`PdfError`] when the source cannot be read or is not a PDF.
    pub fn extract(&self) -> Result<ExtractedDocument> {
        let document = match &self.source {
            PdfSource::Path(path) => parser::parse_from_path(path, &self.options)?,
            PdfSource::Bytes { name, bytes } => {
                parser::parse_from_bytes(bytes, name, &self.options)?
            }
        };
        tracing::debug!(
            document = %document.source,
            pages = document.page_count,
            skipped = document.skipped_pages().count(),
            "extracted pdf text"
        );
        Ok(document)
    }

    /// Returns source path if available.
    #[must_use]
    pub fn source_path(&self) -> Option<&Path> {
        match &self.source {
            PdfSource::Path(path) => Some(path.as_path()),
            PdfSource::Bytes { .. } => None,
        }
    }
}
