use std::ops::RangeInclusive;

use crate::error::ExtractionError;

/// Runtime options for text extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Optional inclusive 1-based page range.
    pub page_range: Option<RangeInclusive<usize>>,
    /// Pages scoring below this text quality are reported as failed.
    ///
    /// `0.0` accepts everything the decoder returns.
    pub min_quality: f32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            page_range: None,
            min_quality: 0.0,
        }
    }
}

/// Result of extracting one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Text was recovered. It may be empty for blank or image-only pages.
    Extracted {
        /// 1-based page number in the source PDF.
        number: u32,
        /// Normalized page text.
        text: String,
    },
    /// The page was skipped.
    Failed(ExtractionError),
}

impl PageOutcome {
    /// 1-based page number in the source PDF.
    #[must_use]
    pub const fn number(&self) -> u32 {
        match self {
            Self::Extracted { number, .. } => *number,
            Self::Failed(error) => error.page(),
        }
    }

    /// Page text, if extraction succeeded.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Extracted { text, .. } => Some(text),
            Self::Failed(_) => None,
        }
    }
}

/// Minimal PDF metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMeta {
    /// Optional title from PDF info dictionary.
    pub title: Option<String>,
    /// Optional author from PDF info dictionary.
    pub author: Option<String>,
}

/// All page outcomes of one PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    /// Source identifier (path or virtual label).
    pub source: String,
    /// Total pages in the original PDF.
    pub page_count: usize,
    /// Extracted document metadata.
    pub metadata: DocumentMeta,
    /// Per-page outcomes in page order.
    pub pages: Vec<PageOutcome>,
}

impl ExtractedDocument {
    /// Concatenated text of every successfully extracted, non-empty page.
    ///
    /// Pages are joined with a single newline. A document where no page yielded text
    /// returns an empty string.
    #[must_use]
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .filter_map(PageOutcome::text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Failures for pages that were skipped.
    pub fn skipped_pages(&self) -> impl Iterator<Item = &ExtractionError> {
        self.pages.iter().filter_map(|page| match page {
            PageOutcome::Failed(error) => Some(error),
            PageOutcome::Extracted { .. } => None,
        })
    }

    /// Returns `true` when no page produced any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages
            .iter()
            .filter_map(PageOutcome::text)
            .all(str::is_empty)
    }
}
