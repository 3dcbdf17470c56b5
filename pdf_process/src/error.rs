use thiserror::Error;

/// Errors that make a whole document unreadable.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The input bytes do not decode as a valid PDF structure.
    #[error("failed to parse PDF: {0}")]
    Parse(String),
    /// The source PDF could not be read from the filesystem.
    #[error("failed to read PDF: {0}")]
    Io(#[from] std::io::Error),
}

/// A single page that could not contribute text.
///
/// These are recoverable: the page is skipped and extraction continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    /// The PDF content stream for the page could not be decoded to text.
    #[error("page {page}: text extraction failed: {reason}")]
    Text {
        /// 1-based page number.
        page: u32,
        /// Decoder message.
        reason: String,
    },
    /// Text was decoded but is mostly control characters or noise.
    #[error("page {page}: extracted text is unreadable (quality {quality:.2})")]
    LowQuality {
        /// 1-based page number.
        page: u32,
        /// Quality score in `[0, 1]`.
        quality: f32,
    },
}

impl ExtractionError {
    /// Page the failure refers to.
    #[must_use]
    pub const fn page(&self) -> u32 {
        match self {
            Self::Text { page, .. } | Self::LowQuality { page, .. } => *page,
        }
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, PdfError>;
