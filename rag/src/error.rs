//! Error types for the RAG crate.

use nyaya_core::EmbeddingIdentity;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A parameter is out of range (chunk size, overlap, k, batch size).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The embedding provider failed.
    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    /// Vectors of different widths were mixed.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension provided.
        actual: usize,
    },

    /// Chunk and embedding counts differ.
    #[error("length mismatch: {chunks} chunks but {embeddings} embeddings")]
    LengthMismatch {
        /// Number of chunks.
        chunks: usize,
        /// Number of embeddings.
        embeddings: usize,
    },

    /// No usable index at the given location.
    #[error("no index at {}: {reason}", path.display())]
    IndexNotFound {
        /// Index directory.
        path: PathBuf,
        /// Why it could not be used (missing, corrupt, unreadable).
        reason: String,
    },

    /// The index was built with a different embedding model than the one querying it.
    #[error("index was built with {built}, but the query provider is {provider}")]
    ManifestMismatch {
        /// Identity recorded in the manifest.
        built: EmbeddingIdentity,
        /// Identity of the provider in use.
        provider: EmbeddingIdentity,
    },

    /// Writing the index failed.
    #[error("persistence error at {}: {source}", path.display())]
    Persistence {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Chunking operation failed.
    #[error("chunking error: {0}")]
    Chunking(String),
}

impl RagError {
    /// Returns `true` when the error means "there is no index to use yet".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::IndexNotFound { .. })
    }
}

/// Result type alias for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
