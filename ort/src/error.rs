//! Error types for the ONNX Runtime embedding crate.

use std::path::PathBuf;

use nyaya_core::ProviderError;
use thiserror::Error;

/// Errors from loading or running a local embedding model.
#[derive(Debug, Error)]
pub enum OrtError {
    /// ONNX Runtime failed to load or run the model.
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),

    /// The tokenizer file could not be parsed.
    #[error("failed to load tokenizer from {}: {message}", path.display())]
    Tokenizer {
        /// Path to the tokenizer file.
        path: PathBuf,
        /// Error message from the tokenizers crate.
        message: String,
    },

    /// The builder was not given a model file.
    #[error("model path not specified")]
    MissingModelPath,

    /// No `tokenizer.json` next to the model.
    #[error("tokenizer.json not found in {}", .0.display())]
    TokenizerNotFound(PathBuf),

    /// No `.onnx` file at the given location.
    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// The model has no output this crate knows how to pool.
    #[error("model output has {0} dimensions, expected 2 or 3")]
    InvalidOutputShape(usize),

    /// Input text could not be tokenized.
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// The output tensor could not be reshaped.
    #[error("shape error: {0}")]
    Shape(String),
}

impl OrtError {
    /// Creates a tokenizer error from a path and error message.
    pub fn tokenizer(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Tokenizer {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<OrtError> for ProviderError {
    fn from(error: OrtError) -> Self {
        match error {
            OrtError::Tokenization(_) | OrtError::Shape(_) | OrtError::InvalidOutputShape(_) => {
                Self::rejected(error.to_string())
            }
            other => Self::unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failures_are_unavailable() {
        let error = ProviderError::from(OrtError::ModelNotFound(PathBuf::from("models/minilm")));
        assert!(matches!(error, ProviderError::Unavailable(ref m) if m.contains("models/minilm")));
    }

    #[test]
    fn bad_input_is_rejected() {
        let error = ProviderError::from(OrtError::Tokenization("invalid utf-8".into()));
        assert!(matches!(error, ProviderError::Rejected(_)));
        assert!(!error.is_transient());
    }
}
