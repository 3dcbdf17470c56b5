use std::time::Duration;

use thiserror::Error;

/// Why an answer could not be generated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The language model returned an error.
    #[error("{0}")]
    Provider(String),
    /// The language model did not answer within the configured timeout.
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    /// The language model answered with nothing but whitespace.
    #[error("the model returned an empty answer")]
    Empty,
}

impl GenerationError {
    pub(crate) fn provider(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Provider(message)
    }
}
