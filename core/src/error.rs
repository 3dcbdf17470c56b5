//! Provider failure classification.
//!
//! Backends report failures through [`anyhow::Error`], but the pipeline needs to know
//! whether a provider was unreachable, too slow, or refused the request. Providers attach
//! a [`ProviderError`] (directly or as the source of a context chain) and callers recover
//! it with [`ProviderError::find`].

use alloc::string::String;
use core::time::Duration;

/// Why an embedding or generation provider failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The backend could not be reached or loaded.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The backend did not answer within the allotted time.
    #[error("provider timed out after {0:?}")]
    Timeout(Duration),
    /// The backend answered but refused the request or returned something unusable.
    #[error("provider rejected the request: {0}")]
    Rejected(String),
}

impl ProviderError {
    /// Creates an [`Unavailable`](Self::Unavailable) error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Creates a [`Rejected`](Self::Rejected) error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Finds the provider classification anywhere in an error chain.
    #[must_use]
    pub fn find(error: &anyhow::Error) -> Option<&Self> {
        error
            .downcast_ref::<Self>()
            .or_else(|| error.chain().find_map(|cause| cause.downcast_ref::<Self>()))
    }

    /// Returns `true` for failures that may succeed when retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn finds_direct_error() {
        let error = anyhow::Error::new(ProviderError::Timeout(Duration::from_secs(3)));
        assert_eq!(
            ProviderError::find(&error),
            Some(&ProviderError::Timeout(Duration::from_secs(3)))
        );
    }

    #[test]
    fn finds_error_behind_context() {
        let result: Result<(), ProviderError> = Err(ProviderError::unavailable("connection refused"));
        let error = result.context("embedding query").unwrap_err();
        assert!(matches!(
            ProviderError::find(&error),
            Some(ProviderError::Unavailable(_))
        ));
    }

    #[test]
    fn plain_errors_are_unclassified() {
        let error = anyhow::anyhow!("something else");
        assert!(ProviderError::find(&error).is_none());
    }

    #[test]
    fn only_rejections_are_permanent() {
        assert!(ProviderError::unavailable("x").is_transient());
        assert!(ProviderError::Timeout(Duration::ZERO).is_transient());
        assert!(!ProviderError::rejected("x").is_transient());
    }
}
