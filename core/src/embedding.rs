//! # Embedding Module
//!
//! Embeddings are dense vector representations of text that capture semantic meaning.
//! Similar passages produce vectors with a high cosine similarity, which is what the
//! retrieval layer ranks on.
//!
//! An index built with one model is only meaningful when queried with the same model, so
//! every provider also reports an [`EmbeddingIdentity`]. The index manifest records it at
//! build time and the loader refuses to pair an index with a different provider.
//!
//! ```rust
//! use nyaya_core::EmbeddingModel;
//!
//! async fn example<T: EmbeddingModel>(model: &T) -> nyaya_core::Result<()> {
//!     let dim = model.dim();
//!     let vectors = model
//!         .embed_batch(&["Section 302".to_string(), "Section 441".to_string()])
//!         .await?;
//!     assert!(vectors.iter().all(|v| v.len() == dim));
//!     Ok(())
//! }
//! ```

use alloc::{boxed::Box, string::String, sync::Arc, vec::Vec};
use core::{fmt, future::Future};

use serde::{Deserialize, Serialize};

/// A type alias for an embedding vector of 32-bit floats.
pub type Embedding = Vec<f32>;

/// The model name and vector width an embedding provider produces.
///
/// Two identities are compatible only when both fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbeddingIdentity {
    /// Provider-specific model identifier, e.g. `all-MiniLM-L6-v2`.
    pub model: String,
    /// Length of every vector the model returns.
    pub dimension: usize,
}

impl EmbeddingIdentity {
    /// Creates a new identity.
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
        }
    }
}

impl fmt::Display for EmbeddingIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} dims)", self.model, self.dimension)
    }
}

/// Converts text to vector representations.
///
/// # Implementation Requirements
///
/// - [`embed`](EmbeddingModel::embed) must return vectors with length equal to [`dim`](EmbeddingModel::dim).
/// - [`embed_batch`](EmbeddingModel::embed_batch) must return one vector per input, in input order.
/// - Failures should carry a [`ProviderError`](crate::ProviderError) so callers can tell an
///   unreachable backend from a timeout or a rejected request.
///
/// # Example
///
/// ```rust
/// use nyaya_core::EmbeddingModel;
///
/// struct Zeros;
///
/// impl EmbeddingModel for Zeros {
///     fn dim(&self) -> usize {
///         384
///     }
///
///     fn model_id(&self) -> &str {
///         "zeros"
///     }
///
///     async fn embed(&self, _text: &str) -> nyaya_core::Result<Vec<f32>> {
///         Ok(vec![0.0; self.dim()])
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let embedding = Zeros.embed("The quick brown fox").await.unwrap();
/// assert_eq!(embedding.len(), 384);
/// assert_eq!(Zeros.identity().dimension, 384);
/// # });
/// ```
pub trait EmbeddingModel: Sized + Send + Sync {
    /// Returns the embedding vector dimension.
    fn dim(&self) -> usize;

    /// Returns the identifier of the underlying model.
    fn model_id(&self) -> &str;

    /// Returns the identity recorded alongside indexes built with this model.
    fn identity(&self) -> EmbeddingIdentity {
        EmbeddingIdentity::new(self.model_id(), self.dim())
    }

    /// Converts one text to an embedding vector.
    fn embed(&self, text: &str) -> impl Future<Output = crate::Result<Embedding>> + Send;

    /// Converts a batch of texts, preserving order.
    ///
    /// The default embeds each text in turn. Providers with a native batch endpoint
    /// should override it.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = crate::Result<Vec<Embedding>>> + Send {
        async move {
            let mut embeddings = Vec::with_capacity(texts.len());
            for text in texts {
                embeddings.push(self.embed(text).await?);
            }
            Ok(embeddings)
        }
    }
}

macro_rules! impl_embedding_model {
    ($($name:ident),*) => {
        $(
            impl<T: EmbeddingModel> EmbeddingModel for $name<T> {
                fn dim(&self) -> usize {
                    T::dim(self)
                }

                fn model_id(&self) -> &str {
                    T::model_id(self)
                }

                fn embed(&self, text: &str) -> impl Future<Output = crate::Result<Embedding>> + Send {
                    T::embed(self, text)
                }

                fn embed_batch(
                    &self,
                    texts: &[String],
                ) -> impl Future<Output = crate::Result<Vec<Embedding>>> + Send {
                    T::embed_batch(self, texts)
                }
            }
        )*
    };
}

impl<T: EmbeddingModel> EmbeddingModel for &T {
    fn dim(&self) -> usize {
        T::dim(self)
    }

    fn model_id(&self) -> &str {
        T::model_id(self)
    }

    fn embed(&self, text: &str) -> impl Future<Output = crate::Result<Embedding>> + Send {
        T::embed(self, text)
    }

    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = crate::Result<Vec<Embedding>>> + Send {
        T::embed_batch(self, texts)
    }
}

impl_embedding_model!(Arc, Box);

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{string::ToString, vec};
    use core::sync::atomic::{AtomicUsize, Ordering};

    struct MockEmbeddingModel {
        dimension: usize,
        calls: AtomicUsize,
    }

    impl MockEmbeddingModel {
        const fn new(dimension: usize) -> Self {
            Self {
                dimension,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl EmbeddingModel for MockEmbeddingModel {
        fn dim(&self) -> usize {
            self.dimension
        }

        fn model_id(&self) -> &str {
            "mock"
        }

        #[allow(clippy::cast_precision_loss)]
        async fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut embedding = vec![0.0; self.dimension];
            for (i, value) in embedding.iter_mut().enumerate() {
                *value = (text.len() + i) as f32 * 0.01;
            }
            Ok(embedding)
        }
    }

    #[tokio::test]
    async fn embedding_generation() {
        let model = MockEmbeddingModel::new(4);
        let embedding = model.embed("test").await.unwrap();

        assert_eq!(embedding.len(), 4);
        assert!((embedding[0] - 0.04).abs() < f32::EPSILON);
        assert!((embedding[3] - 0.07).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn default_batch_preserves_order() {
        let model = MockEmbeddingModel::new(2);
        let texts = vec!["a".to_string(), "abc".to_string(), "ab".to_string()];
        let batch = model.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 3);
        assert!((batch[0][0] - 0.01).abs() < f32::EPSILON);
        assert!((batch[1][0] - 0.03).abs() < f32::EPSILON);
        assert!((batch[2][0] - 0.02).abs() < f32::EPSILON);
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_batch_makes_no_calls() {
        let model = MockEmbeddingModel::new(2);
        let batch = model.embed_batch(&[]).await.unwrap();
        assert!(batch.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shared_model_delegates() {
        let model = Arc::new(MockEmbeddingModel::new(3));
        assert_eq!(model.identity(), EmbeddingIdentity::new("mock", 3));
        let embedding = (&model).embed("x").await.unwrap();
        assert_eq!(embedding.len(), 3);
    }

    #[test]
    fn identity_compares_both_fields() {
        let a = EmbeddingIdentity::new("all-MiniLM-L6-v2", 384);
        assert_ne!(a, EmbeddingIdentity::new("all-MiniLM-L6-v2", 768));
        assert_ne!(a, EmbeddingIdentity::new("gemini-embedding-001", 384));
        assert_eq!(a.to_string(), "all-MiniLM-L6-v2 (384 dims)");
    }

    #[test]
    fn identity_serializes_as_plain_object() {
        let identity = EmbeddingIdentity::new("m", 8);
        let json = serde_json::to_string(&identity).unwrap();
        assert_eq!(json, r#"{"model":"m","dimension":8}"#);
    }
}
