use nyaya_core::{Embedding, EmbeddingModel, ProviderError, Result};

use crate::{
    client::{batch_embed_contents, embed_content},
    config::{GeminiBackend, GeminiConfig, display_model},
    error::GeminiError,
    types::{BatchEmbedContentsRequest, ContentEmbedding, EmbedContentRequest, TaskType},
};

/// `batchEmbedContents` accepts at most this many requests.
pub(crate) const MAX_BATCH: usize = 100;

impl EmbeddingModel for GeminiBackend {
    fn dim(&self) -> usize {
        self.config().embedding_dimensions
    }

    fn model_id(&self) -> &str {
        display_model(&self.config().embedding_model)
    }

    /// Embeds a search query.
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let cfg = self.config();
        let request = EmbedContentRequest::new(
            &cfg.embedding_model,
            text,
            TaskType::RetrievalQuery,
            cfg.embedding_dimensions,
        );
        let response = embed_content(cfg, &request)
            .await
            .map_err(ProviderError::from)?;
        Ok(checked(cfg, response.embedding)?)
    }

    /// Embeds document chunks, at most 100 per request.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let cfg = self.config();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            let request = BatchEmbedContentsRequest {
                requests: batch
                    .iter()
                    .map(|text| {
                        EmbedContentRequest::new(
                            &cfg.embedding_model,
                            text.as_str(),
                            TaskType::RetrievalDocument,
                            cfg.embedding_dimensions,
                        )
                    })
                    .collect(),
            };
            let response = batch_embed_contents(cfg, &request)
                .await
                .map_err(ProviderError::from)?;
            if response.embeddings.len() != batch.len() {
                return Err(ProviderError::from(GeminiError::Api(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    response.embeddings.len()
                )))
                .into());
            }
            for embedding in response.embeddings {
                embeddings.push(checked(cfg, embedding)?);
            }
            tracing::debug!(done = embeddings.len(), total = texts.len(), "embedded batch");
        }
        Ok(embeddings)
    }
}

fn checked(cfg: &GeminiConfig, embedding: ContentEmbedding) -> std::result::Result<Embedding, ProviderError> {
    if embedding.values.len() == cfg.embedding_dimensions {
        Ok(embedding.values)
    } else {
        Err(ProviderError::rejected(format!(
            "expected {}-dimensional embedding, got {}",
            cfg.embedding_dimensions,
            embedding.values.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_uses_plain_model_name() {
        let backend = GeminiBackend::new("k").with_embedding_model("text-embedding-004", 768);
        let identity = backend.identity();
        assert_eq!(identity.model, "text-embedding-004");
        assert_eq!(identity.dimension, 768);
    }

    #[test]
    fn wrong_width_is_rejected() {
        let backend = GeminiBackend::new("k").with_embedding_model("m", 3);
        let ok = checked(backend.config(), ContentEmbedding { values: vec![0.0; 3] });
        assert!(ok.is_ok());
        let err = checked(backend.config(), ContentEmbedding { values: vec![0.0; 2] });
        assert!(matches!(err, Err(ProviderError::Rejected(_))));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_requests() {
        let backend = GeminiBackend::new("k").with_base_url("http://127.0.0.1:9");
        assert!(backend.embed_batch(&[]).await.unwrap().is_empty());
    }
}
