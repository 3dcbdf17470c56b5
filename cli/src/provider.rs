//! Provider construction for the CLI.

use anyhow::{Context, Result, bail};
use nyaya::{Embedding, EmbeddingModel};
use nyaya_gemini::GeminiBackend;
use nyaya_ort::OrtEmbedding;

use crate::settings::{EmbeddingBackend, Settings};

/// Environment variable holding the Gemini API key.
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

/// The embedding backend selected in the settings.
#[derive(Debug)]
pub enum Embedder {
    /// Local ONNX model.
    Ort(OrtEmbedding),
    /// Gemini embedding API.
    Gemini(GeminiBackend),
}

impl Embedder {
    /// Builds the configured backend.
    ///
    /// # Errors
    /// Fails when the ONNX model cannot be loaded or no Gemini key is available.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let embedding = &settings.embedding;
        Ok(match embedding.backend {
            EmbeddingBackend::Ort => {
                let model = OrtEmbedding::from_directory(&embedding.model_dir).with_context(|| {
                    format!(
                        "failed to load embedding model from {}",
                        embedding.model_dir.display()
                    )
                })?;
                Self::Ort(model)
            }
            EmbeddingBackend::Gemini => Self::Gemini(
                gemini(settings)?
                    .with_embedding_model(&embedding.gemini_model, embedding.gemini_dimensions),
            ),
        })
    }
}

impl EmbeddingModel for Embedder {
    fn dim(&self) -> usize {
        match self {
            Self::Ort(model) => model.dim(),
            Self::Gemini(model) => model.dim(),
        }
    }

    fn model_id(&self) -> &str {
        match self {
            Self::Ort(model) => EmbeddingModel::model_id(model),
            Self::Gemini(model) => EmbeddingModel::model_id(model),
        }
    }

    async fn embed(&self, text: &str) -> nyaya::nyaya_core::Result<Embedding> {
        match self {
            Self::Ort(model) => model.embed(text).await,
            Self::Gemini(model) => model.embed(text).await,
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> nyaya::nyaya_core::Result<Vec<Embedding>> {
        match self {
            Self::Ort(model) => model.embed_batch(texts).await,
            Self::Gemini(model) => model.embed_batch(texts).await,
        }
    }
}

/// The Gemini backend used for answer generation.
///
/// # Errors
/// Fails when no API key is configured.
pub fn generator(settings: &Settings) -> Result<GeminiBackend> {
    let mut backend = gemini(settings)?.with_text_model(&settings.generation.model);
    if let Some(timeout) = settings.generation.timeout() {
        backend = backend.with_timeout(timeout);
    }
    Ok(backend)
}

fn gemini(settings: &Settings) -> Result<GeminiBackend> {
    let Some(key) = settings
        .gemini_api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
    else {
        bail!("Set {GEMINI_KEY_VAR} in your environment or gemini_api_key in the settings file");
    };
    Ok(GeminiBackend::new(key))
}
