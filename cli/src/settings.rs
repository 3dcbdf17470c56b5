//! Settings file handling.
//!
//! Values come from `nyaya.toml` (or the file given with `--config`), then environment
//! variables and command-line flags, each layer overriding the one before.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use nyaya::{IndexKind, RagConfig};
use serde::Deserialize;

/// File read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "nyaya.toml";

/// Which backend embeds chunks and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local ONNX model through ONNX Runtime.
    #[default]
    Ort,
    /// Gemini embedding API.
    Gemini,
}

/// All settings the CLI needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory scanned for PDFs.
    pub pdf_dir: PathBuf,
    /// Directory holding the persisted index.
    pub index_dir: PathBuf,
    /// Chunking, search and indexing parameters.
    pub rag: RagConfig,
    /// Embedding backend.
    pub embedding: EmbeddingSettings,
    /// Answer generation.
    pub generation: GenerationSettings,
    /// Gemini API key. Usually supplied through `GEMINI_API_KEY` instead.
    pub gemini_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pdf_dir: PathBuf::from("docs"),
            index_dir: PathBuf::from("index"),
            rag: RagConfig::default(),
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
            gemini_api_key: None,
        }
    }
}

/// Embedding backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingSettings {
    /// Backend to use.
    pub backend: EmbeddingBackend,
    /// Directory with `model.onnx` and `tokenizer.json` for the `ort` backend.
    pub model_dir: PathBuf,
    /// Model name for the `gemini` backend.
    pub gemini_model: String,
    /// Vector width requested from the `gemini` backend.
    pub gemini_dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Ort,
            model_dir: PathBuf::from("models/all-MiniLM-L6-v2"),
            gemini_model: nyaya_gemini::DEFAULT_EMBEDDING_MODEL.to_string(),
            gemini_dimensions: nyaya_gemini::DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationSettings {
    /// Gemini model answering questions.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output token limit.
    pub max_tokens: u32,
    /// Seconds to wait for an answer. `0` waits indefinitely.
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: nyaya_gemini::DEFAULT_MODEL.to_string(),
            temperature: nyaya::answer::DEFAULT_TEMPERATURE,
            max_tokens: nyaya::answer::DEFAULT_MAX_TOKENS,
            timeout_secs: 60,
        }
    }
}

impl GenerationSettings {
    /// The configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

impl Settings {
    /// Loads `path`, or [`DEFAULT_CONFIG_FILE`] if present, or the defaults.
    ///
    /// # Errors
    /// Fails when an explicitly given file is missing, or any file does not parse or
    /// holds out-of-range values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        Ok(settings)
    }

    /// Parses one settings file.
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed, or holds out-of-range values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings = Self::from_toml(&text)
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Parses settings from TOML text.
    ///
    /// # Errors
    /// Fails on syntax errors, unknown keys or out-of-range values.
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.rag.validate()?;
        Ok(settings)
    }

    /// Overrides the index kind.
    pub const fn set_index_kind(&mut self, kind: IndexKind) {
        self.rag.index_kind = kind;
    }
}
