//! Local sentence embeddings with ONNX Runtime.
//!
//! [`OrtEmbedding`] implements [`nyaya_core::EmbeddingModel`] for sentence-transformer
//! models exported to ONNX, such as `all-MiniLM-L6-v2`. The model directory must
//! contain the ONNX graph and its `tokenizer.json`; nothing is downloaded.
//!
//! - The embedding dimension is read from the model's output shape.
//! - Batches are padded to the longest sequence and run in one session call.
//! - `token_type_ids` is fed only to models that declare that input.
//! - Vectors are mean-pooled and L2-normalised by default.
//!
//! # Example
//!
//! ```rust,no_run
//! use nyaya_ort::OrtEmbedding;
//! use nyaya_core::EmbeddingModel;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = OrtEmbedding::from_directory("./models/all-MiniLM-L6-v2")?;
//! assert_eq!(embedder.model_id(), "all-MiniLM-L6-v2");
//!
//! let embedding = embedder.embed("Punishment for murder").await?;
//! assert_eq!(embedding.len(), embedder.dim());
//! # Ok(())
//! # }
//! ```

mod error;
mod pooling;

pub use error::OrtError;
pub use pooling::{PoolingStrategy, l2_normalize};

use std::path::{Path, PathBuf};

use ndarray::{ArrayD, Axis, Ix2, Ix3};
use nyaya_core::{EmbeddingModel, ProviderError};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use parking_lot::Mutex;
use tokenizers::{Encoding, Tokenizer};

/// Default cap on tokens per text. BERT-family encoders accept at most 512.
pub const DEFAULT_MAX_TOKENS: usize = 256;

/// An embedding model backed by ONNX Runtime.
///
/// Inference is serialised through one session; concurrent callers queue.
///
/// ```rust,no_run
/// use nyaya_ort::{OrtEmbedding, PoolingStrategy};
///
/// let embedder = OrtEmbedding::builder()
///     .model_path("./model/onnx/model.onnx")
///     .tokenizer_path("./model/tokenizer.json")
///     .model_id("all-MiniLM-L6-v2")
///     .pooling(PoolingStrategy::Mean)
///     .build()?;
/// # Ok::<(), nyaya_ort::OrtError>(())
/// ```
pub struct OrtEmbedding {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_id: String,
    dimension: usize,
    pooling: PoolingStrategy,
    normalize: bool,
    token_types: bool,
    max_tokens: usize,
}

impl std::fmt::Debug for OrtEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtEmbedding")
            .field("model_id", &self.model_id)
            .field("dimension", &self.dimension)
            .field("pooling", &self.pooling)
            .field("normalize", &self.normalize)
            .finish_non_exhaustive()
    }
}

impl OrtEmbedding {
    /// Loads the model in `path`, naming it after the directory.
    ///
    /// Looks for `model.onnx` (or any `.onnx` file, also under `onnx/`) and
    /// `tokenizer.json`.
    ///
    /// # Errors
    /// Returns an error if either file is missing or fails to load.
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, OrtError> {
        let dir = path.as_ref();
        Self::builder()
            .model_path(find_model_file(dir)?)
            .tokenizer_path(find_tokenizer_file(dir)?)
            .model_id(directory_model_id(dir))
            .build()
    }

    /// Create a builder for custom configuration.
    #[must_use]
    pub fn builder() -> OrtEmbeddingBuilder {
        OrtEmbeddingBuilder::default()
    }

    /// Returns the pooling strategy.
    #[must_use]
    pub const fn pooling(&self) -> PoolingStrategy {
        self.pooling
    }

    /// Returns whether L2 normalization is enabled.
    #[must_use]
    pub const fn normalize(&self) -> bool {
        self.normalize
    }

    fn run_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, OrtError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| OrtError::Tokenization(e.to_string()))?;
        let Padded { width, ids, masks } = Padded::new(&encodings, self.max_tokens);
        let shape = [texts.len(), width];
        let mask: Vec<i64> = masks.iter().map(|&m| i64::from(m)).collect();

        let mut inputs = ort::inputs![
            "input_ids" => Tensor::from_array((shape, ids.into_boxed_slice()))?,
            "attention_mask" => Tensor::from_array((shape, mask.into_boxed_slice()))?,
        ];
        if self.token_types {
            let zeros = vec![0i64; shape[0] * shape[1]];
            inputs.push((
                "token_type_ids".into(),
                Tensor::from_array((shape, zeros.into_boxed_slice()))?.into(),
            ));
        }

        let output: ArrayD<f32> = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs)?;
            let value = outputs
                .get("sentence_embedding")
                .or_else(|| outputs.get("last_hidden_state"))
                .or_else(|| outputs.get("hidden_states"))
                .or_else(|| outputs.get("output"))
                .ok_or(OrtError::InvalidOutputShape(0))?;
            value.try_extract_array::<f32>()?.to_owned()
        };

        let mut embeddings = match output.ndim() {
            // Already pooled by the graph: [batch, hidden].
            2 => output
                .into_dimensionality::<Ix2>()
                .map_err(|e| OrtError::Shape(e.to_string()))?
                .axis_iter(Axis(0))
                .map(|row| row.to_vec())
                .collect::<Vec<_>>(),
            3 => {
                let states = output
                    .into_dimensionality::<Ix3>()
                    .map_err(|e| OrtError::Shape(e.to_string()))?;
                states
                    .axis_iter(Axis(0))
                    .zip(masks.chunks(width.max(1)))
                    .map(|(sequence, mask)| self.pooling.apply(&sequence, mask))
                    .collect()
            }
            other => return Err(OrtError::InvalidOutputShape(other)),
        };

        if self.normalize {
            embeddings.iter_mut().for_each(|v| l2_normalize(v));
        }
        Ok(embeddings)
    }
}

impl EmbeddingModel for OrtEmbedding {
    fn dim(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed(&self, text: &str) -> nyaya_core::Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ProviderError::rejected("model returned no embedding").into())
    }

    async fn embed_batch(&self, texts: &[String]) -> nyaya_core::Result<Vec<Vec<f32>>> {
        let embeddings = self.run_batch(texts).map_err(ProviderError::from)?;
        tracing::trace!(model = %self.model_id, texts = texts.len(), "embedded batch");
        Ok(embeddings)
    }
}

/// Token ids and masks padded to a common width, row-major.
struct Padded {
    width: usize,
    ids: Vec<i64>,
    masks: Vec<u32>,
}

impl Padded {
    fn new(encodings: &[Encoding], max_tokens: usize) -> Self {
        let width = encodings
            .iter()
            .map(Encoding::len)
            .max()
            .unwrap_or(0)
            .min(max_tokens);
        let mut ids = Vec::with_capacity(encodings.len() * width);
        let mut masks = Vec::with_capacity(encodings.len() * width);

        for encoding in encodings {
            let tokens = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            for position in 0..width {
                ids.push(tokens.get(position).map_or(0, |&id| i64::from(id)));
                masks.push(mask.get(position).copied().unwrap_or(0));
            }
        }
        Self { width, ids, masks }
    }
}

/// Builder for [`OrtEmbedding`].
#[derive(Debug)]
pub struct OrtEmbeddingBuilder {
    model_path: Option<PathBuf>,
    tokenizer_path: Option<PathBuf>,
    model_id: Option<String>,
    pooling: PoolingStrategy,
    normalize: bool,
    max_tokens: usize,
}

impl Default for OrtEmbeddingBuilder {
    fn default() -> Self {
        Self {
            model_path: None,
            tokenizer_path: None,
            model_id: None,
            pooling: PoolingStrategy::default(),
            normalize: true,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl OrtEmbeddingBuilder {
    /// Set the path to the ONNX model file.
    #[must_use]
    pub fn model_path(mut self, path: impl AsRef<Path>) -> Self {
        self.model_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the path to the tokenizer.json file.
    #[must_use]
    pub fn tokenizer_path(mut self, path: impl AsRef<Path>) -> Self {
        self.tokenizer_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Name recorded in index manifests. Defaults to the model file's stem.
    #[must_use]
    pub fn model_id(mut self, id: impl Into<String>) -> Self {
        self.model_id = Some(id.into());
        self
    }

    /// Set the pooling strategy. Default: [`PoolingStrategy::Mean`].
    #[must_use]
    pub const fn pooling(mut self, strategy: PoolingStrategy) -> Self {
        self.pooling = strategy;
        self
    }

    /// Enable or disable L2 normalization. Default: `true`.
    #[must_use]
    pub const fn normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }

    /// Truncate texts to this many tokens. Default: [`DEFAULT_MAX_TOKENS`].
    #[must_use]
    pub const fn max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    /// Loads the tokenizer and the ONNX session.
    ///
    /// # Errors
    /// Returns an error if the model path is unset or missing, either file fails to
    /// load, or the output dimension cannot be determined.
    pub fn build(self) -> Result<OrtEmbedding, OrtError> {
        let model_path = self.model_path.ok_or(OrtError::MissingModelPath)?;
        if !model_path.is_file() {
            return Err(OrtError::ModelNotFound(model_path));
        }

        let tokenizer_path = match self.tokenizer_path {
            Some(path) => path,
            None => find_tokenizer_file(model_path.parent().unwrap_or(&model_path))?,
        };
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| OrtError::tokenizer(&tokenizer_path, e))?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(num_cpus())?
            .commit_from_file(&model_path)?;

        let dimension = detect_embedding_dimension(&session)?;
        let token_types = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");
        let model_id = self.model_id.unwrap_or_else(|| {
            model_path
                .file_stem()
                .map_or_else(|| "onnx".to_string(), |s| s.to_string_lossy().into_owned())
        });

        tracing::info!(
            model = %model_id,
            dimension,
            token_types,
            path = %model_path.display(),
            "loaded onnx embedding model"
        );

        Ok(OrtEmbedding {
            session: Mutex::new(session),
            tokenizer,
            model_id,
            dimension,
            pooling: self.pooling,
            normalize: self.normalize,
            token_types,
            max_tokens: self.max_tokens.max(1),
        })
    }
}

/// Model id for a model directory: its final path component.
fn directory_model_id(dir: &Path) -> String {
    dir.file_name().map_or_else(
        || dir.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn first_onnx_in(dir: &Path) -> Option<PathBuf> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "onnx"))
        .collect();
    found.sort();
    found.into_iter().next()
}

/// Find the ONNX model file in a directory.
fn find_model_file(dir: &Path) -> Result<PathBuf, OrtError> {
    let candidates = [
        dir.join("model.onnx"),
        dir.join("onnx/model.onnx"),
        dir.join("onnx/model_fp32.onnx"),
        dir.join("onnx/model_quantized.onnx"),
    ];
    candidates
        .into_iter()
        .find(|candidate| candidate.is_file())
        .or_else(|| first_onnx_in(dir))
        .or_else(|| first_onnx_in(&dir.join("onnx")))
        .ok_or_else(|| OrtError::ModelNotFound(dir.to_path_buf()))
}

/// Find the tokenizer.json file in a directory.
fn find_tokenizer_file(dir: &Path) -> Result<PathBuf, OrtError> {
    [dir.join("tokenizer.json"), dir.join("onnx/tokenizer.json")]
        .into_iter()
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| OrtError::TokenizerNotFound(dir.to_path_buf()))
}

/// Reads the hidden size from the last axis of a 2D or 3D output.
fn detect_embedding_dimension(session: &Session) -> Result<usize, OrtError> {
    for output in session.outputs() {
        if let ort::value::ValueType::Tensor { shape, .. } = output.dtype()
            && shape.len() >= 2
            && let Some(&dim) = shape.last()
            && dim > 0
        {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            return Ok(dim as usize);
        }
    }
    Err(OrtError::InvalidOutputShape(0))
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(4)
}
