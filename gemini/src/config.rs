use std::{sync::Arc, time::Duration};

/// Gemini REST base URL used by the Developer API.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub(crate) const USER_AGENT: &str = concat!("nyaya-gemini/", env!("CARGO_PKG_VERSION"));
/// Default generation model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";
/// Vector width requested from the embedding model unless overridden.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;
/// Per-request timeout unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Retries after a retryable failure unless overridden.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Authentication strategy supported by the Gemini backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Attach `?key=API_KEY` to every request.
    Query,
    /// Send the API key via the `x-goog-api-key` header (default).
    #[default]
    Header,
}

/// Gemini backend implementing both [`LanguageModel`](nyaya_core::LanguageModel) and
/// [`EmbeddingModel`](nyaya_core::EmbeddingModel).
///
/// Cloning is cheap; clones share configuration and the HTTP connection pool.
#[derive(Clone)]
pub struct GeminiBackend {
    inner: Arc<GeminiConfig>,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", &self.inner.base_url)
            .field("text_model", &self.inner.text_model)
            .field("embedding_model", &self.inner.embedding_model)
            .field("embedding_dimensions", &self.inner.embedding_dimensions)
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    /// Create a backend using the default chat and embedding models.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(GeminiConfig {
                api_key: api_key.into(),
                base_url: GEMINI_API_BASE_URL.to_string(),
                auth: AuthMode::default(),
                text_model: sanitize_model(DEFAULT_MODEL),
                embedding_model: sanitize_model(DEFAULT_EMBEDDING_MODEL),
                embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
                timeout: DEFAULT_TIMEOUT,
                max_retries: DEFAULT_MAX_RETRIES,
                client: reqwest::Client::new(),
            }),
        }
    }

    /// Override the REST base URL (useful for proxies and tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).base_url = base_url.into();
        self
    }

    /// Select how the API key is sent.
    #[must_use]
    pub fn with_auth_mode(mut self, mode: AuthMode) -> Self {
        Arc::make_mut(&mut self.inner).auth = mode;
        self
    }

    /// Override the generation model.
    #[must_use]
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).text_model = sanitize_model(model);
        self
    }

    /// Override the embedding model and the vector width requested from it.
    #[must_use]
    pub fn with_embedding_model(mut self, model: impl Into<String>, dim: usize) -> Self {
        let cfg = Arc::make_mut(&mut self.inner);
        cfg.embedding_model = sanitize_model(model);
        cfg.embedding_dimensions = dim;
        self
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        Arc::make_mut(&mut self.inner).timeout = timeout;
        self
    }

    /// Override how many times a retryable failure is retried.
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        Arc::make_mut(&mut self.inner).max_retries = retries;
        self
    }

    pub(crate) fn config(&self) -> &GeminiConfig {
        &self.inner
    }
}

#[derive(Clone)]
pub(crate) struct GeminiConfig {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) auth: AuthMode,
    pub(crate) text_model: String,
    pub(crate) embedding_model: String,
    pub(crate) embedding_dimensions: usize,
    pub(crate) timeout: Duration,
    pub(crate) max_retries: u32,
    pub(crate) client: reqwest::Client,
}

impl GeminiConfig {
    pub(crate) fn endpoint(&self, suffix: &str) -> String {
        let mut url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            suffix.trim_start_matches('/')
        );
        if self.auth == AuthMode::Query {
            let separator = if url.contains('?') { '&' } else { '?' };
            url.push(separator);
            url.push_str("key=");
            url.push_str(&self.api_key);
        }
        url
    }

    pub(crate) fn model_endpoint(&self, model: &str, action: &str) -> String {
        let model = sanitize_model(model);
        self.endpoint(&format!("{model}:{action}"))
    }
}

/// Prefixes `models/` unless already present.
pub(crate) fn sanitize_model(model: impl Into<String>) -> String {
    let model = model.into();
    if model.starts_with("models/") {
        model
    } else {
        format!("models/{model}")
    }
}

/// Model name as users write it, without the `models/` prefix.
pub(crate) fn display_model(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}
