//! Google Gemini provider for `nyaya`.
//!
//! [`GeminiBackend`] talks to the **Gemini Developer API** over REST and implements both
//! shared traits from `nyaya-core`:
//!
//! - [`LanguageModel`](nyaya_core::LanguageModel) through `generateContent`.
//! - [`EmbeddingModel`](nyaya_core::EmbeddingModel) through `embedContent` for queries and
//!   `batchEmbedContents` for document chunks (at most 100 per request).
//!
//! Rate limits, server errors and timeouts are retried with exponential backoff before
//! surfacing as a [`GeminiError`], which converts into
//! [`ProviderError`](nyaya_core::ProviderError) for callers that only care about the class
//! of failure.
//!
//! # Quick start
//!
//! ```no_run
//! use nyaya_core::{LanguageModel, llm::{LLMRequest, Message, model::Parameters}};
//! use nyaya_gemini::GeminiBackend;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let gemini = GeminiBackend::new(std::env::var("GEMINI_API_KEY")?);
//! let request = LLMRequest::new([
//!     Message::system("You are a concise legal assistant."),
//!     Message::user("What does Section 302 of the IPC cover?"),
//! ])
//! .with_parameters(Parameters::default().temperature(0.3));
//! println!("{}", gemini.respond(request).await?);
//! # Ok(()) }
//! ```

mod client;
mod config;
mod embedding;
mod error;
mod llm;
mod types;

pub use config::{
    AuthMode, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL, DEFAULT_MAX_RETRIES,
    DEFAULT_MODEL, DEFAULT_TIMEOUT, GEMINI_API_BASE_URL, GeminiBackend,
};
pub use error::GeminiError;

/// Create a Gemini backend configured to use the `gemini-2.5-flash` model.
#[must_use]
pub fn gemini_2_5_flash(key: impl Into<String>) -> GeminiBackend {
    GeminiBackend::new(key).with_text_model("gemini-2.5-flash")
}

/// Create a Gemini backend configured to use the `gemini-2.5-flash-lite` model.
#[must_use]
pub fn gemini_2_5_flash_lite(key: impl Into<String>) -> GeminiBackend {
    GeminiBackend::new(key).with_text_model("gemini-2.5-flash-lite")
}
