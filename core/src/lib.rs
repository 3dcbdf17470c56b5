//! # nyaya-core
//!
//! Provider-agnostic traits for the two models a retrieval-augmented legal assistant talks to.
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │   Pipeline      │───▶│   nyaya-core     │◀───│   Providers     │
//! │                 │    │   (this crate)   │    │                 │
//! │ - Ingestion     │    │                  │    │ - nyaya-ort     │
//! │ - Retrieval     │    │ - EmbeddingModel │    │ - nyaya-gemini  │
//! │ - Formatting    │    │ - LanguageModel  │    │ - test mocks    │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! Providers are always constructed by the caller and handed to the pipeline, so
//! tests can swap in deterministic fakes and nothing relies on process-wide state.
//!
//! | Capability | Trait | Description |
//! |------------|-------|-------------|
//! | **Embeddings** | [`EmbeddingModel`] | Text to fixed-dimension vectors, single or batched |
//! | **Generation** | [`LanguageModel`] | One request in, one complete text answer out |
//!
//! ## Semantic search with embeddings
//!
//! ```rust
//! use nyaya_core::EmbeddingModel;
//!
//! async fn embed_query(model: impl EmbeddingModel, query: &str) -> nyaya_core::Result<Vec<f32>> {
//!     let vector = model.embed(query).await?;
//!     assert_eq!(vector.len(), model.dim());
//!     Ok(vector)
//! }
//! ```
//!
//! ## Modules
//!
//! - [`embedding`]: turn text into dense vectors and describe the model that did it.
//! - [`llm`]: messages, sampling parameters and the generation trait.
//! - [`error`]: provider failure classification shared by every backend.

#![no_std]
extern crate alloc;

pub mod embedding;
pub mod error;
pub mod llm;

use alloc::string::String;

#[doc(inline)]
pub use embedding::{Embedding, EmbeddingIdentity, EmbeddingModel};
#[doc(inline)]
pub use error::ProviderError;
#[doc(inline)]
pub use llm::LanguageModel;

/// Result type used throughout the crate.
///
/// Type alias for [`anyhow::Result<T>`](anyhow::Result) with [`String`] as default success type.
pub type Result<T = String> = anyhow::Result<T>;

pub use anyhow::Error;
