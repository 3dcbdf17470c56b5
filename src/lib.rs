//! # nyaya
//!
//! A question-answering assistant over the Indian Penal Code. Section texts are extracted
//! from PDFs, chunked, embedded and indexed once; each question is then answered by
//! retrieving the closest chunks and asking a language model to fill in a fixed answer
//! layout.
//!
//! ```text
//! ingest:  PDFs ─► nyaya-pdf ─► Indexer (clean ─► chunk ─► embed) ─► KnowledgeIndex ─► disk
//! answer:  question ─► Retriever ─► top-k chunks ─► AnswerFormatter ─► structured answer
//! ```
//!
//! The pieces live in their own crates and are re-exported here:
//!
//! - [`nyaya_core`]: the [`EmbeddingModel`] and [`LanguageModel`] traits.
//! - [`nyaya_pdf`]: page-level PDF text extraction.
//! - [`nyaya_rag`]: chunking, vector indexes, persistence and retrieval.
//!
//! This crate adds the [`answer`] layer, the [`ingest`] job and the
//! [`LegalAssistant`] query service.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use nyaya::{AnswerFormatter, LegalAssistant, RagConfig};
//! # use nyaya::{EmbeddingModel, LanguageModel};
//!
//! async fn ask<M: EmbeddingModel, L: LanguageModel>(embedder: M, model: L) {
//!     let assistant = LegalAssistant::open(
//!         "index",
//!         Arc::new(embedder),
//!         AnswerFormatter::new(model),
//!         &RagConfig::default(),
//!     );
//!     println!("{}", assistant.readiness());
//!     println!("{}", assistant.answer("What is Section 302 IPC?").await);
//! }
//! ```

pub mod answer;
mod error;
pub mod ingest;
mod service;

#[cfg(test)]
mod test_support;

pub use answer::{AnswerFormatter, AnswerLayout, QuestionKind};
pub use error::GenerationError;
pub use ingest::{IngestOutcome, IngestReport, ingest};
pub use service::{LegalAssistant, Readiness};

pub use nyaya_core::{self, Embedding, EmbeddingIdentity, EmbeddingModel, LanguageModel, ProviderError};
pub use nyaya_pdf;
pub use nyaya_rag::{self, IndexKind, KnowledgeIndex, RagConfig, RetrievalResult, Retriever};
