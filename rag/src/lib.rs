//! Retrieval over a fixed document corpus.
//!
//! The crate covers everything between extracted text and ranked passages:
//!
//! ```text
//! Document ─▶ Cleaner ─▶ Chunker ─▶ EmbeddingModel ─▶ VectorIndex ─▶ manifest.json
//!                                                          │          entries.rkyv
//!                    query ─▶ Retriever ─▶ EmbeddingModel ─┘
//! ```
//!
//! - [`Indexer`] builds a [`KnowledgeIndex`] once over a whole corpus.
//! - [`KnowledgeIndex`] pairs the search structure with the [`IndexManifest`] that
//!   records which embedding model produced the vectors.
//! - [`Retriever`] embeds a question and returns the top-k chunks.
//!
//! Indexes are immutable. Re-ingesting builds a new index and callers replace their
//! shared handle to it.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nyaya_core::EmbeddingModel;
//! use nyaya_rag::{Document, Indexer, RagConfig, Retriever};
//! use nyaya_rag::persistence::RkyvPersistence;
//!
//! async fn run<M: EmbeddingModel>(embedder: M) -> nyaya_rag::Result<()> {
//!     let embedder = Arc::new(embedder);
//!     let indexer = Indexer::new(Arc::clone(&embedder), RagConfig::default())?;
//!     let index = indexer
//!         .build(&[Document::new("ipc.pdf", "Section 302. Punishment for murder.")])
//!         .await?;
//!     index.save(&RkyvPersistence::new("index"))?;
//!
//!     let retriever = Retriever::new(embedder, Some(Arc::new(index)));
//!     let found = retriever.retrieve("What is the punishment for murder?", 4).await?;
//!     println!("{}", found.context());
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cleaning;
pub mod config;
pub mod dedup;
pub mod error;
pub mod index;
pub mod indexing;
pub mod knowledge;
pub mod persistence;
pub mod retriever;
pub mod types;

pub use chunking::{Chunker, FixedSizeChunker};
pub use cleaning::{BasicCleaner, Cleaner};
pub use config::{RagConfig, RagConfigBuilder};
pub use error::{RagError, Result};
pub use index::{FlatIndex, HnswIndex, IndexKind, VectorIndex};
pub use indexing::{IndexProgress, IndexStage, Indexer, collect_files};
pub use knowledge::KnowledgeIndex;
pub use persistence::{IndexManifest, Persistence, RkyvPersistence};
pub use retriever::{RetrievalResult, Retriever};
pub use types::{Chunk, Document, IndexEntry, Metadata, SearchResult};
