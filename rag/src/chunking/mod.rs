//! Text chunking for RAG.
//!
//! This module provides the [`Chunker`] trait and [`FixedSizeChunker`], which splits a
//! document into bounded, overlapping windows measured in characters.

mod fixed;

pub use fixed::FixedSizeChunker;

use crate::error::Result;
use crate::persistence::ChunkingParams;
use crate::types::{Chunk, Document};

/// Trait for text chunking strategies.
///
/// Chunkers split documents into smaller pieces that can be individually
/// embedded and searched.
pub trait Chunker: Send + Sync {
    /// Splits a document into chunks.
    ///
    /// Returns chunks in document order, each with an ID derived from the document ID.
    /// A document with empty text yields no chunks.
    fn chunk(&self, doc: &Document) -> Result<Vec<Chunk>>;

    /// Returns the name of this chunking strategy.
    fn name(&self) -> &'static str;

    /// Window size and overlap, as recorded in an index manifest.
    fn params(&self) -> ChunkingParams;
}
