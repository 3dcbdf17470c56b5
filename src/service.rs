//! The query-time service: retrieval plus structured generation behind one call.

use std::{fmt, path::Path, sync::Arc};

use nyaya_core::{EmbeddingModel, LanguageModel};
use nyaya_rag::{KnowledgeIndex, RagConfig, RetrievalResult, Retriever};
use parking_lot::RwLock;

use crate::answer::AnswerFormatter;

/// Whether the assistant can answer grounded questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// An index is loaded.
    Ready {
        /// Chunks in the loaded index.
        chunks: usize,
        /// Embedding model the index was built with.
        model: String,
    },
    /// No usable index.
    Unavailable {
        /// Why the index could not be used.
        reason: String,
    },
}

impl Readiness {
    /// Returns `true` for [`Readiness::Ready`].
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready { chunks, model } => {
                write!(f, "ready: {chunks} chunks embedded with {model}")
            }
            Self::Unavailable { reason } => write!(f, "knowledge base unavailable: {reason}"),
        }
    }
}

enum IndexState {
    Loaded(Arc<KnowledgeIndex>),
    Missing(String),
}

/// Answers legal questions over a persisted [`KnowledgeIndex`].
///
/// The index sits behind a lock that is held only long enough to clone an `Arc`, so
/// [`replace_index`](Self::replace_index) never waits for in-flight questions.
pub struct LegalAssistant<M, L> {
    embedder: Arc<M>,
    formatter: AnswerFormatter<L>,
    state: RwLock<IndexState>,
    top_k: usize,
    threshold: f32,
    allow_ungrounded: bool,
}

impl<M, L: LanguageModel> fmt::Debug for LegalAssistant<M, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegalAssistant")
            .field("formatter", &self.formatter)
            .field("top_k", &self.top_k)
            .field("threshold", &self.threshold)
            .field("allow_ungrounded", &self.allow_ungrounded)
            .finish_non_exhaustive()
    }
}

impl<M: EmbeddingModel, L: LanguageModel> LegalAssistant<M, L> {
    /// Creates an assistant with no index loaded.
    #[must_use]
    pub fn new(embedder: Arc<M>, formatter: AnswerFormatter<L>, config: &RagConfig) -> Self {
        Self {
            embedder,
            formatter,
            state: RwLock::new(IndexState::Missing("no index has been loaded".into())),
            top_k: config.top_k,
            threshold: config.similarity_threshold,
            allow_ungrounded: false,
        }
    }

    /// Creates an assistant and loads the index persisted in `dir`.
    ///
    /// A missing, corrupt or incompatible index does not fail construction; it is
    /// reported through [`readiness`](Self::readiness).
    #[must_use]
    pub fn open(
        dir: impl AsRef<Path>,
        embedder: Arc<M>,
        formatter: AnswerFormatter<L>,
        config: &RagConfig,
    ) -> Self {
        let assistant = Self::new(embedder, formatter, config);
        match KnowledgeIndex::open(dir.as_ref(), assistant.embedder.as_ref()) {
            Ok(index) => assistant.replace_index(Arc::new(index)),
            Err(error) => {
                tracing::warn!(%error, "knowledge base unavailable");
                *assistant.state.write() = IndexState::Missing(error.to_string());
            }
        }
        assistant
    }

    /// Answers even without an index, from the model's general knowledge.
    #[must_use]
    pub const fn ungrounded(mut self) -> Self {
        self.allow_ungrounded = true;
        self
    }

    /// Swaps in a freshly built index.
    pub fn replace_index(&self, index: Arc<KnowledgeIndex>) {
        tracing::info!(chunks = index.len(), "knowledge base loaded");
        *self.state.write() = IndexState::Loaded(index);
    }

    /// Reports whether an index is loaded.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        match &*self.state.read() {
            IndexState::Loaded(index) => Readiness::Ready {
                chunks: index.len(),
                model: index.manifest().embedding.model.clone(),
            },
            IndexState::Missing(reason) => Readiness::Unavailable {
                reason: reason.clone(),
            },
        }
    }

    /// Answers `question` with the structured IPC layout.
    ///
    /// Always returns displayable text. Without an index the answer is a not-ready
    /// message unless [`ungrounded`](Self::ungrounded) was set. Retrieval failures fall
    /// back to an ungrounded answer; generation failures become a failure message.
    pub async fn answer(&self, question: &str) -> String {
        let index = match &*self.state.read() {
            IndexState::Loaded(index) => Some(Arc::clone(index)),
            IndexState::Missing(reason) if !self.allow_ungrounded => {
                return format!("Error: Knowledge base not ready. {reason}");
            }
            IndexState::Missing(_) => None,
        };

        let retriever =
            Retriever::new(Arc::clone(&self.embedder), index).with_threshold(self.threshold);
        let retrieval = match retriever.retrieve(question, self.top_k).await {
            Ok(retrieval) => retrieval,
            Err(error) => {
                tracing::warn!(%error, "retrieval failed, answering without context");
                RetrievalResult::empty()
            }
        };
        self.formatter.format(&retrieval, question).await
    }
}
