//! Test doubles shared by the unit tests.

use std::time::Duration;

use nyaya_core::{EmbeddingModel, LanguageModel, llm::LLMRequest};
use nyaya_rag::{Chunk, RetrievalResult, SearchResult};
use parking_lot::Mutex;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ScriptedError(String);

/// Language model that replays one reply and records every request.
pub struct Scripted {
    reply: Result<String, String>,
    delay: Option<Duration>,
    requests: Mutex<Vec<LLMRequest>>,
}

impl Scripted {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn last_request(&self) -> Option<LLMRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

impl LanguageModel for Scripted {
    type Error = ScriptedError;

    async fn respond(&self, request: LLMRequest) -> Result<String, Self::Error> {
        self.requests.lock().push(request);
        if let Some(delay) = self.delay {
            async_io::Timer::after(delay).await;
        }
        self.reply.clone().map_err(ScriptedError)
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Embeds by keyword so tests can steer retrieval: burial and trespass text points one
/// way, murder text another, everything else a third.
pub struct Keywords;

impl EmbeddingModel for Keywords {
    fn dim(&self) -> usize {
        3
    }

    fn model_id(&self) -> &str {
        "keywords"
    }

    async fn embed(&self, text: &str) -> nyaya_core::Result<Vec<f32>> {
        let text = text.to_lowercase();
        Ok(if text.contains("burial") || text.contains("trespass") {
            vec![1.0, 0.0, 0.0]
        } else if text.contains("murder") {
            vec![0.0, 1.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        })
    }
}

#[allow(clippy::cast_precision_loss)]
pub fn retrieval(texts: &[&str]) -> RetrievalResult {
    RetrievalResult {
        results: texts
            .iter()
            .enumerate()
            .map(|(i, text)| SearchResult {
                chunk: Chunk::new("ipc.pdf", i, i * 100, *text),
                score: 1.0 - i as f32 * 0.1,
            })
            .collect(),
    }
}
