use std::time::Duration;

use nyaya_core::{
    LanguageModel,
    llm::{LLMRequest, Message, model::Parameters},
};
use nyaya_rag::RetrievalResult;

use super::{
    layout::{AnswerLayout, strip_preamble},
    section::QuestionKind,
    template::{SYSTEM_PROMPT, user_prompt},
};
use crate::error::GenerationError;

/// Sampling temperature used unless overridden.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
/// Output token limit used unless overridden.
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Renders retrieved chunks and a question into the structured IPC answer.
///
/// One call to [`format`](Self::format) is one request to the language model.
pub struct AnswerFormatter<L> {
    model: L,
    parameters: Parameters,
    timeout: Option<Duration>,
}

impl<L: LanguageModel> std::fmt::Debug for AnswerFormatter<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerFormatter")
            .field("model", &self.model.model_id())
            .field("parameters", &self.parameters)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<L: LanguageModel> AnswerFormatter<L> {
    /// Creates a formatter with temperature 0.3, at most 500 output tokens and no timeout.
    #[must_use]
    pub fn new(model: L) -> Self {
        Self {
            model,
            parameters: Parameters::default()
                .temperature(DEFAULT_TEMPERATURE)
                .max_tokens(DEFAULT_MAX_TOKENS),
            timeout: None,
        }
    }

    /// Replaces the generation parameters.
    #[must_use]
    pub const fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Gives up on the model after `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The language model in use.
    #[must_use]
    pub const fn model(&self) -> &L {
        &self.model
    }

    /// Produces the answer, or a displayable failure message if generation fails.
    pub async fn format(&self, retrieval: &RetrievalResult, question: &str) -> String {
        match self.try_format(retrieval, question).await {
            Ok(answer) => answer,
            Err(error) => {
                tracing::error!(%error, "answer generation failed");
                failure_message(&error)
            }
        }
    }

    /// Produces the answer.
    ///
    /// An empty retrieval is not an error: the model is told to rely on general IPC
    /// knowledge. For questions naming a section, anything the model writes before the
    /// section header is dropped.
    ///
    /// # Errors
    /// [`GenerationError::Provider`] when the model fails, [`GenerationError::Timeout`]
    /// when it exceeds the configured timeout, [`GenerationError::Empty`] when it answers
    /// with nothing.
    pub async fn try_format(
        &self,
        retrieval: &RetrievalResult,
        question: &str,
    ) -> Result<String, GenerationError> {
        let kind = QuestionKind::classify(question);
        if retrieval.is_empty() {
            tracing::info!("no chunks retrieved, answering from general knowledge");
        }
        let request = LLMRequest::new([
            Message::system(SYSTEM_PROMPT),
            Message::user(user_prompt(question, &retrieval.context(), &kind)),
        ])
        .with_parameters(self.parameters);

        tracing::debug!(%kind, chunks = retrieval.len(), model = self.model.model_id(), "generating answer");
        let raw = self.generate(request).await?;

        let answer = match &kind {
            QuestionKind::ExplicitSection { .. } => strip_preamble(&raw),
            QuestionKind::YesNo | QuestionKind::General => raw.trim().to_string(),
        };
        if answer.is_empty() {
            return Err(GenerationError::Empty);
        }
        check_layout(&answer, &kind);
        Ok(answer)
    }

    async fn generate(&self, request: LLMRequest) -> Result<String, GenerationError> {
        let respond = async {
            self.model
                .respond(request)
                .await
                .map_err(|error| GenerationError::provider(&error))
        };
        match self.timeout {
            Some(limit) => {
                futures_lite::future::or(respond, async move {
                    async_io::Timer::after(limit).await;
                    Err(GenerationError::Timeout(limit))
                })
                .await
            }
            None => respond.await,
        }
    }
}

/// The text shown in place of an answer when generation fails.
#[must_use]
pub fn failure_message(error: &GenerationError) -> String {
    format!(
        "Failed to generate an answer due to an internal error. Please try again. Error: {error}"
    )
}

fn check_layout(answer: &str, kind: &QuestionKind) {
    let layout = AnswerLayout::parse(answer);
    let missing = layout.missing();
    if !missing.is_empty() {
        tracing::warn!(?missing, "answer is missing template sections");
    }
    if kind.wants_verdict() && !layout.has_verdict() {
        tracing::warn!("yes/no question answered without a verdict line");
    }
    if let (Some(asked), Some(header)) = (kind.section(), layout.header.as_ref())
        && header.number != asked
    {
        tracing::warn!(asked, answered = %header.number, "answer covers a different section");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Scripted, retrieval};

    const ANSWER_302: &str = "Section 302 IPC: Punishment for murder\n\nExplanation:\nMurder.\n\nKey Details:\n- Intent.\n\nPunishment:\nDeath or imprisonment for life, and fine.\n\nExample Case Study:\n- A kills B.";

    #[tokio::test]
    async fn request_carries_instructions_question_and_context() {
        let model = Scripted::replying(ANSWER_302);
        let formatter = AnswerFormatter::new(&model);
        formatter
            .try_format(&retrieval(&["Section 302.", "Whoever commits murder"]), "What is murder?")
            .await
            .unwrap();

        let request = model.last_request().unwrap();
        assert_eq!(request.system_prompt().as_deref(), Some(SYSTEM_PROMPT));
        let user = request.messages()[1].content();
        assert!(user.contains("Original Question: What is murder?"));
        assert!(user.ends_with("Section 302. Whoever commits murder"));
        assert_eq!(request.parameters().temperature, Some(DEFAULT_TEMPERATURE));
        assert_eq!(request.parameters().max_tokens, Some(DEFAULT_MAX_TOKENS));
    }

    #[tokio::test]
    async fn named_section_answer_starts_with_header() {
        let model = Scripted::replying(format!("Yes, it is murder.\n\n{ANSWER_302}"));
        let answer = AnswerFormatter::new(&model)
            .try_format(&retrieval(&["Section 302."]), "What is Section 302 IPC?")
            .await
            .unwrap();
        assert!(answer.starts_with("Section 302 IPC:"));
        assert!(!answer.starts_with("Yes"));
    }

    #[tokio::test]
    async fn bold_section_header_is_normalised() {
        let model = Scripted::replying(
            "Sure.\n\n**Section 302 IPC:** Punishment for murder\n\nExplanation:\nx",
        );
        let answer = AnswerFormatter::new(&model)
            .try_format(&retrieval(&["Section 302."]), "What is Section 302 IPC?")
            .await
            .unwrap();
        assert_eq!(answer, "Section 302 IPC: Punishment for murder\n\nExplanation:\nx");
    }

    #[tokio::test]
    async fn explanatory_question_gets_no_verdict_directive() {
        let model = Scripted::replying(ANSWER_302);
        AnswerFormatter::new(&model)
            .try_format(&retrieval(&["378. Theft."]), "Can you explain the punishment for theft?")
            .await
            .unwrap();
        let request = model.last_request().unwrap();
        assert!(!request.messages()[1].content().contains("Yes/No line"));
    }

    #[tokio::test]
    async fn yes_no_answer_keeps_verdict() {
        let reply = "Yes, defiling a burial place is an offence under Section 297 IPC.\n\nSection 297 IPC: Trespassing on burial places";
        let model = Scripted::replying(reply);
        let answer = AnswerFormatter::new(&model)
            .try_format(
                &retrieval(&["297. Trespassing on burial places"]),
                "Is it illegal to trespass on a burial ground?",
            )
            .await
            .unwrap();
        assert!(answer.starts_with("Yes"));
        assert!(answer.contains("Section 297 IPC"));
    }

    #[tokio::test]
    async fn empty_retrieval_falls_back_to_general_knowledge() {
        let model = Scripted::replying(ANSWER_302);
        let answer = AnswerFormatter::new(&model)
            .format(&RetrievalResult::empty(), "What is the punishment for murder?")
            .await;
        assert!(answer.starts_with("Section 302 IPC:"));
        let request = model.last_request().unwrap();
        assert!(
            request.messages()[1]
                .content()
                .ends_with(super::super::template::NO_CONTEXT_NOTE)
        );
    }

    #[tokio::test]
    async fn provider_failure_becomes_message() {
        let model = Scripted::failing("quota exhausted");
        let answer = AnswerFormatter::new(&model)
            .format(&retrieval(&["x"]), "What is theft?")
            .await;
        assert_eq!(
            answer,
            "Failed to generate an answer due to an internal error. Please try again. Error: quota exhausted"
        );
    }

    #[tokio::test]
    async fn blank_reply_is_empty_error() {
        let model = Scripted::replying("  \n ");
        let err = AnswerFormatter::new(&model)
            .try_format(&retrieval(&["x"]), "What is theft?")
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::Empty);
    }

    #[tokio::test]
    async fn slow_model_times_out() {
        let model = Scripted::replying(ANSWER_302).with_delay(Duration::from_secs(5));
        let err = AnswerFormatter::new(&model)
            .with_timeout(Duration::from_millis(20))
            .try_format(&retrieval(&["x"]), "What is theft?")
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::Timeout(Duration::from_millis(20)));
    }
}
