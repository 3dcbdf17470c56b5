//! # Language Models
//!
//! Provider-agnostic text generation. The answer formatter builds a single
//! [`LLMRequest`] (system instructions plus the user prompt) and awaits the complete reply;
//! nothing in the pipeline needs token streaming or tool calls.
//!
//! ```rust
//! use nyaya_core::llm::{LanguageModel, model::Parameters, oneshot};
//!
//! async fn ask<M: LanguageModel>(model: &M) -> Result<String, M::Error> {
//!     let request = oneshot(
//!         "You answer questions about the Indian Penal Code.",
//!         "What is Section 302 IPC?",
//!     )
//!     .with_parameters(Parameters::default().temperature(0.3).max_tokens(500));
//!
//!     model.respond(request).await
//! }
//! ```

/// Message types.
pub mod message;
/// Sampling parameters.
pub mod model;

use alloc::{boxed::Box, string::String, sync::Arc, vec, vec::Vec};
use core::future::Future;

pub use message::{Message, Role};
use model::Parameters;

/// A request passed into [`LanguageModel::respond`].
#[derive(Debug, Clone, PartialEq)]
pub struct LLMRequest {
    messages: Vec<Message>,
    parameters: Parameters,
}

impl LLMRequest {
    /// Creates a request from the provided messages using default parameters.
    pub fn new(messages: impl Into<Vec<Message>>) -> Self {
        Self {
            messages: messages.into(),
            parameters: Parameters::default(),
        }
    }

    /// Overrides the sampling parameters used for this call.
    #[must_use]
    pub const fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Returns the request messages.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the current parameter snapshot.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Concatenates every system message, separated by blank lines.
    #[must_use]
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|message| message.role() == Role::System)
            .map(Message::content)
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// Breaks the request into owned components.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Message>, Parameters) {
        (self.messages, self.parameters)
    }
}

/// Language models for text generation.
pub trait LanguageModel: Sized + Send + Sync {
    /// The error type returned by this language model.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Generates the complete response to a request.
    fn respond(&self, request: LLMRequest) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Returns the identifier of the underlying model.
    fn model_id(&self) -> &str;
}

macro_rules! impl_language_model {
    ($($name:ident),*) => {
        $(
            impl<T: LanguageModel> LanguageModel for $name<T> {
                type Error = T::Error;

                fn respond(
                    &self,
                    request: LLMRequest,
                ) -> impl Future<Output = Result<String, Self::Error>> + Send {
                    T::respond(self, request)
                }

                fn model_id(&self) -> &str {
                    T::model_id(self)
                }
            }
        )*
    };
}

impl<T: LanguageModel> LanguageModel for &T {
    type Error = T::Error;

    fn respond(&self, request: LLMRequest) -> impl Future<Output = Result<String, Self::Error>> + Send {
        T::respond(self, request)
    }

    fn model_id(&self) -> &str {
        T::model_id(self)
    }
}

impl_language_model!(Arc, Box);

/// Convenience helper that creates a single system + user [`LLMRequest`].
pub fn oneshot(system: impl Into<String>, user: impl Into<String>) -> LLMRequest {
    let messages = vec![Message::system(system.into()), Message::user(user.into())];
    LLMRequest::new(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use core::convert::Infallible;

    struct Echo;

    impl LanguageModel for Echo {
        type Error = Infallible;

        async fn respond(&self, request: LLMRequest) -> Result<String, Self::Error> {
            Ok(request
                .messages()
                .last()
                .map(|message| message.content().to_string())
                .unwrap_or_default())
        }

        fn model_id(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn oneshot_orders_system_first() {
        let request = oneshot("rules", "question");
        assert_eq!(request.messages().len(), 2);
        assert_eq!(request.messages()[0].role(), Role::System);
        assert_eq!(request.messages()[1].content(), "question");
        assert_eq!(request.system_prompt().as_deref(), Some("rules"));
    }

    #[test]
    fn system_prompt_absent_without_system_messages() {
        let request = LLMRequest::new(vec![Message::user("hi")]);
        assert!(request.system_prompt().is_none());
    }

    #[tokio::test]
    async fn boxed_and_shared_models_delegate() {
        let boxed = Box::new(Echo);
        assert_eq!(boxed.respond(oneshot("s", "u")).await.unwrap(), "u");
        let shared = Arc::new(Echo);
        assert_eq!(shared.model_id(), "echo");
    }

    #[test]
    fn parameters_survive_into_parts() {
        let request = oneshot("s", "u").with_parameters(Parameters::default().max_tokens(10));
        let (messages, parameters) = request.into_parts();
        assert_eq!(messages.len(), 2);
        assert_eq!(parameters.max_tokens, Some(10));
    }
}
