use nyaya_core::{
    LanguageModel,
    llm::{LLMRequest, Message, Role, model::Parameters},
};

use crate::{
    client::call_generate,
    config::{GeminiBackend, display_model},
    error::GeminiError,
    types::{GeminiContent, GenerateContentRequest, GenerateContentResponse, GenerationConfig},
};

impl LanguageModel for GeminiBackend {
    type Error = GeminiError;

    async fn respond(&self, request: LLMRequest) -> Result<String, Self::Error> {
        let cfg = self.config();
        let (messages, parameters) = request.into_parts();
        let (system_instruction, contents) = messages_to_gemini(&messages);
        let request = GenerateContentRequest {
            system_instruction,
            contents,
            generation_config: build_generation_config(&parameters),
        };

        let response = call_generate(cfg, &request).await?;
        let text = answer_from(&response)?;
        tracing::debug!(
            model = display_model(&cfg.text_model),
            chars = text.len(),
            "generated answer"
        );
        Ok(text)
    }

    fn model_id(&self) -> &str {
        display_model(&self.config().text_model)
    }
}

fn messages_to_gemini(messages: &[Message]) -> (Option<GeminiContent>, Vec<GeminiContent>) {
    let mut system = String::new();
    let mut contents = Vec::new();
    for message in messages {
        match message.role() {
            Role::System => {
                if !system.is_empty() {
                    system.push_str("\n\n");
                }
                system.push_str(message.content());
            }
            Role::User => contents.push(GeminiContent::text("user", message.content())),
            Role::Assistant => contents.push(GeminiContent::text("model", message.content())),
        }
    }

    let system_instruction = (!system.is_empty()).then(|| GeminiContent::unattributed(system));
    (system_instruction, contents)
}

fn build_generation_config(parameters: &Parameters) -> Option<GenerationConfig> {
    let config = GenerationConfig {
        temperature: parameters.temperature,
        top_p: parameters.top_p,
        max_output_tokens: parameters.max_tokens,
    };
    config.is_meaningful().then_some(config)
}

fn answer_from(response: &GenerateContentResponse) -> Result<String, GeminiError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        return Err(GeminiError::Api(format!("prompt blocked: {reason}")));
    }
    let candidate = response
        .primary_candidate()
        .ok_or_else(|| GeminiError::Api("response contained no candidates".into()))?;
    let text = candidate
        .content
        .as_ref()
        .map(GeminiContent::answer_text)
        .unwrap_or_default();
    if text.trim().is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(GeminiError::Api(format!(
            "empty response (finish reason: {reason})"
        )));
    }
    Ok(text)
}
