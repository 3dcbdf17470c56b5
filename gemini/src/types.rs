//! Wire types for the Gemini REST API (camelCase JSON).

use serde::{Deserialize, Serialize};

use crate::config::sanitize_model;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) system_instruction: Option<GeminiContent>,
    pub(crate) contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) role: Option<String>,
    #[serde(default)]
    pub(crate) parts: Vec<Part>,
}

impl GeminiContent {
    pub(crate) fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            parts: vec![Part::text(text)],
        }
    }

    /// Content without a role, as `systemInstruction` and embedding inputs expect.
    pub(crate) fn unattributed(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }

    /// Visible answer text, skipping thought summaries.
    pub(crate) fn answer_text(&self) -> String {
        self.parts
            .iter()
            .filter(|part| !part.thought.unwrap_or(false))
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) thought: Option<bool>,
}

impl Part {
    pub(crate) fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    pub(crate) const fn is_meaningful(&self) -> bool {
        self.temperature.is_some() || self.top_p.is_some() || self.max_output_tokens.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    pub(crate) fn primary_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub(crate) content: Option<GeminiContent>,
    pub(crate) finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub(crate) block_reason: Option<String>,
}

/// Whether a text is stored in the index or used to search it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    RetrievalQuery,
    RetrievalDocument,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedContentRequest {
    pub(crate) model: String,
    pub(crate) content: GeminiContent,
    pub(crate) task_type: TaskType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) output_dimensionality: Option<usize>,
}

impl EmbedContentRequest {
    pub(crate) fn new(
        model: &str,
        text: impl Into<String>,
        task_type: TaskType,
        dimensions: usize,
    ) -> Self {
        Self {
            model: sanitize_model(model),
            content: GeminiContent::unattributed(text),
            task_type,
            output_dimensionality: Some(dimensions),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEmbedContentsRequest {
    pub(crate) requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbedContentResponse {
    pub(crate) embedding: ContentEmbedding,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchEmbedContentsResponse {
    #[serde(default)]
    pub(crate) embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentEmbedding {
    pub(crate) values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generate_request_uses_camel_case() {
        let request = GenerateContentRequest {
            system_instruction: Some(GeminiContent::unattributed("Answer about the IPC.")),
            contents: vec![GeminiContent::text("user", "What is Section 302?")],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.5),
                top_p: None,
                max_output_tokens: Some(500),
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "systemInstruction": {"parts": [{"text": "Answer about the IPC."}]},
                "contents": [{"role": "user", "parts": [{"text": "What is Section 302?"}]}],
                "generationConfig": {"temperature": 0.5, "maxOutputTokens": 500}
            })
        );
    }

    #[test]
    fn embed_request_shape() {
        let request =
            EmbedContentRequest::new("gemini-embedding-001", "theft", TaskType::RetrievalQuery, 768);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "models/gemini-embedding-001");
        assert_eq!(value["taskType"], "RETRIEVAL_QUERY");
        assert_eq!(value["outputDimensionality"], 768);
        assert_eq!(value["content"]["parts"][0]["text"], "theft");
    }

    #[test]
    fn answer_text_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "Section 302 IPC: "},
                    {"text": "Punishment for Murder"}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        let candidate = response.primary_candidate().unwrap();
        assert_eq!(
            candidate.content.as_ref().unwrap().answer_text(),
            "Section 302 IPC: Punishment for Murder"
        );
        assert_eq!(candidate.finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn blocked_prompt_has_no_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(response.primary_candidate().is_none());
        assert_eq!(
            response.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }
}
