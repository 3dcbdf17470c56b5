use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    config::{AuthMode, GeminiConfig, USER_AGENT},
    error::GeminiError,
    types::{
        BatchEmbedContentsRequest, BatchEmbedContentsResponse, EmbedContentRequest,
        EmbedContentResponse, GenerateContentRequest, GenerateContentResponse,
    },
};

const BASE_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

pub(crate) async fn call_generate(
    cfg: &GeminiConfig,
    request: &GenerateContentRequest,
) -> Result<GenerateContentResponse, GeminiError> {
    post_json(
        cfg,
        &cfg.model_endpoint(&cfg.text_model, "generateContent"),
        request,
    )
    .await
}

pub(crate) async fn embed_content(
    cfg: &GeminiConfig,
    request: &EmbedContentRequest,
) -> Result<EmbedContentResponse, GeminiError> {
    post_json(
        cfg,
        &cfg.model_endpoint(&cfg.embedding_model, "embedContent"),
        request,
    )
    .await
}

pub(crate) async fn batch_embed_contents(
    cfg: &GeminiConfig,
    request: &BatchEmbedContentsRequest,
) -> Result<BatchEmbedContentsResponse, GeminiError> {
    post_json(
        cfg,
        &cfg.model_endpoint(&cfg.embedding_model, "batchEmbedContents"),
        request,
    )
    .await
}

/// Posts `body`, retrying retryable failures with exponential backoff.
async fn post_json<T: DeserializeOwned, S: Serialize + Sync>(
    cfg: &GeminiConfig,
    endpoint: &str,
    body: &S,
) -> Result<T, GeminiError> {
    let mut attempt = 0;
    loop {
        match post_once(cfg, endpoint, body).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < cfg.max_retries => {
                let delay = backoff(attempt, err.retry_delay_secs());
                tracing::warn!(attempt, ?delay, error = %err, "retrying Gemini request");
                async_io::Timer::after(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn post_once<T: DeserializeOwned, S: Serialize + Sync>(
    cfg: &GeminiConfig,
    endpoint: &str,
    body: &S,
) -> Result<T, GeminiError> {
    let mut request = cfg
        .client
        .post(endpoint)
        .timeout(cfg.timeout)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .json(body);
    if cfg.auth == AuthMode::Header {
        request = request.header("x-goog-api-key", &cfg.api_key);
    }

    let response = request
        .send()
        .await
        .map_err(|err| GeminiError::from_transport(err, cfg.timeout))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| GeminiError::from_transport(err, cfg.timeout))?;
    tracing::debug!(status = status.as_u16(), bytes = text.len(), "Gemini response");

    if !status.is_success() {
        return Err(GeminiError::from_status(status.as_u16(), &text));
    }
    Ok(serde_json::from_str(&text)?)
}

fn backoff(attempt: u32, hinted_secs: Option<u64>) -> Duration {
    hinted_secs.map_or_else(
        || BASE_BACKOFF.saturating_mul(2u32.saturating_pow(attempt)),
        Duration::from_secs,
    )
    .min(MAX_BACKOFF)
}
