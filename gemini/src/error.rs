use std::time::Duration;

use nyaya_core::ProviderError;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised by the Gemini backend.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// The request could not be sent or the response body could not be read.
    #[error("request failed: {0}")]
    Http(#[source] reqwest::Error),
    /// The API answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body, or a generic description.
        message: String,
    },
    /// The API rejected the request for exceeding a quota.
    #[error("{message}{}", .retry_after_secs.map(|s| format!(" (retry after {s}s)")).unwrap_or_default())]
    RateLimit {
        /// Message extracted from the error body.
        message: String,
        /// Suggested wait before retrying, when the API provides one.
        retry_after_secs: Option<u64>,
    },
    /// No response within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// The response body was not the JSON we expected.
    #[error("invalid response format: {0}")]
    Json(#[from] serde_json::Error),
    /// The API answered but the answer is unusable (blocked, empty, wrong count).
    #[error("{0}")]
    Api(String),
}

impl GeminiError {
    /// Returns `true` for failures worth retrying: rate limits, server errors,
    /// timeouts and connection problems.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_connect() || err.is_timeout(),
            Self::Status { status, .. } => *status == 408 || *status >= 500,
            Self::RateLimit { .. } | Self::Timeout(_) => true,
            Self::Json(_) | Self::Api(_) => false,
        }
    }

    /// Suggested retry delay in seconds.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimit {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }

    /// Classifies a transport error. The URL is dropped because it may carry the API key.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Http(err.without_url())
        }
    }

    /// Builds the error for a non-success response.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorResponse>(body).ok();
        if status == 429 {
            return Self::RateLimit {
                message: parsed
                    .as_ref()
                    .map_or_else(|| "Rate limit exceeded".to_string(), ApiErrorResponse::friendly_message),
                retry_after_secs: parsed.as_ref().and_then(ApiErrorResponse::retry_delay_secs),
            };
        }
        let message = parsed.map_or_else(|| status_message(status), |api| api.friendly_message());
        Self::Status { status, message }
    }
}

impl From<GeminiError> for ProviderError {
    fn from(error: GeminiError) -> Self {
        match error {
            GeminiError::Timeout(after) => Self::Timeout(after),
            GeminiError::Json(_) | GeminiError::Api(_) => Self::rejected(error.to_string()),
            GeminiError::Status { status, .. } if (400..500).contains(&status) && status != 408 => {
                Self::rejected(error.to_string())
            }
            other => Self::unavailable(other.to_string()),
        }
    }
}

fn status_message(status: u16) -> String {
    match status {
        400 => "Invalid request".to_string(),
        401 => "Authentication failed - check your API key".to_string(),
        403 => "Access denied - check your API key permissions".to_string(),
        404 => "Model not found".to_string(),
        500 => "Server error - please try again".to_string(),
        502..=504 => "Service temporarily unavailable - please try again".to_string(),
        _ => format!("HTTP error {status}"),
    }
}

/// Gemini API error body.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ApiErrorInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiErrorInfo {
    QuotaFailure {
        #[serde(rename = "@type")]
        type_url: String,
        violations: Vec<QuotaViolation>,
    },
    RetryInfo {
        #[serde(rename = "retryDelay")]
        retry_delay: String,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuotaViolation {
    quota_id: Option<String>,
    quota_value: Option<String>,
}

impl ApiErrorResponse {
    fn friendly_message(&self) -> String {
        let Some(error) = &self.error else {
            return "Unknown API error".to_string();
        };

        for detail in &error.details {
            if let ApiErrorInfo::QuotaFailure {
                type_url,
                violations,
            } = detail
                && type_url.contains("QuotaFailure")
                && let Some(violation) = violations.first()
            {
                let quota_id = violation.quota_id.as_deref().unwrap_or("unknown");
                let quota_value = violation.quota_value.as_deref().unwrap_or("?");
                return format!("Rate limit exceeded: {quota_id} (limit: {quota_value})");
            }
        }

        error
            .message
            .clone()
            .or_else(|| error.status.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    /// Parses the `"20s"` style delay from a `RetryInfo` detail.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn retry_delay_secs(&self) -> Option<u64> {
        self.error.as_ref()?.details.iter().find_map(|detail| match detail {
            ApiErrorInfo::RetryInfo { retry_delay } => {
                let seconds = retry_delay.trim_end_matches('s');
                seconds
                    .parse::<u64>()
                    .ok()
                    .or_else(|| seconds.parse::<f64>().ok().map(|s| s.ceil() as u64))
            }
            _ => None,
        })
    }
}
