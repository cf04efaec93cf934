//! Error types for the AI provider clients.

use thiserror::Error;

/// Errors that can occur when calling the chat or speech providers.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The feature has no API key configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// The HTTP client could not be built.
    #[error("client setup failed: {0}")]
    Setup(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an error.
    #[error("API error ({error_type}): {message}")]
    Api {
        /// Error type from the API.
        error_type: String,
        /// Error message.
        message: String,
    },

    /// Rate limited by the provider.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication with the provider failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse the provider's response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The caller's input can't be sent.
    #[error("{0}")]
    InvalidInput(String),
}

/// Error body shared by the Anthropic and `OpenAI` APIs.
///
/// Anthropic wraps it as `{"type": "error", "error": {...}}`, `OpenAI` as
/// `{"error": {...}}`.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Nested error details.
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// Error type.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Error message.
    pub message: String,
}

/// Map a non-success provider response to an error.
pub(crate) async fn error_from_response(response: reqwest::Response) -> AssistantError {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return AssistantError::RateLimited(retry_after);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return AssistantError::Unauthorized("Invalid API key".to_string());
    }

    match response.text().await {
        Ok(body) => parse_error_body(status, &body),
        Err(e) => AssistantError::Http(e),
    }
}

fn parse_error_body(status: reqwest::StatusCode, body: &str) -> AssistantError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_error) => AssistantError::Api {
            error_type: api_error
                .error
                .error_type
                .unwrap_or_else(|| status.as_u16().to_string()),
            message: api_error.error.message,
        },
        Err(_) => AssistantError::Api {
            error_type: status.as_u16().to_string(),
            message: body.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_error_display() {
        let err = AssistantError::RateLimited(60);
        assert_eq!(err.to_string(), "rate limited, retry after 60 seconds");

        let err = AssistantError::NotConfigured("chat assistant");
        assert_eq!(err.to_string(), "chat assistant is not configured");
    }

    #[test]
    fn test_anthropic_error_body() {
        let body = r#"{
            "type": "error",
            "error": {
                "type": "invalid_request_error",
                "message": "max_tokens is too large"
            }
        }"#;

        let err = parse_error_body(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(
            err.to_string(),
            "API error (invalid_request_error): max_tokens is too large"
        );
    }

    #[test]
    fn test_openai_error_body_without_type() {
        let body = r#"{"error": {"message": "Invalid file format.", "param": null}}"#;
        let err = parse_error_body(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(err.to_string(), "API error (400): Invalid file format.");
    }

    #[test]
    fn test_unparseable_error_body() {
        let err = parse_error_body(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "API error (502): upstream down");
    }
}
