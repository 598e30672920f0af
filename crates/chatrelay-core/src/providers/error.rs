//! Provider error types

use thiserror::Error;

/// Errors that can occur during provider operations
///
/// Callers match on the variant, not the message text. `Cancelled` is kept
/// distinct so a UI can stop silently instead of rendering an error.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The local service could not be reached at all
    #[error("{provider} is unreachable: {message}")]
    ServiceUnreachable { provider: String, message: String },

    /// Network-level failure talking to a remote backend
    #[error("{provider} transport error: {message}")]
    Transport { provider: String, message: String },

    /// The backend answered with a non-2xx status
    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// A response or stream frame did not match the expected JSON shape
    #[error("invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    /// Request was cancelled
    #[error("Request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Create an API error
    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(provider: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// Create a service-unreachable error
    pub fn unreachable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ServiceUnreachable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(
        provider: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// The HTTP status, when this error carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error was caused by caller cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Cancelled)
    }

    /// Build an API error from a non-2xx response
    ///
    /// The message comes from the JSON error envelope when the body parses
    /// (`error.message`, then `message`, then a bare string `error`), else
    /// the raw body text, else a generic fallback.
    pub async fn from_http_response(provider: &str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Self::api_error(provider, status, resolve_error_message(&body))
    }
}

/// Resolve a non-2xx body to a user-facing message
///
/// Envelope message if the body parses as JSON, else the raw body text,
/// else a generic fallback.
fn resolve_error_message(body: &str) -> String {
    extract_error_message(body)
        .or_else(|| (!body.trim().is_empty()).then(|| body.to_string()))
        .unwrap_or_else(|| "API request failed".to_string())
}

/// Pull a human-readable message out of a JSON error envelope, if any
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    if let Some(error) = value.get("error") {
        if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
            return Some(message.to_string());
        }
        if let Some(message) = error.as_str() {
            return Some(message.to_string());
        }
    }

    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_nested_error_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Incorrect API key provided")
        );
    }

    #[test]
    fn test_extract_string_error_field() {
        let body = r#"{"error": "model 'missing' not found"}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("model 'missing' not found")
        );
    }

    #[test]
    fn test_extract_top_level_message() {
        let body = r#"{"message": "quota exceeded"}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn test_extract_from_plain_text() {
        assert_eq!(extract_error_message("Internal Server Error"), None);
        assert_eq!(extract_error_message(""), None);
    }

    #[test]
    fn test_resolve_plain_text_body_is_surfaced() {
        // A 500 with a non-JSON body keeps the raw text in the message
        assert_eq!(
            resolve_error_message("Internal Server Error"),
            "Internal Server Error"
        );
    }

    #[test]
    fn test_resolve_empty_body_falls_back() {
        assert_eq!(resolve_error_message(""), "API request failed");
        assert_eq!(resolve_error_message("   "), "API request failed");
    }

    #[test]
    fn test_resolve_envelope_wins_over_raw_body() {
        let body = r#"{"error": {"message": "bad key"}, "request_id": "abc"}"#;
        assert_eq!(resolve_error_message(body), "bad key");
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::api_error("openai", 401, "unauthorized");
        assert_eq!(err.to_string(), "openai API error (401): unauthorized");
        assert_eq!(err.status(), Some(401));

        let err = ProviderError::unreachable("ollama", "connection refused");
        assert!(err.to_string().contains("unreachable"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        assert!(ProviderError::Cancelled.is_cancelled());
        assert!(!ProviderError::transport("gemini", "reset by peer").is_cancelled());
    }
}
