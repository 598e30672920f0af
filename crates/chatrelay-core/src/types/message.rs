//! Chat message types

use serde::{Deserialize, Serialize};

use super::model::ProviderKind;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single chat turn
///
/// Immutable once constructed. The dispatcher reads only the outgoing user
/// message's `content`; each request is stateless and no conversation
/// history is sent to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: MessageRole,
    /// The text content of the message
    pub content: String,
    /// Which provider produced this message (assistant turns)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,
    /// ISO-8601 timestamp, supplied by the host UI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Error text attached to a failed turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            provider: None,
            timestamp: None,
            error: None,
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            provider: None,
            timestamp: None,
            error: None,
        }
    }

    /// Set the originating provider
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Attach error text
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let user = Message::user("Hello");
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.content, "Hello");
        assert!(user.provider.is_none());

        let asst = Message::assistant("Hi there!")
            .with_provider(ProviderKind::Ollama)
            .with_timestamp("2024-05-01T12:00:00Z");
        assert_eq!(asst.role, MessageRole::Assistant);
        assert_eq!(asst.provider, Some(ProviderKind::Ollama));
        assert_eq!(asst.timestamp.as_deref(), Some("2024-05-01T12:00:00Z"));
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"content\":\"Hello\""));
        // Unset optional fields are omitted entirely
        assert!(!json.contains("provider"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_error_turn_serialization() {
        let msg = Message::assistant("").with_error("API request failed");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"error\":\"API request failed\""));
    }
}
