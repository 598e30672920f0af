//! Provider trait definition

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use super::error::ProviderResult;
use crate::types::{CancellationToken, ProviderMetadata};

/// Per-call credential/model bundle for a provider request
///
/// Owned by the caller and passed by reference into each request; the
/// dispatcher never mutates it. An empty API key is permitted and means
/// "unauthenticated" (the server rejects it, the client does not).
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Model identifier as used by the provider's API; free-form, not
    /// validated against a fixed list
    pub model: String,
    /// API key for authentication; `None` for providers without auth
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
}

impl ProviderConfig {
    /// Create a new config for a model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_base: None,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }
}

/// Type alias for the streaming response
///
/// Items are text *deltas*; the dispatcher owns accumulation into the
/// cumulative text handed to the caller's sink.
pub type StreamResponse = Pin<Box<dyn Stream<Item = ProviderResult<String>> + Send>>;

/// Provider trait for chat backend adapters
///
/// Each adapter translates the dispatcher's generic request into its
/// backend's wire format and back.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "ollama")
    fn name(&self) -> &str;

    /// Get the default API base URL
    fn default_api_base(&self) -> &str;

    /// Get provider metadata
    fn metadata(&self) -> ProviderMetadata;

    /// Send one prompt and stream the response as text deltas
    ///
    /// `streaming` is whether the caller supplied a sink: it selects the
    /// wire-level stream mode where the backend has one, and client-side
    /// simulation where it does not. Adapters observe `cancel` at request
    /// initiation and at every subsequent read.
    async fn stream_chat(
        &self,
        prompt: &str,
        config: &ProviderConfig,
        streaming: bool,
        cancel: CancellationToken,
    ) -> ProviderResult<StreamResponse>;

    /// Resolve the API base URL, preferring the per-call override
    fn api_base(&self, config: &ProviderConfig) -> String {
        config
            .api_base
            .clone()
            .unwrap_or_else(|| self.default_api_base().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_builder() {
        let config = ProviderConfig::new("gpt-4")
            .with_api_key("sk-test")
            .with_api_base("http://localhost:8080");

        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.api_base.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_empty_api_key_is_preserved() {
        // Empty string means "unauthenticated", not "absent"
        let config = ProviderConfig::new("gpt-4").with_api_key("");
        assert_eq!(config.api_key.as_deref(), Some(""));
    }
}
