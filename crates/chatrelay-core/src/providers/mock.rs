//! Mock provider for testing
//!
//! Produces deterministic, configurable delta streams without network
//! dependencies. Used by the dispatcher tests and exported for downstream
//! test use.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatProvider, ProviderConfig, StreamResponse};
use crate::logging::Logger;
use crate::types::{CancellationToken, ProviderMetadata};

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the prompt
    #[default]
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Return response as specific chunks
    Chunks(Vec<String>),
    /// Fail after yielding the given number of chunks
    Error { message: String, delay_chunks: usize },
    /// Return nothing (empty response)
    Empty,
}

/// Configuration for the mock provider
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Response mode
    pub mode: MockMode,
    /// Delay between chunks in milliseconds (0 = no delay)
    pub chunk_delay_ms: u64,
    /// Size of each chunk when splitting fixed/echo responses
    pub chunk_size: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            mode: MockMode::Echo,
            chunk_delay_ms: 0,
            chunk_size: 10,
        }
    }
}

/// Mock chat provider for testing
pub struct MockProvider {
    config: MockConfig,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create a new mock provider with default config
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            config: MockConfig::default(),
            logger,
        }
    }

    /// Create with specific config
    pub fn with_config(config: MockConfig, logger: Arc<dyn Logger>) -> Self {
        Self { config, logger }
    }

    /// Create an echo provider (echoes back the prompt)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Echo,
                ..Default::default()
            },
            logger,
        )
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Fixed(response.into()),
                ..Default::default()
            },
            logger,
        )
    }

    /// Create a chunked response provider
    pub fn chunked(chunks: Vec<String>, delay_ms: u64, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Chunks(chunks),
                chunk_delay_ms: delay_ms,
                ..Default::default()
            },
            logger,
        )
    }

    /// Create an error-producing provider
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Error {
                    message: message.into(),
                    delay_chunks: 0,
                },
                ..Default::default()
            },
            logger,
        )
    }

    /// Set chunk delay
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.config.chunk_delay_ms = delay_ms;
        self
    }

    /// Set chunk size for splitting responses
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Split text into chunks
    fn split_into_chunks(&self, text: &str) -> Vec<String> {
        if self.config.chunk_size == 0 || text.is_empty() {
            return vec![text.to_string()];
        }

        text.chars()
            .collect::<Vec<_>>()
            .chunks(self.config.chunk_size)
            .map(|chunk| chunk.iter().collect())
            .collect()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_api_base(&self) -> &str {
        "http://localhost:0/mock"
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: "mock".to_string(),
            display_name: "Mock Provider".to_string(),
            default_api_base: self.default_api_base().to_string(),
            requires_api_key: false,
            default_models: vec!["mock-echo".to_string(), "mock-fixed".to_string()],
        }
    }

    async fn stream_chat(
        &self,
        prompt: &str,
        _config: &ProviderConfig,
        _streaming: bool,
        cancel: CancellationToken,
    ) -> ProviderResult<StreamResponse> {
        self.logger.debug("MockProvider: stream_chat called");

        let items: Vec<ProviderResult<String>> = match &self.config.mode {
            MockMode::Echo => self
                .split_into_chunks(&format!("Echo: {prompt}"))
                .into_iter()
                .map(Ok)
                .collect(),
            MockMode::Fixed(response) => self
                .split_into_chunks(response)
                .into_iter()
                .map(Ok)
                .collect(),
            MockMode::Chunks(chunks) => chunks.iter().cloned().map(Ok).collect(),
            MockMode::Empty => vec![],
            MockMode::Error {
                message,
                delay_chunks,
            } => {
                let mut items: Vec<ProviderResult<String>> = (0..*delay_chunks)
                    .map(|i| Ok(format!("Chunk {i} before error. ")))
                    .collect();
                items.push(Err(ProviderError::transport("mock", message)));
                items
            }
        };

        let delay_ms = self.config.chunk_delay_ms;

        let stream = stream::iter(items.into_iter().enumerate()).then(move |(i, item)| {
            let cancel = cancel.clone();
            async move {
                if cancel.is_cancelled() {
                    return Err(ProviderError::Cancelled);
                }
                if i > 0 && delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                item
            }
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    fn test_logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    fn test_config() -> ProviderConfig {
        ProviderConfig::new("mock-echo")
    }

    async fn collect(mut stream: StreamResponse) -> ProviderResult<Vec<String>> {
        let mut chunks = Vec::new();
        while let Some(item) = stream.next().await {
            chunks.push(item?);
        }
        Ok(chunks)
    }

    #[tokio::test]
    async fn test_echo_mode() {
        let provider = MockProvider::echo(test_logger());
        let cancel = CancellationToken::new();

        let stream = provider
            .stream_chat("Hello, world!", &test_config(), true, cancel)
            .await
            .expect("stream should start");

        let text = collect(stream).await.expect("chunks should succeed").concat();
        assert_eq!(text, "Echo: Hello, world!");
    }

    #[tokio::test]
    async fn test_fixed_mode() {
        let provider = MockProvider::fixed("This is a test response.", test_logger());
        let cancel = CancellationToken::new();

        let stream = provider
            .stream_chat("Anything", &test_config(), true, cancel)
            .await
            .expect("stream should start");

        let text = collect(stream).await.expect("chunks should succeed").concat();
        assert_eq!(text, "This is a test response.");
    }

    #[tokio::test]
    async fn test_chunked_mode() {
        let chunks = vec![
            "First ".to_string(),
            "second ".to_string(),
            "third.".to_string(),
        ];
        let provider = MockProvider::chunked(chunks.clone(), 0, test_logger());
        let cancel = CancellationToken::new();

        let stream = provider
            .stream_chat("Anything", &test_config(), true, cancel)
            .await
            .expect("stream should start");

        let received = collect(stream).await.expect("chunks should succeed");
        assert_eq!(received, chunks);
    }

    #[tokio::test]
    async fn test_empty_mode() {
        let provider = MockProvider::with_config(
            MockConfig {
                mode: MockMode::Empty,
                ..Default::default()
            },
            test_logger(),
        );
        let cancel = CancellationToken::new();

        let stream = provider
            .stream_chat("Anything", &test_config(), true, cancel)
            .await
            .expect("stream should start");

        let received = collect(stream).await.expect("no chunks expected");
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn test_error_mode() {
        let provider = MockProvider::error("Test error message", test_logger());
        let cancel = CancellationToken::new();

        let mut stream = provider
            .stream_chat("Anything", &test_config(), true, cancel)
            .await
            .expect("stream should start");

        let result = stream.next().await;
        assert!(result.is_some());
        assert!(result.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_cancellation_between_chunks() {
        let provider =
            MockProvider::fixed("Long response that should be cancelled", test_logger())
                .with_delay(50);
        let cancel = CancellationToken::new();

        let mut stream = provider
            .stream_chat("Anything", &test_config(), true, cancel.clone())
            .await
            .expect("stream should start");

        let first = stream.next().await.expect("first chunk");
        assert!(first.is_ok());

        cancel.cancel();

        let next = stream.next().await.expect("cancellation item");
        assert!(matches!(next, Err(ProviderError::Cancelled)));
    }

    #[test]
    fn test_chunk_splitting() {
        let provider = MockProvider::new(Arc::new(NoOpLogger)).with_chunk_size(5);
        let chunks = provider.split_into_chunks("Hello, world!");

        assert_eq!(chunks, vec!["Hello", ", wor", "ld!"]);
    }
}
