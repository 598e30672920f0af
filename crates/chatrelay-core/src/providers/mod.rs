//! Chat backend adapters
//!
//! Each adapter translates the dispatcher's generic request into one
//! backend's wire format and normalizes the response into a stream of text
//! deltas. The wire contracts are reproduced exactly; see the individual
//! modules for the per-provider framing.

mod error;
mod gemini;
mod lines;
mod mock;
mod ollama;
mod openai;
mod traits;

// Core traits and types
pub use error::{ProviderError, ProviderResult};
pub use traits::{ChatProvider, ProviderConfig, StreamResponse};

// Adapters
pub use gemini::GeminiProvider;
pub use ollama::{OllamaModel, OllamaProvider};
pub use openai::OpenAiProvider;

// Mock provider for testing
pub use mock::{MockConfig, MockMode, MockProvider};

// Re-export for convenience
pub use crate::types::{CancellationToken, ProviderKind};

use crate::logging::Logger;
use std::sync::Arc;

/// Create the adapter for the given provider
///
/// Adapters share the dispatcher's HTTP client and logger.
pub fn create_provider(
    kind: ProviderKind,
    http: reqwest::Client,
    logger: Arc<dyn Logger>,
) -> Box<dyn ChatProvider> {
    match kind {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(http, logger)),
        ProviderKind::Gemini => Box::new(GeminiProvider::new(http, logger)),
        ProviderKind::Ollama => Box::new(OllamaProvider::new(http, logger)),
    }
}
