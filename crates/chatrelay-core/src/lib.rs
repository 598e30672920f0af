//! ChatRelay Core
//!
//! Multi-provider chat dispatch: one `send` call routes a user prompt to an
//! OpenAI-compatible, Gemini, or Ollama backend and normalizes streaming
//! and non-streaming responses into a single cumulative-text callback
//! contract, with one cancellable in-flight request at a time.
//!
//! The host environment (editor extension, CLI, service) supplies the
//! message, provider selection, and per-provider credentials per call;
//! nothing is persisted here.
//!
//! ```rust,ignore
//! use chatrelay_core::{ChatDispatcher, Message, ProviderConfig, ProviderKind};
//!
//! let dispatcher = ChatDispatcher::new(logger);
//! let config = ProviderConfig::new("llama3");
//! let reply = dispatcher
//!     .send(ProviderKind::Ollama, &Message::user("hi"), &config, None)
//!     .await?;
//! ```

pub mod dispatcher;
pub mod logging;
pub mod providers;
pub mod types;

// Re-export commonly used types
pub use dispatcher::{ChatDispatcher, StreamSink};

pub use types::{
    CancellationToken, Message, MessageRole, ProviderKind, ProviderMetadata, UnknownProvider,
};

pub use providers::{
    create_provider, ChatProvider, GeminiProvider, MockConfig, MockMode, MockProvider,
    OllamaModel, OllamaProvider, OpenAiProvider, ProviderConfig, ProviderError, ProviderResult,
    StreamResponse,
};

pub use logging::{ConsoleLogger, Logger, NoOpLogger, SharedLogger};
