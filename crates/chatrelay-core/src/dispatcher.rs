//! Chat dispatcher
//!
//! One `send` call routes a user message to the selected backend adapter
//! and normalizes streaming and non-streaming responses into a single
//! cumulative-text sink contract. At most one request is tracked as
//! in-flight at a time; `abort` cancels whichever request is tracked.

use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;

use crate::logging::Logger;
use crate::providers::{
    create_provider, ChatProvider, OllamaModel, OllamaProvider, ProviderConfig, ProviderError,
    ProviderResult,
};
use crate::types::{CancellationToken, Message, ProviderKind};

/// Callback receiving the cumulative response text so far
///
/// Invoked zero or more times per `send`, strictly in order, each value a
/// prefix-extension of the previous one. The last value equals `send`'s
/// return value.
pub type StreamSink = Box<dyn FnMut(&str) + Send>;

/// Routes chat requests to provider adapters
///
/// Construct one instance at application start and pass it to whatever
/// needs to send chat requests; there is no global accessor.
pub struct ChatDispatcher {
    logger: Arc<dyn Logger>,
    http: reqwest::Client,
    openai: Box<dyn ChatProvider>,
    gemini: Box<dyn ChatProvider>,
    ollama: Box<dyn ChatProvider>,
    /// The single in-flight slot. Replaced wholesale on each dispatch, so
    /// an abort always targets the most recent call even on a
    /// multi-threaded host.
    inflight: Mutex<Option<CancellationToken>>,
}

impl ChatDispatcher {
    /// Create a dispatcher with the default adapters
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        let http = reqwest::Client::new();
        Self {
            openai: create_provider(ProviderKind::OpenAi, http.clone(), Arc::clone(&logger)),
            gemini: create_provider(ProviderKind::Gemini, http.clone(), Arc::clone(&logger)),
            ollama: create_provider(ProviderKind::Ollama, http.clone(), Arc::clone(&logger)),
            inflight: Mutex::new(None),
            http,
            logger,
        }
    }

    /// Replace the adapter for one provider (used by tests)
    pub fn with_provider(mut self, kind: ProviderKind, provider: Box<dyn ChatProvider>) -> Self {
        match kind {
            ProviderKind::OpenAi => self.openai = provider,
            ProviderKind::Gemini => self.gemini = provider,
            ProviderKind::Ollama => self.ollama = provider,
        }
        self
    }

    fn provider(&self, kind: ProviderKind) -> &dyn ChatProvider {
        match kind {
            ProviderKind::OpenAi => self.openai.as_ref(),
            ProviderKind::Gemini => self.gemini.as_ref(),
            ProviderKind::Ollama => self.ollama.as_ref(),
        }
    }

    /// Send one user message and return the final assistant text
    ///
    /// When `sink` is given, the cumulative text is delivered through it as
    /// the response streams in. Only `message.content` is read; history is
    /// never sent. A new call replaces the in-flight slot without
    /// cancelling a still-outstanding request: callers wanting
    /// at-most-one-active semantics must call [`abort`](Self::abort) first.
    ///
    /// Errors are never retried; each failure surfaces exactly once.
    pub async fn send(
        &self,
        provider: ProviderKind,
        message: &Message,
        config: &ProviderConfig,
        mut sink: Option<StreamSink>,
    ) -> ProviderResult<String> {
        let cancel = CancellationToken::new();
        *self.inflight.lock() = Some(cancel.clone());

        self.logger.debug(&format!(
            "dispatching to {provider} (model={}, streaming={})",
            config.model,
            sink.is_some()
        ));

        let result = self
            .run(provider, &message.content, config, sink.as_mut(), cancel.clone())
            .await;

        // Clear the slot only while this call still owns it; a newer
        // dispatch may have replaced the token already.
        {
            let mut slot = self.inflight.lock();
            if slot.as_ref().is_some_and(|token| token.same_token(&cancel)) {
                *slot = None;
            }
        }

        match &result {
            Ok(text) => self
                .logger
                .debug(&format!("{provider}: completed ({} chars)", text.len())),
            Err(err) if err.is_cancelled() => {
                self.logger.debug(&format!("{provider}: request cancelled"))
            }
            Err(err) => self.logger.error(&format!("{provider}: {err}")),
        }

        result
    }

    async fn run(
        &self,
        provider: ProviderKind,
        prompt: &str,
        config: &ProviderConfig,
        mut sink: Option<&mut StreamSink>,
        cancel: CancellationToken,
    ) -> ProviderResult<String> {
        let adapter = self.provider(provider);
        let streaming = sink.is_some();
        let mut stream = adapter
            .stream_chat(prompt, config, streaming, cancel.clone())
            .await?;

        let mut text = String::new();
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                item = stream.next() => match item {
                    Some(Ok(delta)) => {
                        text.push_str(&delta);
                        if let Some(sink) = sink.as_mut() {
                            sink(&text);
                        }
                    }
                    Some(Err(err)) => return Err(err),
                    None => break,
                }
            }
        }
        Ok(text)
    }

    /// Cancel the in-flight request, if any
    ///
    /// Idempotent; calling with nothing in flight is a no-op. The cancelled
    /// call rejects with [`ProviderError::Cancelled`] and its sink is not
    /// invoked again.
    pub fn abort(&self) {
        if let Some(token) = self.inflight.lock().take() {
            self.logger.debug("abort: cancelling in-flight request");
            token.cancel();
        }
    }

    /// List the models installed on the local Ollama service
    pub async fn ollama_models(&self) -> ProviderResult<Vec<OllamaModel>> {
        OllamaProvider::new(self.http.clone(), Arc::clone(&self.logger))
            .list_models(None)
            .await
    }
}
