//! OpenAI-compatible chat adapter
//!
//! Speaks the `/v1/chat/completions` protocol: bearer-token auth, one user
//! message per request, and `data: {...}` frames terminated by a
//! `data: [DONE]` sentinel when streaming.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use serde::{Deserialize, Serialize};

use super::error::{ProviderError, ProviderResult};
use super::lines::decode_lines;
use super::traits::{ChatProvider, ProviderConfig, StreamResponse};
use crate::logging::Logger;
use crate::types::{CancellationToken, ProviderMetadata};

const PROVIDER: &str = "openai";

/// Adapter for OpenAI and OpenAI-compatible endpoints
#[derive(Clone)]
pub struct OpenAiProvider {
    http: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl OpenAiProvider {
    /// Create a new OpenAI adapter sharing the dispatcher's HTTP client
    pub fn new(http: reqwest::Client, logger: Arc<dyn Logger>) -> Self {
        Self { http, logger }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn default_api_base(&self) -> &str {
        "https://api.openai.com"
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: PROVIDER.to_string(),
            display_name: "OpenAI".to_string(),
            default_api_base: self.default_api_base().to_string(),
            requires_api_key: true,
            default_models: vec![
                "gpt-4-turbo-preview".to_string(),
                "gpt-4".to_string(),
                "gpt-3.5-turbo".to_string(),
                "gpt-3.5-turbo-16k".to_string(),
            ],
        }
    }

    async fn stream_chat(
        &self,
        prompt: &str,
        config: &ProviderConfig,
        streaming: bool,
        cancel: CancellationToken,
    ) -> ProviderResult<StreamResponse> {
        let url = format!(
            "{}/v1/chat/completions",
            self.api_base(config).trim_end_matches('/')
        );
        let body = ChatCompletionRequest {
            model: &config.model,
            messages: vec![WireMessage {
                role: "user",
                content: prompt,
            }],
            stream: streaming,
        };
        // An empty key is sent as-is: "unauthenticated", rejected server-side.
        let api_key = config.api_key.clone().unwrap_or_default();

        self.logger.debug(&format!(
            "OpenAiProvider: POST {} (model={}, stream={})",
            url, config.model, streaming
        ));

        let request = self.http.post(&url).bearer_auth(api_key).json(&body);
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            response = request.send() => {
                response.map_err(|err| ProviderError::transport(PROVIDER, err))?
            }
        };

        if !response.status().is_success() {
            return Err(ProviderError::from_http_response(PROVIDER, response).await);
        }

        if streaming {
            Ok(decode_lines(
                PROVIDER,
                response,
                cancel,
                decode_stream_frame,
                |err| ProviderError::transport(PROVIDER, err),
            ))
        } else {
            let body = response
                .text()
                .await
                .map_err(|err| ProviderError::transport(PROVIDER, err))?;
            let text = extract_completion_text(&body)?;
            Ok(Box::pin(stream::iter([Ok::<_, ProviderError>(text)])))
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamFrame {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Decode a non-streaming completion body into the assistant text
fn extract_completion_text(body: &str) -> ProviderResult<String> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|err| ProviderError::invalid_response(PROVIDER, err))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| {
            ProviderError::invalid_response(PROVIDER, "missing choices[0].message.content")
        })
}

/// Decode one streamed line into an optional text delta
///
/// The `data: [DONE]` sentinel is dropped without being parsed. A line that
/// fails to parse as JSON fails the whole call; skipping it would silently
/// lose response text.
fn decode_stream_frame(line: &str) -> ProviderResult<Option<String>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let payload = line
        .strip_prefix("data: ")
        .or_else(|| line.strip_prefix("data:"))
        .unwrap_or(line);
    if payload == "[DONE]" {
        return Ok(None);
    }
    let frame: StreamFrame = serde_json::from_str(payload)
        .map_err(|err| ProviderError::invalid_response(PROVIDER, format!("bad frame: {err}")))?;
    Ok(frame
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}
