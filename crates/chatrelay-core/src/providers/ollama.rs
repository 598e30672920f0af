//! Ollama chat adapter
//!
//! Talks to a local Ollama instance: `/api/generate` for completions (the
//! backend streams newline-delimited JSON whether or not streaming was
//! asked for) and `/api/tags` for the installed-model listing. No auth.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{ProviderError, ProviderResult};
use super::lines::decode_lines;
use super::traits::{ChatProvider, ProviderConfig, StreamResponse};
use crate::logging::Logger;
use crate::types::{CancellationToken, ProviderMetadata};

const PROVIDER: &str = "ollama";

/// A locally installed model, as reported by the tags endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaModel {
    pub name: String,
    pub modified_at: String,
    pub size: u64,
}

/// Adapter for a local Ollama service
#[derive(Clone)]
pub struct OllamaProvider {
    http: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl OllamaProvider {
    /// Create a new Ollama adapter sharing the dispatcher's HTTP client
    pub fn new(http: reqwest::Client, logger: Arc<dyn Logger>) -> Self {
        Self { http, logger }
    }

    /// List locally installed models, in the order the service reports them
    ///
    /// This is a convenience listing, not the chat path: a success response
    /// whose `models` field is missing or malformed degrades to an empty
    /// list instead of an error. Transport and HTTP failures still error.
    pub async fn list_models(&self, api_base: Option<&str>) -> ProviderResult<Vec<OllamaModel>> {
        let base = api_base.unwrap_or_else(|| self.default_api_base());
        let url = format!("{}/api/tags", base.trim_end_matches('/'));

        self.logger.debug(&format!("OllamaProvider: GET {}", url));

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(ProviderError::from_http_response(PROVIDER, response).await);
        }

        let body = response.text().await.map_err(map_transport_error)?;
        Ok(decode_tags(&body, self.logger.as_ref()))
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn default_api_base(&self) -> &str {
        "http://localhost:11434"
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: PROVIDER.to_string(),
            display_name: "Ollama".to_string(),
            default_api_base: self.default_api_base().to_string(),
            requires_api_key: false,
            // Models are discovered at runtime via list_models.
            default_models: vec![],
        }
    }

    async fn stream_chat(
        &self,
        prompt: &str,
        config: &ProviderConfig,
        _streaming: bool,
        cancel: CancellationToken,
    ) -> ProviderResult<StreamResponse> {
        let url = format!("{}/api/generate", self.api_base(config).trim_end_matches('/'));
        let body = GenerateRequest {
            model: &config.model,
            prompt,
        };

        self.logger.debug(&format!(
            "OllamaProvider: POST {} (model={})",
            url, config.model
        ));

        let request = self.http.post(&url).json(&body);
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            response = request.send() => response.map_err(map_transport_error)?,
        };

        if !response.status().is_success() {
            return Err(ProviderError::from_http_response(PROVIDER, response).await);
        }

        Ok(decode_lines(
            PROVIDER,
            response,
            cancel,
            decode_generate_line,
            map_transport_error,
        ))
    }
}

/// Classify a network failure against the local service
///
/// A connection-level failure gets its own kind with user-facing guidance,
/// independent of HTTP status; anything else is a plain transport error.
fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_connect() || err.is_timeout() {
        ProviderError::unreachable(
            PROVIDER,
            format!("make sure Ollama is running on your machine ({err})"),
        )
    } else {
        ProviderError::transport(PROVIDER, err)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateLine {
    response: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TagsResponse {
    models: Vec<OllamaModel>,
}

/// Decode one generate-stream line into an optional text delta
fn decode_generate_line(line: &str) -> ProviderResult<Option<String>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let parsed: GenerateLine = serde_json::from_str(line)
        .map_err(|err| ProviderError::invalid_response(PROVIDER, format!("bad line: {err}")))?;
    Ok(parsed.response.filter(|response| !response.is_empty()))
}

/// Decode a tags body, degrading to an empty list on unexpected shapes
fn decode_tags(body: &str, logger: &dyn Logger) -> Vec<OllamaModel> {
    match serde_json::from_str::<TagsResponse>(body) {
        Ok(tags) => tags.models,
        Err(err) => {
            logger.warn(&format!("unexpected tags response shape: {err}"));
            Vec::new()
        }
    }
}
