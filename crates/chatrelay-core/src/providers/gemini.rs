//! Gemini chat adapter
//!
//! Speaks the Generative Language `generateContent` protocol. The endpoint
//! has no streaming mode, so when the caller asked for incremental delivery
//! the adapter simulates it: the fully-received text is re-played one word
//! at a time with a fixed delay. This pacing is observable to end users and
//! is kept deliberately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatProvider, ProviderConfig, StreamResponse};
use crate::logging::Logger;
use crate::types::{CancellationToken, ProviderMetadata};

const PROVIDER: &str = "gemini";

/// Delay between simulated word deliveries
const SIMULATED_CHUNK_DELAY: Duration = Duration::from_millis(50);

/// Adapter for the Google Generative Language endpoint
#[derive(Clone)]
pub struct GeminiProvider {
    http: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl GeminiProvider {
    /// Create a new Gemini adapter sharing the dispatcher's HTTP client
    pub fn new(http: reqwest::Client, logger: Arc<dyn Logger>) -> Self {
        Self { http, logger }
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn default_api_base(&self) -> &str {
        "https://generativelanguage.googleapis.com"
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: PROVIDER.to_string(),
            display_name: "Gemini".to_string(),
            default_api_base: self.default_api_base().to_string(),
            requires_api_key: true,
            default_models: vec!["gemini-pro".to_string(), "gemini-pro-vision".to_string()],
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
            "{}/v1beta/models/{}:generateContent",
            self.api_base(config).trim_end_matches('/'),
            config.model
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        // Auth rides in the query string, not a header.
        let api_key = config.api_key.clone().unwrap_or_default();

        self.logger.debug(&format!(
            "GeminiProvider: POST {} (model={}, simulate_stream={})",
            url, config.model, streaming
        ));

        let request = self.http.post(&url).query(&[("key", api_key)]).json(&body);
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            response = request.send() => {
                response.map_err(|err| ProviderError::transport(PROVIDER, err))?
            }
        };

        if !response.status().is_success() {
            return Err(ProviderError::from_http_response(PROVIDER, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|err| ProviderError::transport(PROVIDER, err))?;
        let text = extract_candidate_text(&body)?;

        if streaming {
            Ok(simulate_stream(text, cancel))
        } else {
            Ok(Box::pin(stream::iter([Ok::<_, ProviderError>(text)])))
        }
    }
}

/// Re-play already-received text one word at a time
///
/// Splitting on single spaces keeps the accumulation exactly reversible:
/// joining the deltas reproduces the original text byte-for-byte, so the
/// last cumulative value the sink sees equals the call's return value.
fn simulate_stream(text: String, cancel: CancellationToken) -> StreamResponse {
    let words: Vec<String> = text.split(' ').map(str::to_string).collect();
    let stream = stream::iter(words.into_iter().enumerate()).then(move |(i, word)| {
        let cancel = cancel.clone();
        async move {
            if cancel.is_cancelled() {
                return Err(ProviderError::Cancelled);
            }
            tokio::time::sleep(SIMULATED_CHUNK_DELAY).await;
            Ok(if i == 0 { word } else { format!(" {word}") })
        }
    });
    Box::pin(stream)
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Decode a `generateContent` body into `candidates[0].content.parts[0].text`
fn extract_candidate_text(body: &str) -> ProviderResult<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|err| ProviderError::invalid_response(PROVIDER, err))?;
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| {
            ProviderError::invalid_response(PROVIDER, "missing candidates[0].content.parts[0].text")
        })
}
