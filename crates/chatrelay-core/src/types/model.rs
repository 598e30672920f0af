//! Provider identity and metadata types

use serde::{Deserialize, Serialize};

/// The closed set of supported chat backends
///
/// Fixed at call time; there is no dynamic provider discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Ollama,
}

impl ProviderKind {
    /// Stable identifier used on the wire and in configuration
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// All supported providers
    pub fn all() -> [ProviderKind; 3] {
        [ProviderKind::OpenAi, ProviderKind::Gemini, ProviderKind::Ollama]
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when parsing an unknown provider identifier
#[derive(Debug, Clone, thiserror::Error)]
#[error("unsupported provider: {0}")]
pub struct UnknownProvider(pub String);

impl std::str::FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            "ollama" => Ok(ProviderKind::Ollama),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// Provider metadata (static information about a provider)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Provider identifier
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Default API base URL
    pub default_api_base: String,
    /// Whether an API key is required
    pub requires_api_key: bool,
    /// Well-known model names; empty when models are discovered at runtime
    pub default_models: Vec<String>,
}
