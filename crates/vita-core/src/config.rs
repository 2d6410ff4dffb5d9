//! Configuration model.
//!
//! Values are produced by the loader in `vita-infrastructure`; this module
//! only defines their shape and defaults.

use crate::conversation::HistoryWindow;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-2024-11-20";
pub const DEFAULT_MAX_TOKENS: u32 = 8192;
pub const DEFAULT_AZURE_BASE_URL: &str = "https://ai-proxy.lab.epam.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_AZURE_API_VERSION: &str = "2023-12-01-preview";
pub const DEFAULT_CONTEXT_SOURCE: &str = "./client.txt";
pub const DEFAULT_PINECONE_CONTROLLER_URL: &str = "https://api.pinecone.io";

/// An API key that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Wire dialect spoken by the chat/embedding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFlavor {
    /// Azure-style deployment URLs authenticated with an `api-key` header.
    #[default]
    Azure,
    /// OpenAI `/v1` URLs authenticated with a bearer token.
    OpenAi,
}

impl ProviderFlavor {
    /// Parses the value of the provider selection setting.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "azure" | "dial" => Some(Self::Azure),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    /// Environment variable holding the API key for this flavor.
    pub fn api_key_var(self) -> &'static str {
        match self {
            Self::Azure => "DIAL_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Azure => DEFAULT_AZURE_BASE_URL,
            Self::OpenAi => DEFAULT_OPENAI_BASE_URL,
        }
    }
}

/// Endpoint and credentials for the embedding + chat provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub flavor: ProviderFlavor,
    pub api_key: ApiKey,
    pub base_url: String,
    /// Only used by the Azure flavor.
    pub api_version: String,
}

/// Settings of the embedding model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

/// Settings of the chat model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    pub model: String,
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Vector database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    pub api_key: ApiKey,
    pub index_name: String,
    /// Data-plane host; looked up from the controller when absent.
    pub index_host: Option<String>,
    pub controller_url: String,
    pub namespace: Option<String>,
}

/// Retrieval and prompt settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Only chunks whose `source` metadata equals this value are searched.
    pub context_source: String,
    pub history_window: HistoryWindow,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            context_source: DEFAULT_CONTEXT_SOURCE.to_string(),
            history_window: HistoryWindow::Unbounded,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub embedding: EmbeddingConfig,
    pub chat: ChatConfig,
    pub vector_store: VectorStoreConfig,
    pub retrieval: RetrievalConfig,
}
