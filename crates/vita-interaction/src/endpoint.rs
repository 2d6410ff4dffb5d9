//! URL layout and authentication for OpenAI-compatible providers.

use reqwest::RequestBuilder;
use vita_core::config::{ApiKey, ProviderConfig, ProviderFlavor};

/// Which OpenAI-compatible operation a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Embeddings,
    ChatCompletions,
}

impl Operation {
    fn path(self) -> &'static str {
        match self {
            Self::Embeddings => "embeddings",
            Self::ChatCompletions => "chat/completions",
        }
    }
}

/// Resolved endpoint of an embedding or chat provider.
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    flavor: ProviderFlavor,
    base_url: String,
    api_version: String,
    api_key: ApiKey,
}

impl ProviderEndpoint {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            flavor: config.flavor,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Full request URL for `operation` against `model`.
    ///
    /// Azure deployments are named after the model they serve.
    pub fn url(&self, operation: Operation, model: &str) -> String {
        match self.flavor {
            ProviderFlavor::Azure => format!(
                "{}/openai/deployments/{}/{}?api-version={}",
                self.base_url,
                model,
                operation.path(),
                self.api_version
            ),
            ProviderFlavor::OpenAi => format!("{}/v1/{}", self.base_url, operation.path()),
        }
    }

    /// Adds the flavor's authentication header.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.flavor {
            ProviderFlavor::Azure => request.header("api-key", self.api_key.expose()),
            ProviderFlavor::OpenAi => request.bearer_auth(self.api_key.expose()),
        }
    }
}
