//! Builds [`AppConfig`] from environment variables.
//!
//! Required variables are checked together so a misconfigured shell reports
//! every missing name at once instead of one per run.

use crate::env::EnvSource;
use vita_core::config::{
    ApiKey, AppConfig, ChatConfig, DEFAULT_AZURE_API_VERSION, DEFAULT_CONTEXT_SOURCE,
    DEFAULT_PINECONE_CONTROLLER_URL, EmbeddingConfig, ProviderConfig, ProviderFlavor,
    RetrievalConfig, VectorStoreConfig,
};
use vita_core::conversation::HistoryWindow;
use vita_core::{Result, VitaError};

pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
pub const PINECONE_INDEX_NAME: &str = "PINECONE_INDEX_NAME";
pub const PINECONE_INDEX_HOST: &str = "PINECONE_INDEX_HOST";
pub const PINECONE_CONTROLLER_URL: &str = "PINECONE_CONTROLLER_URL";
pub const PINECONE_NAMESPACE: &str = "PINECONE_NAMESPACE";
pub const VITA_PROVIDER: &str = "VITA_PROVIDER";
pub const VITA_PROVIDER_BASE_URL: &str = "VITA_PROVIDER_BASE_URL";
pub const VITA_AZURE_API_VERSION: &str = "VITA_AZURE_API_VERSION";
pub const VITA_EMBEDDING_MODEL: &str = "VITA_EMBEDDING_MODEL";
pub const VITA_CHAT_MODEL: &str = "VITA_CHAT_MODEL";
pub const VITA_MAX_TOKENS: &str = "VITA_MAX_TOKENS";
pub const VITA_CONTEXT_SOURCE: &str = "VITA_CONTEXT_SOURCE";
pub const VITA_HISTORY_WINDOW: &str = "VITA_HISTORY_WINDOW";

/// Loads the full configuration, failing fast on anything missing or invalid.
///
/// # Errors
///
/// Returns `VitaError::Configuration` naming every missing required variable
/// together with an unknown provider flavor, or the first optional variable
/// with an unusable value.
pub fn load_config(env: &impl EnvSource) -> Result<AppConfig> {
    let mut problems = Vec::new();
    let flavor = match optional(env, VITA_PROVIDER) {
        Some(value) => {
            let parsed = ProviderFlavor::parse(&value);
            if parsed.is_none() {
                problems.push(format!(
                    "{VITA_PROVIDER} must be 'azure' or 'openai', got '{value}'"
                ));
            }
            parsed
        }
        None => Some(ProviderFlavor::default()),
    };

    let mut missing = Vec::new();
    let pinecone_key = required(env, PINECONE_API_KEY, &mut missing);
    let index_name = required(env, PINECONE_INDEX_NAME, &mut missing);
    // The provider key depends on the flavor, so it is only checked for a known one.
    let provider_key = flavor.and_then(|flavor| required(env, flavor.api_key_var(), &mut missing));

    if !missing.is_empty() {
        problems.push(format!(
            "missing required environment variable(s): {}",
            missing.join(", ")
        ));
    }
    if !problems.is_empty() {
        return Err(VitaError::configuration(problems.join("; ")));
    }

    let (Some(flavor), Some(pinecone_key), Some(index_name), Some(provider_key)) =
        (flavor, pinecone_key, index_name, provider_key)
    else {
        return Err(VitaError::configuration("required variables not resolved"));
    };

    let provider = ProviderConfig {
        flavor,
        api_key: ApiKey::new(provider_key),
        base_url: trim_url(
            optional(env, VITA_PROVIDER_BASE_URL)
                .unwrap_or_else(|| flavor.default_base_url().to_string()),
        ),
        api_version: optional(env, VITA_AZURE_API_VERSION)
            .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
    };

    let mut embedding = EmbeddingConfig::default();
    if let Some(model) = optional(env, VITA_EMBEDDING_MODEL) {
        embedding.model = model;
    }

    let mut chat = ChatConfig::default();
    if let Some(model) = optional(env, VITA_CHAT_MODEL) {
        chat.model = model;
    }
    if let Some(max_tokens) = positive_number::<u32>(env, VITA_MAX_TOKENS)? {
        chat.max_tokens = max_tokens;
    }

    let vector_store = VectorStoreConfig {
        api_key: ApiKey::new(pinecone_key),
        index_name,
        index_host: optional(env, PINECONE_INDEX_HOST).map(trim_url),
        controller_url: trim_url(
            optional(env, PINECONE_CONTROLLER_URL)
                .unwrap_or_else(|| DEFAULT_PINECONE_CONTROLLER_URL.to_string()),
        ),
        namespace: optional(env, PINECONE_NAMESPACE),
    };

    let retrieval = RetrievalConfig {
        context_source: optional(env, VITA_CONTEXT_SOURCE)
            .unwrap_or_else(|| DEFAULT_CONTEXT_SOURCE.to_string()),
        history_window: HistoryWindow::from(positive_number::<usize>(env, VITA_HISTORY_WINDOW)?),
    };

    tracing::debug!(
        flavor = ?provider.flavor,
        base_url = %provider.base_url,
        index = %vector_store.index_name,
        source = %retrieval.context_source,
        "configuration loaded"
    );

    Ok(AppConfig {
        provider,
        embedding,
        chat,
        vector_store,
        retrieval,
    })
}

/// Non-empty value of `key`, trimmed.
fn optional(env: &impl EnvSource, key: &str) -> Option<String> {
    env.get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(env: &impl EnvSource, key: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
    let value = optional(env, key);
    if value.is_none() {
        missing.push(key);
    }
    value
}

fn positive_number<T>(env: &impl EnvSource, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = optional(env, key) else {
        return Ok(None);
    };
    match raw.parse::<T>() {
        Ok(value) if value > T::default() => Ok(Some(value)),
        _ => Err(VitaError::configuration(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
