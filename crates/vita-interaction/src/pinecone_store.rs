//! PineconeVectorStore - REST client for a Pinecone serverless index.
//!
//! The data-plane host of an index is either configured or looked up once
//! through the control plane, then reused for every query.

use crate::http::send_json;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;
use tokio::sync::OnceCell;
use vita_core::config::{ApiKey, DEFAULT_PINECONE_CONTROLLER_URL, VectorStoreConfig};
use vita_core::{MetadataFilter, Result, ScoredDocument, VectorStore};

const PROVIDER: &str = "pinecone";
const API_VERSION: &str = "2024-07";
/// Metadata key under which chunk text is stored at ingestion time.
pub const TEXT_METADATA_KEY: &str = "text";

/// Vector store backed by a hosted Pinecone index.
pub struct PineconeVectorStore {
    client: Client,
    api_key: ApiKey,
    index_name: String,
    controller_url: String,
    namespace: Option<String>,
    host: OnceCell<String>,
}

impl PineconeVectorStore {
    /// Creates a store for `index_name`; the host is resolved on first search.
    pub fn new(api_key: ApiKey, index_name: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            index_name: index_name.into(),
            controller_url: DEFAULT_PINECONE_CONTROLLER_URL.to_string(),
            namespace: None,
            host: OnceCell::new(),
        }
    }

    /// Builds a store from loaded configuration.
    pub fn from_config(config: &VectorStoreConfig) -> Self {
        let mut store = Self::new(config.api_key.clone(), config.index_name.clone())
            .with_controller_url(config.controller_url.clone());
        if let Some(host) = &config.index_host {
            store = store.with_host(host.clone());
        }
        if let Some(namespace) = &config.namespace {
            store = store.with_namespace(namespace.clone());
        }
        store
    }

    /// Uses a known data-plane host instead of asking the control plane.
    pub fn with_host(self, host: impl Into<String>) -> Self {
        Self {
            host: OnceCell::new_with(Some(normalize_host(&host.into()))),
            ..self
        }
    }

    pub fn with_controller_url(mut self, url: impl Into<String>) -> Self {
        self.controller_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    async fn host(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let url = format!("{}/indexes/{}", self.controller_url, self.index_name);
                let request = self
                    .client
                    .get(&url)
                    .header("Api-Key", self.api_key.expose())
                    .header("X-Pinecone-API-Version", API_VERSION);
                let description: IndexDescription = send_json(PROVIDER, request).await?;

                tracing::info!(index = %self.index_name, host = %description.host, "resolved index host");
                Ok::<_, vita_core::VitaError>(normalize_host(&description.host))
            })
            .await?;
        Ok(host.as_str())
    }
}

#[async_trait]
impl VectorStore for PineconeVectorStore {
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<ScoredDocument>> {
        let host = self.host().await?;
        let body = QueryRequest {
            vector,
            top_k: k,
            filter: filter.to_query_json(),
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };
        let request = self
            .client
            .post(format!("{host}/query"))
            .header("Api-Key", self.api_key.expose())
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&body);

        let started = Instant::now();
        let parsed: QueryResponse = send_json(PROVIDER, request).await?;
        let documents = into_documents(parsed, k);

        tracing::debug!(
            index = %self.index_name,
            matches = documents.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "vector query completed"
        );
        Ok(documents)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    filter: Value,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

fn into_documents(response: QueryResponse, k: usize) -> Vec<ScoredDocument> {
    let mut documents: Vec<ScoredDocument> = response
        .matches
        .into_iter()
        .map(|m| {
            let metadata = m.metadata.unwrap_or_default();
            let text = metadata
                .get(TEXT_METADATA_KEY)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            ScoredDocument {
                text,
                metadata,
                score: m.score,
            }
        })
        .collect();

    documents.sort_by(|a, b| b.score.total_cmp(&a.score));
    documents.truncate(k);
    documents
}

/// The control plane returns bare host names; tests and proxies pass full URLs.
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}
