//! OpenAiEmbedder - REST client for OpenAI-compatible embedding endpoints.

use crate::endpoint::{Operation, ProviderEndpoint};
use crate::http::send_json;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use vita_core::config::{EmbeddingConfig, ProviderConfig};
use vita_core::{Embedder, Result, VitaError};

const PROVIDER: &str = "embedding";

/// Embedder that talks to an Azure-style or OpenAI embeddings endpoint.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: ProviderEndpoint,
    model: String,
}

impl OpenAiEmbedder {
    /// Creates an embedder for `model` behind `endpoint`.
    pub fn new(endpoint: ProviderEndpoint, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            model: model.into(),
        }
    }

    /// Builds an embedder from loaded configuration.
    pub fn from_config(provider: &ProviderConfig, embedding: &EmbeddingConfig) -> Self {
        Self::new(ProviderEndpoint::new(provider), embedding.model.clone())
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
        };
        let url = self.endpoint.url(Operation::Embeddings, &self.model);
        let request = self.endpoint.authorize(self.client.post(&url)).json(&body);

        let started = Instant::now();
        let parsed: EmbeddingResponse = send_json(PROVIDER, request).await?;
        let embedding = extract_embedding(parsed)?;

        tracing::debug!(
            model = %self.model,
            dimensions = embedding.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "embedded query"
        );
        Ok(embedding)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

fn extract_embedding(response: EmbeddingResponse) -> Result<Vec<f32>> {
    response
        .data
        .into_iter()
        .next()
        .map(|data| data.embedding)
        .filter(|embedding| !embedding.is_empty())
        .ok_or_else(|| VitaError::provider(PROVIDER, "response contained no embedding"))
}
