//! Query → context retrieval.

use crate::error::Result;
use crate::provider::{Embedder, MetadataFilter, Retriever, VectorStore};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Number of documents fetched per query.
pub const RETRIEVAL_TOP_K: usize = 1;

/// Composes an embedder and a vector store into a [`Retriever`].
///
/// Every call embeds the query once and searches once. Nothing is cached, so
/// asking the same question twice hits both services twice.
pub struct ContextRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    filter: MetadataFilter,
    top_k: usize,
}

impl ContextRetriever {
    /// Creates a retriever restricted to chunks of the given source.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        filter: MetadataFilter,
    ) -> Self {
        Self {
            embedder,
            store,
            filter,
            top_k: RETRIEVAL_TOP_K,
        }
    }

    pub fn filter(&self) -> &MetadataFilter {
        &self.filter
    }
}

#[async_trait]
impl Retriever for ContextRetriever {
    async fn retrieve_context(&self, query: &str) -> Result<String> {
        let started = Instant::now();
        let vector = self.embedder.embed(query).await?;
        let documents = self.store.search(&vector, self.top_k, &self.filter).await?;

        tracing::debug!(
            dimensions = vector.len(),
            matches = documents.len(),
            source = self.filter.source_value(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "retrieved context"
        );

        Ok(documents
            .into_iter()
            .map(|document| document.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
