//! Capability interfaces for the hosted services the assistant depends on.
//!
//! Each trait has a hosted implementation in `vita-interaction` and an
//! in-memory one for tests and offline runs.

use crate::conversation::PromptMessage;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding the path of the document a chunk came from.
pub const SOURCE_METADATA_KEY: &str = "source";

/// Converts text into a fixed-size vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a single, non-empty piece of text.
    ///
    /// # Errors
    ///
    /// Returns `VitaError::Provider` if the remote service rejects the call or
    /// cannot be reached.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Nearest-neighbour search over stored document chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns at most `k` documents matching `filter`, best score first.
    ///
    /// An empty result is a valid answer, not an error.
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<ScoredDocument>>;
}

/// Turns a user query into a context string for the prompt.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns the context for `query`, or an empty string if nothing matched.
    async fn retrieve_context(&self, query: &str) -> Result<String>;
}

/// Generates a reply for an ordered set of prompt messages.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String>;
}

/// A stored chunk returned by a vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub score: f32,
}

impl ScoredDocument {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            metadata: Map::new(),
            score,
        }
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The `source` metadata value, when present and a string.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_METADATA_KEY).and_then(Value::as_str)
    }
}

/// Restricts a search to chunks of a single source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    source: String,
}

impl MetadataFilter {
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source_value(&self) -> &str {
        &self.source
    }

    /// Whether a document's metadata satisfies the filter.
    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        metadata
            .get(SOURCE_METADATA_KEY)
            .and_then(Value::as_str)
            .is_some_and(|source| source == self.source)
    }

    /// Filter expression in the vector database's query language.
    pub fn to_query_json(&self) -> Value {
        serde_json::json!({ "source": { "$eq": self.source } })
    }
}
