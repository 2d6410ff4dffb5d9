//! In-memory adapters.
//!
//! They let the assistant run end to end without network access: tests use
//! them to script provider behavior and inspect what was sent.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use vita_core::conversation::{MessageRole, PromptMessage};
use vita_core::{Completer, Embedder, MetadataFilter, Result, ScoredDocument, VectorStore};

/// Embedder returning the same vector for every input.
#[derive(Debug)]
pub struct FixedEmbedder {
    vector: Vec<f32>,
    calls: Mutex<Vec<String>>,
}

impl FixedEmbedder {
    /// A constant vector of `dimensions` components.
    pub fn new(dimensions: usize) -> Self {
        Self::with_vector(vec![0.0; dimensions])
    }

    pub fn with_vector(vector: Vec<f32>) -> Self {
        Self {
            vector,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Texts embedded so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }
        Ok(self.vector.clone())
    }
}

/// Vector store holding a fixed list of documents.
///
/// Search ignores the query vector: it returns the documents that satisfy the
/// filter, best preset score first, limited to `k`.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    documents: Vec<ScoredDocument>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, document: ScoredDocument) -> Self {
        self.documents.push(document);
        self
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn search(
        &self,
        _vector: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<ScoredDocument>> {
        let mut matches: Vec<ScoredDocument> = self
            .documents
            .iter()
            .filter(|document| filter.matches(&document.metadata))
            .cloned()
            .collect();
        // stable: equal scores keep insertion order
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(k);
        Ok(matches)
    }
}

/// Completer that answers with the system message, verbatim.
///
/// Useful to check exactly what context reached the model.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoCompleter;

#[async_trait]
impl Completer for EchoCompleter {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        Ok(messages
            .iter()
            .find(|message| message.role == MessageRole::System)
            .map(|message| message.content.clone())
            .unwrap_or_default())
    }
}

/// Completer replaying queued replies and errors in order.
///
/// Once the queue is empty it keeps answering with the fallback reply.
#[derive(Debug)]
pub struct ScriptedCompleter {
    script: Mutex<VecDeque<Result<String>>>,
    received: Mutex<Vec<Vec<PromptMessage>>>,
    fallback: String,
}

impl ScriptedCompleter {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
            fallback: String::from("OK"),
        }
    }

    /// Queues a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    /// Queues a failure.
    pub fn fail(self, error: vita_core::VitaError) -> Self {
        self.push(Err(error))
    }

    fn push(self, outcome: Result<String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
        self
    }

    /// Every message set received so far, in call order.
    pub fn received(&self) -> Vec<Vec<PromptMessage>> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }
}

impl Default for ScriptedCompleter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        if let Ok(mut received) = self.received.lock() {
            received.push(messages.to_vec());
        }
        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}
