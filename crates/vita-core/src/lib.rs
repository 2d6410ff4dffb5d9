pub mod config;
pub mod conversation;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod retrieval;
pub mod runner;

// Re-export common types
pub use error::{Result, VitaError};
pub use prompt::PromptTemplate;
pub use provider::{Completer, Embedder, MetadataFilter, Retriever, ScoredDocument, VectorStore};
pub use retrieval::ContextRetriever;
pub use runner::{ChatRunner, RunnerState};
