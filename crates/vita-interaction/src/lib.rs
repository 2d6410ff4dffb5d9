//! Adapters for the hosted services behind the assistant.

pub mod endpoint;
mod http;
pub mod openai_chat;
pub mod openai_embedder;
pub mod pinecone_store;
pub mod stub;

pub use endpoint::{Operation, ProviderEndpoint};
pub use openai_chat::OpenAiChatCompleter;
pub use openai_embedder::OpenAiEmbedder;
pub use pinecone_store::PineconeVectorStore;
pub use stub::{EchoCompleter, FixedEmbedder, InMemoryVectorStore, ScriptedCompleter};
