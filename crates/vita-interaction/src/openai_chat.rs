//! OpenAiChatCompleter - REST client for OpenAI-compatible chat completions.
//!
//! Calls the provider directly (no SDK) and returns the first choice's text.
//! Responses are not streamed.

use crate::endpoint::{Operation, ProviderEndpoint};
use crate::http::send_json;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use vita_core::config::{ChatConfig, DEFAULT_MAX_TOKENS, ProviderConfig};
use vita_core::conversation::PromptMessage;
use vita_core::{Completer, Result, VitaError};

const PROVIDER: &str = "chat";

/// Completer implementation that talks to a chat-completions endpoint.
#[derive(Clone)]
pub struct OpenAiChatCompleter {
    client: Client,
    endpoint: ProviderEndpoint,
    model: String,
    max_tokens: u32,
}

impl OpenAiChatCompleter {
    /// Creates a completer for `model` behind `endpoint`.
    pub fn new(endpoint: ProviderEndpoint, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Builds a completer from loaded configuration.
    pub fn from_config(provider: &ProviderConfig, chat: &ChatConfig) -> Self {
        Self::new(ProviderEndpoint::new(provider), chat.model.clone()).with_max_tokens(chat.max_tokens)
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Completer for OpenAiChatCompleter {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|message| ChatMessage {
                    role: message.role.as_str(),
                    content: &message.content,
                })
                .collect(),
            max_tokens: self.max_tokens,
        };
        let url = self.endpoint.url(Operation::ChatCompletions, &self.model);
        let request = self.endpoint.authorize(self.client.post(&url)).json(&body);

        let started = Instant::now();
        let parsed: ChatCompletionResponse = send_json(PROVIDER, request).await?;
        let text = extract_text_response(parsed)?;

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            reply_chars = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chat completion received"
        );
        Ok(text)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| VitaError::provider(PROVIDER, "response contained no content"))
}
