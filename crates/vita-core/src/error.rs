//! Error types for the Vita assistant.

use thiserror::Error;

/// A shared error type for the whole assistant.
///
/// Three kinds exist and all of them are fatal for the conversation: nothing
/// is retried locally and no degraded answer is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VitaError {
    /// Missing or invalid credential / setting, detected at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A remote call (embedding, vector search or chat completion) failed.
    #[error("{provider} error{}: {message}", status_suffix(.status))]
    Provider {
        /// Which remote service failed (e.g. "embedding", "pinecone", "chat").
        provider: &'static str,
        /// HTTP status when the service answered with one.
        status: Option<u16>,
        message: String,
    },

    /// The line-reading source closed abnormally or errored.
    #[error("Input stream error: {0}")]
    InputStream(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

impl VitaError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a Provider error without an HTTP status (network, malformed body)
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            status: None,
            message: message.into(),
        }
    }

    /// Creates a Provider error for a non-success HTTP response
    pub fn provider_status(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates an InputStream error
    pub fn input_stream(message: impl Into<String>) -> Self {
        Self::InputStream(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a provider error
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }

    /// Check if this is an input stream error
    pub fn is_input_stream(&self) -> bool {
        matches!(self, Self::InputStream(_))
    }

    /// HTTP status carried by a provider error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => *status,
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for VitaError {
    fn from(err: std::io::Error) -> Self {
        Self::InputStream(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for VitaError {
    fn from(err: serde_json::Error) -> Self {
        Self::provider("json", format!("malformed response: {err}"))
    }
}

impl From<minijinja::Error> for VitaError {
    fn from(err: minijinja::Error) -> Self {
        Self::Configuration(format!("prompt template: {err}"))
    }
}

/// A type alias for `Result<T, VitaError>`.
pub type Result<T> = std::result::Result<T, VitaError>;
