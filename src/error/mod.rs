//! Error types for cdm-narrative.

pub mod unified;

pub use unified::ErrorCategory;

use thiserror::Error;

/// Primary error type for all client operations.
#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed `{event}` message: {source}")]
    MalformedMessage {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

impl NarrativeError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed-message error for the named SSE event.
    pub fn malformed(event: impl Into<String>, source: serde_json::Error) -> Self {
        Self::MalformedMessage {
            event: event.into(),
            source,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) | Self::Transport(_) => ErrorCategory::Transport,
            Self::Api { .. } => ErrorCategory::Application,
            Self::MalformedMessage { .. } | Self::Serialization(_) => {
                ErrorCategory::MalformedMessage
            }
            Self::Configuration(_) | Self::Toml(_) => ErrorCategory::Configuration,
            Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether the caller might reasonably try again.
    ///
    /// Nothing in this crate retries on its own; this only informs the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status >= 500,
            _ => self.category() == ErrorCategory::Transport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, NarrativeError>;
