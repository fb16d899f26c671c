//! Error Types

use thiserror::Error;

/// Result type alias for model invocations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors surfaced by the invocation layer
#[derive(Error, Debug)]
pub enum LlmError {
    /// Unsupported capability, tool without a resolver, missing credential
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network failure, timeout or non-success HTTP status
    #[error("Transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Malformed or empty response body
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The caller's cancellation token fired
    #[error("Request cancelled")]
    Cancelled,

    /// The backend kept requesting tools past the round cap
    #[error("Tool loop exceeded {0} rounds")]
    ToolLoopExceeded(usize),

    /// Role string outside system/user/assistant/tool
    #[error("Unknown message role: {0}")]
    UnknownRole(String),

    /// Cache collaborator failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Transport error without an HTTP status
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Transport error carrying the HTTP status the backend answered with
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Configuration errors surface before any network activity and are never retried
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether the retry decorator may spend another attempt on this error
    pub const fn consumes_attempt(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Cancelled)
    }
}

impl From<anyhow::Error> for LlmError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
