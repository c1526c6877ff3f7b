//! Error hierarchy for Seedbot.

use thiserror::Error;

/// Top-level error returned by a conversational turn.
///
/// Unknown session identifiers are new, empty conversations, so there is no
/// not-found variant.
#[derive(Debug, Error)]
pub enum SeedbotError {
    #[error("Model invocation failed: {0}")]
    ModelInvocationFailed(#[from] ApiError),

    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(#[from] RetrievalError),

    #[error("Response timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("No final answer after {limit} tool iterations")]
    MaxIterations { limit: usize },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the language-model provider.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request timeout")]
    Timeout,
}

impl ApiError {
    /// Whether a retry of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited { .. }
                | ApiError::Server { .. }
                | ApiError::Network(_)
                | ApiError::Timeout
        )
    }

    /// Server-suggested wait before retrying, if any.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ApiError::RateLimited { retry_after_ms } => *retry_after_ms,
            _ => None,
        }
    }
}

/// Errors from the retrieval backend (embeddings, vector index, corpus).
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Retrieval backend unreachable: {0}")]
    Unreachable(String),

    #[error("Retrieval backend error: {status} {message}")]
    Backend { status: u16, message: String },

    #[error("Malformed retrieval response: {0}")]
    MalformedResponse(String),

    #[error("Failed to load corpus {path}: {message}")]
    Corpus { path: String, message: String },
}

/// Errors from tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid input for tool '{tool}': {message}")]
    InvalidInput { tool: String, message: String },

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
