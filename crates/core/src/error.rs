//! Error types for the helperbot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the top-level [`Error`]
//! wraps them for callers that do not need to branch on the details.

use thiserror::Error;

/// The top-level error type for all helperbot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Platform (comment stream) errors ---
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Transcript errors ---
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether another attempt against the same endpoint could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::RateLimited { .. }
            | Self::MalformedResponse(_)
            | Self::Timeout(_)
            | Self::Network(_) => true,
            Self::AuthenticationFailed(_) | Self::ModelNotFound(_) | Self::NotConfigured(_) => {
                false
            }
        }
    }
}

/// Errors raised by the discussion platform (stream reads, lookups, posting).
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Rate limited by platform, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Platform server error (status {status_code}): {message}")]
    Server { status_code: u16, message: String },

    #[error("Malformed platform payload: {0}")]
    Malformed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl PlatformError {
    /// Transient errors are retried with backoff by the consumption loop.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionLost(_)
                | Self::RateLimited { .. }
                | Self::Server { .. }
                | Self::Malformed(_)
        )
    }

    /// Fatal errors terminate the process; only credential failures qualify.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Tool-level failures. These never abort the tool-calling loop: they are
/// converted into failed tool results that the model can reason about.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Search backend unavailable: {0}")]
    SearchUnavailable(String),

    #[error("Fetch failed: {0}")]
    FetchUnavailable(String),

    #[error("Content extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    /// Stable snake_case identifier used in failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SearchUnavailable(_) => "search_unavailable",
            Self::FetchUnavailable(_) => "fetch_unavailable",
            Self::ExtractionFailed(_) => "extraction_failed",
            Self::RendererUnavailable(_) => "renderer_unavailable",
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::UnknownTool(_) => "unknown_tool",
        }
    }
}

/// The thread around a trigger could not be reconstructed.
#[derive(Debug, Clone, Error)]
pub enum ContextError {
    #[error("Context unavailable for {comment_id}: {reason}")]
    ContextUnavailable { comment_id: String, reason: String },
}
