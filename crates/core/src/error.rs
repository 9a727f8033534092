//! Error types for the AcademAide domain.
//!
//! Uses `thiserror` for ergonomic error definitions. The top-level [`Error`]
//! mirrors the pipeline's failure taxonomy; each collaborator boundary has
//! its own bounded error that lifts into it.

use thiserror::Error;

/// The top-level error type for pipeline operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller's identity does not exist. Fatal to the request.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Embedding or generation service unreachable.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] ProviderError),

    /// Structured generation output could not be parsed.
    #[error("Malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),

    /// A read or write against one of the stores failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// The caller went away before the request finished.
    #[error("Request cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the embedding or generation endpoint.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),
}

/// Failures reading or writing any of the backing stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A row came back that does not fit the domain model.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}
