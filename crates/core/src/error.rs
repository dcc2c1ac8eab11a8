//! Unified error types for the catalog service.
//!
//! Every variant renders with a stable upper-snake code prefix so callers
//! (and the MCP surface) can match on the failure class without parsing prose.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

use crate::config::ConfigError;

/// Unified error types for the catalog service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an unknown availability keyword).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Lookup against the cached catalog found nothing.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Network failure while talking to the remote catalog.
    #[error("FETCH_FAILED: {endpoint}{}: {reason}", page_label(page))]
    FetchFailed { endpoint: String, page: Option<u32>, reason: String },

    /// Remote catalog answered with a non-success status.
    #[error("HTTP_ERROR: {endpoint}{} returned status {status}", page_label(page))]
    HttpError { endpoint: String, page: Option<u32>, status: u16 },

    /// Remote catalog body was not the expected JSON envelope.
    #[error("PARSE_FAILED: {endpoint}{}: {reason}", page_label(page))]
    ParseFailed { endpoint: String, page: Option<u32>, reason: String },

    /// A sync was cancelled before it committed.
    #[error("SYNC_CANCELLED")]
    SyncCancelled,

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Catalog data could not be serialized for the cache.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or is invalid.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),
}

fn page_label(page: &Option<u32>) -> String {
    page.map(|p| format!(" (page {p})")).unwrap_or_default()
}

impl Error {
    /// The page number a remote failure refers to, if any.
    pub fn page(&self) -> Option<u32> {
        match self {
            Error::FetchFailed { page, .. } | Error::HttpError { page, .. } | Error::ParseFailed { page, .. } => *page,
            _ => None,
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::NotFound(_) => -32001,
            Error::Database(_) | Error::MigrationFailed(_) | Error::Serialization(_) => -32002,
            Error::FetchFailed { .. } => -32003,
            Error::HttpError { .. } => -32004,
            Error::ParseFailed { .. } => -32005,
            Error::SyncCancelled => -32006,
            Error::Config(_) => -32007,
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
