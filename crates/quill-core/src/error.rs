//! Error types for quill-core

use thiserror::Error;

/// Result type alias using quill-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quill-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Caller input failed validation (blank required field, bad format)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote store rejected or failed a request (retryable)
    #[error("Remote store error: {0}")]
    Remote(String),

    /// Remote HTTP transport failure (retryable)
    #[error("Remote request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected local storage failure
    #[error("Local store error: {0}")]
    LocalStore(String),

    /// SQLite error from the local store driver
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A sync pass aborted; pending records stay pending for the next pass
    #[error("Sync pass failed: {0}")]
    SyncFailed(String),
}

impl Error {
    /// Remote error used when the connectivity oracle reports offline.
    #[must_use]
    pub fn offline() -> Self {
        Self::Remote("offline: remote store unreachable".to_string())
    }

    /// Whether retrying the same operation later can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::Http(_) | Self::SyncFailed(_))
    }
}
