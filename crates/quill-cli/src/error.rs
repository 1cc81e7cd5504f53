use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] quill_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Note title cannot be empty")]
    EmptyTitle,
    #[error("Category name cannot be empty")]
    EmptyName,
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(
        "Sync is not configured. Set QUILL_REMOTE_URL (and optionally QUILL_REMOTE_TOKEN) to enable it."
    )]
    SyncNotConfigured,
}
