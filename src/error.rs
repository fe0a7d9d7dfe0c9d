//! Error types for atlas-sync

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Document error: {0}")]
    Doc(#[from] loro::LoroError),

    #[error("Encode error: {0}")]
    Encode(#[from] loro::LoroEncodeError),

    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
