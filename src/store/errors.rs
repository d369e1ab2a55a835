//! Error types for the checkpoint/history store boundary.

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no checkpoint found for run {run_id}")]
    NotFound { run_id: Uuid },

    #[error("checkpoint I/O failed: {0}")]
    Io(#[source] std::io::Error),

    #[error("checkpoint serialization failed: {0}")]
    Serde(#[source] serde_json::Error),
}
