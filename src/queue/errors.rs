//! Error types for the build queue (C9).

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("build timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("pipeline failed: {0}")]
    Pipeline(#[source] anyhow::Error),

    #[error("edge publish failed: {0}")]
    Publish(#[source] anyhow::Error),
}
