//! Error types for the edge publisher boundary.

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to copy build output to the publish target: {0}")]
    Io(#[source] std::io::Error),

    #[error("publish target rejected the deploy: {0}")]
    Remote(String),
}
