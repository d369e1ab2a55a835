//! Error types for the agent controller (C7).

use std::path::PathBuf;

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("an agent run is already active for site {site_id}")]
    AlreadyRunning { site_id: Uuid },

    #[error("resume target's work directory is missing: {0}")]
    WorkDirMissing(PathBuf),

    #[error("checkpoint inventory missing past the first iteration")]
    MissingInventory,

    #[error("crawl failed: {0}")]
    Crawl(#[source] crate::crawler::CrawlError),

    #[error("checkpoint store error: {0}")]
    Store(#[source] crate::store::StoreError),

    #[error("build queue error: {0}")]
    Queue(#[source] crate::queue::QueueError),

    #[error("planner failed: {0}")]
    Planner(#[source] anyhow::Error),

    #[error("reviewer failed: {0}")]
    Reviewer(#[source] anyhow::Error),

    #[error("browser driver unavailable: {0}")]
    DriverUnavailable(#[source] anyhow::Error),

    #[error("settings snapshot did not match the expected shape: {0}")]
    SettingsShape(#[source] serde_json::Error),

    #[error("build failed: {0}")]
    BuildFailed(String),
}
