//! The `Site` aggregate (spec §3): identity, override settings, lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle state of a site, independent of any single Build or AgentRun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteLifecycle {
    /// Never built.
    New,
    /// At least one successful Build has published an edge URL.
    Live,
    /// The last Build failed and no prior successful edge URL exists.
    Failing,
    /// Soft-deleted; no further builds or agent runs may start.
    Archived,
}

/// A site under optimization.
///
/// **Invariant (spec §3.i):** at most one active `AgentRun` and at most one
/// running `Build` exist for a given Site at any time. That invariant is
/// enforced by the queue/registry (C9), not by this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: Uuid,
    pub origin_url: String,
    /// User-supplied overrides, a sparse subtree over the settings schema.
    /// Kept as `Value` rather than the typed `Settings` struct because it is
    /// intentionally a *partial*, schema-validated-on-intake document (see
    /// `settings::schema::validate`), not a fully resolved tree.
    pub settings_overrides: Value,
    pub latest_edge_url: Option<String>,
    pub lifecycle: SiteLifecycle,
}

impl Site {
    #[must_use]
    pub fn new(origin_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin_url: origin_url.into(),
            settings_overrides: Value::Object(serde_json::Map::new()),
            latest_edge_url: None,
            lifecycle: SiteLifecycle::New,
        }
    }
}
