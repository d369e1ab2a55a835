//! `Build` (spec §3): one run of the pipeline (C5) against a resolved
//! settings snapshot, producing (on success) a published edge URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Queued,
    Running,
    Success,
    Failed,
}

/// What caused the build to be enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum BuildTrigger {
    Manual,
    SettingsChange,
    AgentIteration { agent_run_id: Uuid },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub id: Uuid,
    pub site_id: Uuid,
    pub trigger: BuildTrigger,
    pub status: BuildStatus,
    /// Which pages were in scope — empty means "all pages known from the
    /// last crawl".
    pub scope: Vec<String>,
    pub pages_processed: u32,
    pub pages_total: u32,
    pub error: Option<String>,
    /// The fully-resolved (defaults + overrides) settings this build ran
    /// with — kept so a later diff/replay doesn't depend on mutable state.
    pub resolved_settings: Value,
    pub output_edge_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Build {
    #[must_use]
    pub fn new(site_id: Uuid, trigger: BuildTrigger, resolved_settings: Value, pages_total: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id,
            trigger,
            status: BuildStatus::Queued,
            scope: Vec::new(),
            pages_processed: 0,
            pages_total,
            error: None,
            resolved_settings,
            output_edge_url: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, BuildStatus::Success | BuildStatus::Failed)
    }
}
