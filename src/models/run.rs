//! `AgentRun` and its checkpoint (spec §3, §4.7): the durable state of one
//! autonomous optimize-measure-iterate loop (C7) against a Site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

use super::inventory::SiteInventory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRunStatus {
    Running,
    Completed,
    Failed,
    /// Stopped via `stopAgent` (spec §5 "Cancellation"): the abort flag was
    /// observed at a phase boundary and the loop exited without finishing.
    Aborted,
}

/// Where in the optimize-measure-iterate loop a run currently sits.
/// Persisted in the checkpoint so a resumed run starts from the right step
/// rather than re-running completed work (spec §4.7 resume semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    Crawling,
    Planning,
    Building,
    Verifying,
    Measuring,
    Reviewing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationResult {
    pub iteration: u32,
    pub settings_snapshot: Value,
    pub build_id: Option<Uuid>,
    pub edge_url: Option<String>,
    pub visual_results: Vec<String>,
    pub functional_results: Vec<String>,
    pub link_results: Vec<String>,
    pub performance_results: Vec<String>,
    pub pagespeed_scores: HashMap<String, f64>,
}

/// The opaque-to-callers resumable state of an `AgentRun`. "Opaque" per the
/// spec means other components treat it as a blob; the controller (C7) is
/// the only reader/writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub inventory: Option<SiteInventory>,
    /// The planner's (C7) proposed next settings change, pending review.
    pub plan: Option<Value>,
    pub pagespeed_snapshot: Option<Value>,
    pub current_settings: Value,
    pub iteration_history: Vec<IterationResult>,
    /// Wall-clock spent per phase across the run, keyed by `AgentPhase`
    /// discriminant name — used for the agent's own progress reporting.
    pub phase_timings: HashMap<String, f64>,
    pub last_completed_phase: Option<AgentPhase>,
}

impl Checkpoint {
    #[must_use]
    pub fn new(initial_settings: Value) -> Self {
        Self {
            inventory: None,
            plan: None,
            pagespeed_snapshot: None,
            current_settings: initial_settings,
            iteration_history: Vec::new(),
            phase_timings: HashMap::new(),
            last_completed_phase: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRun {
    pub id: Uuid,
    pub site_id: Uuid,
    pub status: AgentRunStatus,
    pub current_phase: AgentPhase,
    pub iteration: u32,
    pub work_dir: PathBuf,
    pub checkpoint: Checkpoint,
    /// Most recent log entries, bounded (spec §6 event payload shape);
    /// the full history lives in the event bus / store, not here.
    pub recent_log_tail: Vec<String>,
    pub last_error: Option<String>,
    pub last_successful_phase: Option<AgentPhase>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentRun {
    #[must_use]
    pub fn new(site_id: Uuid, work_dir: PathBuf, initial_settings: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            site_id,
            status: AgentRunStatus::Running,
            current_phase: AgentPhase::Crawling,
            iteration: 0,
            work_dir,
            checkpoint: Checkpoint::new(initial_settings),
            recent_log_tail: Vec::new(),
            last_error: None,
            last_successful_phase: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn advance_phase(&mut self, phase: AgentPhase) {
        self.last_successful_phase = Some(self.current_phase);
        self.current_phase = phase;
        self.checkpoint.last_completed_phase = Some(self.current_phase);
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = AgentRunStatus::Failed;
        self.last_error = Some(error.into());
        self.updated_at = Utc::now();
    }
}
