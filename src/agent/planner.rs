//! External planner boundary (spec §1 Non-goals: "the remote LLM
//! planner/reviewer \[is\] treated as an opaque advisor returning
//! structured suggestions"). `Planner` is the narrow trait the agent
//! controller (C7) calls once per run, right after the first crawl, to
//! get the initial optimization plan (spec §4.7 step 2).

use serde_json::Value;

use crate::models::SiteInventory;

/// A proposed settings patch plus the planner's rationale for it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlannerSuggestion {
    pub settings_patch: Value,
    pub rationale: String,
}

pub trait Planner: Send + Sync {
    fn plan(
        &self,
        inventory: &SiteInventory,
        pagespeed_snapshot: Option<&Value>,
        current_settings: &Value,
    ) -> impl Future<Output = anyhow::Result<PlannerSuggestion>> + Send;
}
