//! External reviewer boundary (spec §1 Non-goals), called after an
//! iteration that didn't meet the iteration-pass rule (spec §4.7 step 6).

use serde_json::Value;

use crate::models::IterationResult;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReviewVerdict {
    pub should_rebuild: bool,
    pub setting_changes: Value,
    pub overall_verdict: String,
}

pub trait Reviewer: Send + Sync {
    fn review(
        &self,
        latest: &IterationResult,
        history: &[IterationResult],
    ) -> impl Future<Output = anyhow::Result<ReviewVerdict>> + Send;
}
