//! HTTP-backed `Planner`/`Reviewer` (spec §1 Non-goals: "the remote LLM
//! planner/reviewer \[is\] treated as an opaque advisor returning structured
//! suggestions"). These are the concrete collaborators the CLI wires up by
//! default; a deployment with its own LLM orchestration implements the same
//! two traits directly instead of going over HTTP.
//!
//! Uses the same `reqwest::Client` + `?error_for_status()` + `.json()` shape
//! as `verify::pagespeed::fetch`, posting a JSON request body instead of
//! querying one.

use reqwest::Client;
use serde_json::{Value, json};

use crate::models::{IterationResult, SiteInventory};

use super::planner::{Planner, PlannerSuggestion};
use super::reviewer::{ReviewVerdict, Reviewer};

/// Calls an external planner endpoint once per run, right after the first
/// crawl (spec §4.7 step 2).
pub struct RemotePlanner {
    client: Client,
    endpoint: String,
}

impl RemotePlanner {
    #[must_use]
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self { client, endpoint: endpoint.into() }
    }
}

impl Planner for RemotePlanner {
    async fn plan(
        &self,
        inventory: &SiteInventory,
        pagespeed_snapshot: Option<&Value>,
        current_settings: &Value,
    ) -> anyhow::Result<PlannerSuggestion> {
        let body = json!({
            "inventory": inventory,
            "pagespeedSnapshot": pagespeed_snapshot,
            "currentSettings": current_settings,
        });

        let suggestion = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<PlannerSuggestion>()
            .await?;

        Ok(suggestion)
    }
}

/// Calls an external reviewer endpoint after an iteration that didn't meet
/// the iteration-pass rule (spec §4.7 step 6).
pub struct RemoteReviewer {
    client: Client,
    endpoint: String,
}

impl RemoteReviewer {
    #[must_use]
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self { client, endpoint: endpoint.into() }
    }
}

impl Reviewer for RemoteReviewer {
    async fn review(&self, latest: &IterationResult, history: &[IterationResult]) -> anyhow::Result<ReviewVerdict> {
        let body = json!({ "latest": latest, "history": history });

        let verdict = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ReviewVerdict>()
            .await?;

        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planner_and_reviewer_are_constructible_with_any_endpoint() {
        let _planner = RemotePlanner::new(Client::new(), "https://planner.example/plan");
        let _reviewer = RemoteReviewer::new(Client::new(), "https://reviewer.example/review");
    }
}
