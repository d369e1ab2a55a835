//! Functional probe (spec §4.6): replay each recorded `BaselineBehavior`
//! against the optimized edge and check its assertion still holds.
//!
//! Reuses the crawler's own trigger/snapshot scripts (`crawler::probe`)
//! rather than a second copy — the same click-and-read-DOM shape that
//! recorded the behavior in the first place is what has to reproduce it.

use std::time::Duration;

use serde::Deserialize;

use crate::browser::BrowsingDriver;
use crate::crawler::probe::{snapshot_script, trigger_script};
use crate::models::page::{BaselineBehavior, BehaviorAssertion};

#[derive(Debug, Deserialize)]
struct ElementSnapshot {
    #[serde(rename = "className")]
    class_name: String,
    visible: bool,
}

#[derive(Debug, Deserialize)]
struct TriggerResult {
    ok: bool,
    url: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FunctionalResult {
    pub description: String,
    pub passed: bool,
    pub failure: Option<String>,
}

/// Replay one behavior: trigger its action, then check the assertion it
/// recorded. Any script/navigation failure along the way is reported as a
/// normal `failed` result rather than propagated — a single bad probe must
/// not abort the rest of the functional pass (same shape as the crawler's
/// own probe swallowing, spec §4.2).
pub async fn verify_behavior(driver: &impl BrowsingDriver, behavior: &BaselineBehavior) -> FunctionalResult {
    let action = match &behavior.action {
        crate::models::page::BehaviorAction::Submit => "submit",
        _ => "click",
    };

    let trigger_value = match driver.evaluate_json(&trigger_script(&behavior.action_selector, action)).await {
        Ok(v) => v,
        Err(e) => return failed(behavior, format!("trigger script failed: {e}")),
    };
    let trigger: TriggerResult = match serde_json::from_value(trigger_value) {
        Ok(t) => t,
        Err(e) => return failed(behavior, format!("trigger result had unexpected shape: {e}")),
    };
    if !trigger.ok {
        return failed(behavior, "element not found or action could not run".to_string());
    }

    driver.settle(Duration::from_millis(300)).await;

    match &behavior.assertion {
        BehaviorAssertion::Navigates { url_contains } => {
            let current = driver.current_url().await.unwrap_or_default();
            let navigated_to = trigger.url.unwrap_or(current);
            if navigated_to.contains(url_contains.as_str()) {
                passed(behavior)
            } else {
                failed(behavior, format!("expected navigation to contain {url_contains:?}, got {navigated_to:?}"))
            }
        }
        BehaviorAssertion::BecomesVisible { selector } => {
            match snapshot_one(driver, selector).await {
                Some(s) if s.visible => passed(behavior),
                Some(_) => failed(behavior, format!("{selector} did not become visible")),
                None => failed(behavior, format!("{selector} not found after action")),
            }
        }
        BehaviorAssertion::ClassAppears { selector, class_name } => match snapshot_one(driver, selector).await {
            Some(s) if s.class_name.split_whitespace().any(|c| c == class_name) => passed(behavior),
            Some(s) => failed(behavior, format!("{selector} classes were {:?}, expected {class_name:?}", s.class_name)),
            None => failed(behavior, format!("{selector} not found after action")),
        },
    }
}

async fn snapshot_one(driver: &impl BrowsingDriver, selector: &str) -> Option<ElementSnapshot> {
    let value = driver.evaluate_json(&snapshot_script(std::slice::from_ref(&selector.to_string()))).await.ok()?;
    let mut map: std::collections::HashMap<String, ElementSnapshot> = serde_json::from_value(value).ok()?;
    map.remove(selector)
}

fn passed(behavior: &BaselineBehavior) -> FunctionalResult {
    FunctionalResult { description: behavior.description.clone(), passed: true, failure: None }
}

fn failed(behavior: &BaselineBehavior, reason: String) -> FunctionalResult {
    FunctionalResult { description: behavior.description.clone(), passed: false, failure: Some(reason) }
}

/// Replay every recorded behavior for a page in sequence (order matters:
/// later probes may depend on DOM state a prior click left behind).
pub async fn verify_page(driver: &impl BrowsingDriver, behaviors: &[BaselineBehavior]) -> Vec<FunctionalResult> {
    let mut results = Vec::with_capacity(behaviors.len());
    for behavior in behaviors {
        results.push(verify_behavior(driver, behavior).await);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::page::BehaviorAction;

    fn behavior() -> BaselineBehavior {
        BaselineBehavior {
            description: "click .menu adds open class".to_string(),
            action_selector: ".menu".to_string(),
            action: BehaviorAction::Click,
            assertion: BehaviorAssertion::ClassAppears { selector: ".menu".to_string(), class_name: "open".to_string() },
        }
    }

    #[test]
    fn passed_result_has_no_failure_reason() {
        let r = passed(&behavior());
        assert!(r.passed);
        assert!(r.failure.is_none());
    }

    #[test]
    fn failed_result_carries_reason() {
        let r = failed(&behavior(), "boom".to_string());
        assert!(!r.passed);
        assert_eq!(r.failure.as_deref(), Some("boom"));
    }
}
