//! Turns one navigated page into the DOM-derived parts of a `CrawledPage`:
//! asset URLs, jQuery usage, CSS coverage, and replayed baseline behaviors.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::browser::BrowsingDriver;
use crate::models::page::{BaselineBehavior, BehaviorAction, BehaviorAssertion, InteractiveElement};

use super::probe::{
    ASSET_DISCOVERY_SCRIPT, CSS_COVERAGE_SCRIPT, JQUERY_USAGE_SCRIPT, candidates_script,
    snapshot_script, trigger_script,
};

#[derive(Debug, Deserialize)]
struct JqueryUsage {
    #[serde(rename = "usesJquery")]
    uses_jquery: bool,
    scripts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    selector: String,
    kind: String,
    action: String,
}

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

/// DOM-query every asset the page references.
pub async fn discover_asset_urls(driver: &impl BrowsingDriver) -> Result<Vec<String>> {
    let value = driver
        .evaluate_json(ASSET_DISCOVERY_SCRIPT)
        .await
        .context("asset discovery script failed")?;
    serde_json::from_value(value).context("asset discovery script returned unexpected shape")
}

/// Whether the page uses jQuery, plus its own external scripts as a
/// conservative "depends on jQuery being present" set.
pub async fn detect_jquery_usage(driver: &impl BrowsingDriver) -> Result<(bool, Vec<String>)> {
    let value = driver
        .evaluate_json(JQUERY_USAGE_SCRIPT)
        .await
        .context("jQuery usage script failed")?;
    let usage: JqueryUsage =
        serde_json::from_value(value).context("jQuery usage script returned unexpected shape")?;
    Ok((usage.uses_jquery, usage.scripts))
}

/// Approximate CSS rule coverage (selectors that currently match the DOM).
pub async fn capture_css_coverage(driver: &impl BrowsingDriver) -> Result<Vec<String>> {
    let value = driver
        .evaluate_json(CSS_COVERAGE_SCRIPT)
        .await
        .context("CSS coverage script failed")?;
    serde_json::from_value(value).context("CSS coverage script returned unexpected shape")
}

/// Find interactive-probe candidates, click/submit each one, and record any
/// observed class/visibility/navigation change as a `BaselineBehavior`
/// (spec §4.2 step 2's "replay a scripted catalog of interactive probes").
///
/// Per-probe failures are swallowed: one unresponsive element must not lose
/// behaviors recorded from the rest of the page.
pub async fn probe_interactive_behaviors(
    driver: &impl BrowsingDriver,
    current_url: &str,
) -> Result<(Vec<InteractiveElement>, Vec<BaselineBehavior>)> {
    let candidates_value = driver
        .evaluate_json(&candidates_script())
        .await
        .context("interactive candidate script failed")?;
    let candidates: Vec<Candidate> = serde_json::from_value(candidates_value)
        .context("interactive candidate script returned unexpected shape")?;

    if candidates.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let selectors: Vec<String> = candidates.iter().map(|c| c.selector.clone()).collect();
    let elements: Vec<InteractiveElement> = candidates
        .iter()
        .map(|c| InteractiveElement {
            selector: c.selector.clone(),
            kind: c.kind.clone(),
            recorded_behavior: None,
        })
        .collect();

    let before = snapshot(driver, &selectors).await.unwrap_or_default();

    let mut behaviors = Vec::new();
    for candidate in &candidates {
        let Ok(trigger_value) = driver
            .evaluate_json(&trigger_script(&candidate.selector, &candidate.action))
            .await
        else {
            continue;
        };
        let Ok(result) = serde_json::from_value::<TriggerResult>(trigger_value) else {
            continue;
        };
        if !result.ok {
            continue;
        }

        driver.settle(Duration::from_millis(300)).await;

        let after = snapshot(driver, std::slice::from_ref(&candidate.selector))
            .await
            .unwrap_or_default();

        if let Some(behavior) = diff_behavior(candidate, &before, &after, current_url, result.url.as_deref()) {
            behaviors.push(behavior);
        }
    }

    Ok((elements, behaviors))
}

async fn snapshot(
    driver: &impl BrowsingDriver,
    selectors: &[String],
) -> Result<HashMap<String, ElementSnapshot>> {
    let value = driver
        .evaluate_json(&snapshot_script(selectors))
        .await
        .context("snapshot script failed")?;
    serde_json::from_value(value).context("snapshot script returned unexpected shape")
}

fn diff_behavior(
    candidate: &Candidate,
    before: &HashMap<String, ElementSnapshot>,
    after: &HashMap<String, ElementSnapshot>,
    current_url: &str,
    navigated_to: Option<&str>,
) -> Option<BaselineBehavior> {
    if let Some(dest) = navigated_to
        && dest != current_url
    {
        return Some(BaselineBehavior {
            description: format!("{} {} navigates to {}", candidate.action, candidate.selector, dest),
            action_selector: candidate.selector.clone(),
            action: behavior_action(&candidate.action),
            assertion: BehaviorAssertion::Navigates { url_contains: dest.to_string() },
        });
    }

    let before_state = before.get(&candidate.selector);
    let after_state = after.get(&candidate.selector);

    if let (Some(b), Some(a)) = (before_state, after_state) {
        if !b.visible && a.visible {
            return Some(BaselineBehavior {
                description: format!("{} {} becomes visible", candidate.action, candidate.selector),
                action_selector: candidate.selector.clone(),
                action: behavior_action(&candidate.action),
                assertion: BehaviorAssertion::BecomesVisible { selector: candidate.selector.clone() },
            });
        }
        if let Some(added_class) = newly_added_class(&b.class_name, &a.class_name) {
            return Some(BaselineBehavior {
                description: format!(
                    "{} {} adds class {}",
                    candidate.action, candidate.selector, added_class
                ),
                action_selector: candidate.selector.clone(),
                action: behavior_action(&candidate.action),
                assertion: BehaviorAssertion::ClassAppears {
                    selector: candidate.selector.clone(),
                    class_name: added_class,
                },
            });
        }
    }

    None
}

fn newly_added_class(before: &str, after: &str) -> Option<String> {
    let before_set: std::collections::HashSet<&str> = before.split_whitespace().collect();
    after
        .split_whitespace()
        .find(|c| !before_set.contains(c))
        .map(str::to_string)
}

fn behavior_action(action: &str) -> BehaviorAction {
    match action {
        "submit" => BehaviorAction::Submit,
        _ => BehaviorAction::Click,
    }
}
