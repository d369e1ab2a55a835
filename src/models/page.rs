//! `CrawledPage` and the interactive-behavior catalog (spec §3, §4.2).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractiveElement {
    pub selector: String,
    /// "form" | "button" | "link" | "modal" | "dropdown" | "slider" | ...
    pub kind: String,
    pub recorded_behavior: Option<String>,
}

/// A small, replayable assertion recorded against the pre-optimization site:
/// "click selector S; assert class A appears on selector T".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineBehavior {
    pub description: String,
    pub action_selector: String,
    pub action: BehaviorAction,
    pub assertion: BehaviorAssertion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum BehaviorAction {
    Click,
    Submit,
    Hover,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum BehaviorAssertion {
    /// `selector` gains `class_name`.
    ClassAppears { selector: String, class_name: String },
    /// Navigation occurs to a URL matching `url_contains`.
    Navigates { url_contains: String },
    /// `selector` becomes visible.
    BecomesVisible { selector: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledPage {
    pub url_path: String,
    pub raw_html: String,
    pub title: String,
    pub content_hash: String,
    /// Ordered as discovered in the DOM; duplicates removed.
    pub referenced_asset_urls: Vec<String>,
    pub interactive_elements: Vec<InteractiveElement>,
    pub baseline_behaviors: Vec<BaselineBehavior>,
    /// PNG bytes captured at the standard crawl viewport.
    pub screenshot: Vec<u8>,
    /// CSS rules (by selector text) observed to be applied while rendering
    /// this page — feeds the critical-CSS split in the HTML rewriter.
    pub css_coverage: Vec<String>,
}
