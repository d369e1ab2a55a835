//! Iteration-pass gate (spec §4.6): combines the four probes (plus the
//! optional PageSpeed composite) into the hard-pass / soft-pass / fail
//! verdict the agent controller (C7) checks each iteration.

use crate::settings::types::VerifySettings;

use super::functional::FunctionalResult;
use super::links::LinkResult;
use super::pagespeed::{self, PageSpeedResult};
use super::performance::PerformanceResult;
use super::visual::VisualResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateVerdict {
    /// All four probes clean, PageSpeed (if enabled) ≥ the hard threshold.
    HardPass,
    /// Visual/functional/links clean, average performance and PageSpeed (if
    /// enabled) clear their lower soft thresholds.
    SoftPass,
    Fail,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GateReport {
    pub verdict: GateVerdict,
    pub reasons: Vec<String>,
}

impl GateVerdict {
    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self, GateVerdict::HardPass | GateVerdict::SoftPass)
    }
}

/// Inputs the gate needs from one verification pass. `pagespeed` is empty
/// when `VerifySettings::pagespeed_enabled` is false.
pub struct GateInputs<'a> {
    pub visual: &'a [VisualResult],
    pub functional: &'a [FunctionalResult],
    pub links: &'a [LinkResult],
    pub performance: &'a [PerformanceResult],
    pub pagespeed: &'a [PageSpeedResult],
}

#[must_use]
pub fn evaluate(inputs: &GateInputs, settings: &VerifySettings) -> GateReport {
    let mut reasons = Vec::new();

    let visual_ok = inputs.visual.iter().all(VisualResult::is_ok);
    if !visual_ok {
        reasons.push("one or more pages failed the visual diff".to_string());
    }
    let functional_ok = inputs.functional.iter().all(|r| r.passed);
    if !functional_ok {
        reasons.push("one or more recorded behaviors failed to replay".to_string());
    }
    let links_ok = inputs.links.iter().all(LinkResult::is_ok);
    if !links_ok {
        reasons.push("one or more outbound links are broken".to_string());
    }

    let base_ok = visual_ok && functional_ok && links_ok;

    let pagespeed_composite =
        if settings.pagespeed_enabled { Some(pagespeed::average_composite(inputs.pagespeed)) } else { None };

    if base_ok {
        let hard_pagespeed_ok = pagespeed_composite.is_none_or(|c| c >= settings.hard_pass_pagespeed_threshold);
        if hard_pagespeed_ok {
            return GateReport { verdict: GateVerdict::HardPass, reasons: Vec::new() };
        }

        let avg_performance = average_performance(inputs.performance);
        let soft_performance_ok = avg_performance >= settings.soft_pass_avg_performance_threshold;
        let soft_pagespeed_ok = pagespeed_composite.is_none_or(|c| c >= settings.soft_pass_pagespeed_threshold);

        if soft_performance_ok && soft_pagespeed_ok {
            return GateReport { verdict: GateVerdict::SoftPass, reasons: Vec::new() };
        }

        if !soft_performance_ok {
            reasons.push(format!(
                "average performance score {avg_performance:.1} below soft threshold {}",
                settings.soft_pass_avg_performance_threshold
            ));
        }
        if !soft_pagespeed_ok {
            reasons.push(format!(
                "PageSpeed composite {:.1} below soft threshold {}",
                pagespeed_composite.unwrap_or(0.0),
                settings.soft_pass_pagespeed_threshold
            ));
        }
    }

    GateReport { verdict: GateVerdict::Fail, reasons }
}

fn average_performance(results: &[PerformanceResult]) -> f64 {
    if results.is_empty() {
        return 100.0;
    }
    results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::visual::VisualVerdict;

    fn settings() -> VerifySettings {
        VerifySettings {
            pagespeed_enabled: false,
            hard_pass_pagespeed_threshold: 85.0,
            soft_pass_pagespeed_threshold: 75.0,
            soft_pass_avg_performance_threshold: 80.0,
        }
    }

    fn clean_visual() -> Vec<VisualResult> {
        vec![VisualResult { url_path: "/".to_string(), verdict: VisualVerdict::Identical, diff_ratio: 0.0 }]
    }

    fn clean_functional() -> Vec<FunctionalResult> {
        vec![FunctionalResult { description: "x".to_string(), passed: true, failure: None }]
    }

    fn clean_links() -> Vec<LinkResult> {
        vec![LinkResult { url: "https://example.com".to_string(), verdict: super::super::links::LinkVerdict::Ok, status: Some(200) }]
    }

    #[test]
    fn hard_pass_when_pagespeed_disabled_and_all_clean() {
        let visual = clean_visual();
        let functional = clean_functional();
        let links = clean_links();
        let performance = vec![PerformanceResult { url_path: "/".to_string(), score: 95.0, load_ms: 500.0, lcp_ms: None }];
        let inputs = GateInputs { visual: &visual, functional: &functional, links: &links, performance: &performance, pagespeed: &[] };
        let report = evaluate(&inputs, &settings());
        assert_eq!(report.verdict, GateVerdict::HardPass);
    }

    #[test]
    fn fail_when_a_link_is_broken() {
        let visual = clean_visual();
        let functional = clean_functional();
        let links = vec![LinkResult {
            url: "https://example.com/missing".to_string(),
            verdict: super::super::links::LinkVerdict::NonSuccess,
            status: Some(404),
        }];
        let performance = vec![PerformanceResult { url_path: "/".to_string(), score: 95.0, load_ms: 500.0, lcp_ms: None }];
        let inputs = GateInputs { visual: &visual, functional: &functional, links: &links, performance: &performance, pagespeed: &[] };
        let report = evaluate(&inputs, &settings());
        assert_eq!(report.verdict, GateVerdict::Fail);
        assert!(!report.reasons.is_empty());
    }

    #[test]
    fn soft_pass_when_pagespeed_enabled_but_below_hard_threshold() {
        let mut s = settings();
        s.pagespeed_enabled = true;
        let visual = clean_visual();
        let functional = clean_functional();
        let links = clean_links();
        let performance = vec![PerformanceResult { url_path: "/".to_string(), score: 90.0, load_ms: 500.0, lcp_ms: None }];
        let pagespeed_results = vec![PageSpeedResult { url_path: "/".to_string(), composite: 80.0 }];
        let inputs =
            GateInputs { visual: &visual, functional: &functional, links: &links, performance: &performance, pagespeed: &pagespeed_results };
        let report = evaluate(&inputs, &s);
        assert_eq!(report.verdict, GateVerdict::SoftPass);
    }

    #[test]
    fn fail_when_pagespeed_enabled_and_below_both_thresholds() {
        let mut s = settings();
        s.pagespeed_enabled = true;
        let visual = clean_visual();
        let functional = clean_functional();
        let links = clean_links();
        let performance = vec![PerformanceResult { url_path: "/".to_string(), score: 50.0, load_ms: 500.0, lcp_ms: None }];
        let pagespeed_results = vec![PageSpeedResult { url_path: "/".to_string(), composite: 40.0 }];
        let inputs =
            GateInputs { visual: &visual, functional: &functional, links: &links, performance: &performance, pagespeed: &pagespeed_results };
        let report = evaluate(&inputs, &s);
        assert_eq!(report.verdict, GateVerdict::Fail);
        assert!(!report.reasons.is_empty());
    }
}
