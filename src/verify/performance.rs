//! Synthetic performance probe (spec §4.6): navigate to the optimized page
//! and score its load timing 0–100, without depending on a remote audit
//! service (that's `pagespeed`'s job, optional and separate).
//!
//! Reads the Navigation Timing Level 2 API via `evaluate_json`, the same
//! in-page-script capability the crawler uses for DOM queries
//! (`crawler::probe`) — just a different script.

use std::time::Duration;

use serde::Deserialize;

use crate::browser::BrowsingDriver;

use super::errors::VerifyError;

const TIMING_SCRIPT: &str = r#"
    (() => {
        const nav = performance.getEntriesByType('navigation')[0];
        if (!nav) return null;
        return {
            domContentLoadedMs: nav.domContentLoadedEventEnd,
            loadMs: nav.loadEventEnd,
            lcpMs: (() => {
                const entries = performance.getEntriesByType('largest-contentful-paint');
                return entries.length ? entries[entries.length - 1].renderTime || entries[entries.length - 1].loadTime : null;
            })(),
        };
    })()
"#;

#[derive(Debug, Deserialize)]
struct Timing {
    #[serde(rename = "domContentLoadedMs")]
    dom_content_loaded_ms: f64,
    #[serde(rename = "loadMs")]
    load_ms: f64,
    #[serde(rename = "lcpMs")]
    lcp_ms: Option<f64>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PerformanceResult {
    pub url_path: String,
    pub score: f64,
    pub load_ms: f64,
    pub lcp_ms: Option<f64>,
}

/// Map a millisecond timing to a 0–100 score via linear interpolation
/// between a "perfect" and a "failing" threshold — the same shape
/// Lighthouse uses for its lab metrics, simplified to one knee instead of a
/// log curve since this probe only has to be internally consistent across
/// iterations of the same site, not comparable to Lighthouse's own scores.
fn score_metric(value_ms: f64, good_ms: f64, poor_ms: f64) -> f64 {
    if value_ms <= good_ms {
        100.0
    } else if value_ms >= poor_ms {
        0.0
    } else {
        100.0 * (poor_ms - value_ms) / (poor_ms - good_ms)
    }
}

fn composite_score(timing: &Timing) -> f64 {
    let load_score = score_metric(timing.load_ms, 1_500.0, 8_000.0);
    let dcl_score = score_metric(timing.dom_content_loaded_ms, 1_000.0, 5_000.0);
    let lcp_score = timing.lcp_ms.map(|lcp| score_metric(lcp, 2_500.0, 6_000.0));

    match lcp_score {
        Some(lcp) => load_score * 0.4 + dcl_score * 0.2 + lcp * 0.4,
        None => load_score * 0.6 + dcl_score * 0.4,
    }
}

pub async fn verify_page(
    driver: &impl BrowsingDriver,
    url_path: &str,
    page_url: &str,
    settle_after: Duration,
    load_timeout: Duration,
) -> Result<PerformanceResult, VerifyError> {
    driver
        .navigate(page_url, load_timeout)
        .await
        .map_err(|source| VerifyError::Navigation { url: page_url.to_string(), source })?;
    driver.settle(settle_after).await;

    let value = driver
        .evaluate_json(TIMING_SCRIPT)
        .await
        .map_err(|source| VerifyError::Navigation { url: page_url.to_string(), source })?;
    let timing: Option<Timing> = serde_json::from_value(value).unwrap_or(None);

    match timing {
        Some(timing) => Ok(PerformanceResult {
            url_path: url_path.to_string(),
            score: composite_score(&timing),
            load_ms: timing.load_ms,
            lcp_ms: timing.lcp_ms,
        }),
        None => Ok(PerformanceResult { url_path: url_path.to_string(), score: 0.0, load_ms: 0.0, lcp_ms: None }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_load_scores_perfectly() {
        assert_eq!(score_metric(500.0, 1_500.0, 8_000.0), 100.0);
    }

    #[test]
    fn slow_load_scores_zero() {
        assert_eq!(score_metric(10_000.0, 1_500.0, 8_000.0), 0.0);
    }

    #[test]
    fn midrange_load_is_interpolated() {
        let mid = (1_500.0 + 8_000.0) / 2.0;
        let score = score_metric(mid, 1_500.0, 8_000.0);
        assert!((score - 50.0).abs() < 0.01);
    }

    #[test]
    fn composite_weights_lcp_when_present() {
        let with_lcp = Timing { dom_content_loaded_ms: 500.0, load_ms: 800.0, lcp_ms: Some(1_000.0) };
        let without_lcp = Timing { dom_content_loaded_ms: 500.0, load_ms: 800.0, lcp_ms: None };
        assert_eq!(composite_score(&with_lcp), 100.0);
        assert_eq!(composite_score(&without_lcp), 100.0);
    }
}
