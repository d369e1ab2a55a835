//! Optional PageSpeed Insights probe (spec §4.6): when `verify.pagespeedEnabled`
//! is set, fetch the remote audit for a page and reduce it to the single
//! composite score the iteration-pass rule consumes.
//!
//! Uses the same `reqwest::Client` + `?error_for_status()` shape as
//! `crawler::download`'s HTTP fetch, reading a JSON body instead of bytes.

use reqwest::Client;
use serde_json::Value;

use super::errors::VerifyError;

const PAGESPEED_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PageSpeedResult {
    pub url_path: String,
    pub composite: f64,
}

/// Fetch the PageSpeed Insights "performance" category score for `page_url`
/// (mobile strategy, matching the spec's synthetic mobile-first framing).
/// `api_key` is optional — the anonymous quota is enough for occasional
/// verification runs.
pub async fn fetch(client: &Client, url_path: &str, page_url: &str, api_key: Option<&str>) -> Result<PageSpeedResult, VerifyError> {
    let mut query = vec![("url", page_url), ("strategy", "mobile"), ("category", "performance")];
    if let Some(key) = api_key {
        query.push(("key", key));
    }

    let body: Value = client
        .get(PAGESPEED_ENDPOINT)
        .query(&query)
        .send()
        .await
        .map_err(|source| VerifyError::Request { url: page_url.to_string(), source })?
        .error_for_status()
        .map_err(|source| VerifyError::Request { url: page_url.to_string(), source })?
        .json()
        .await
        .map_err(|source| VerifyError::Request { url: page_url.to_string(), source })?;

    let composite = extract_performance_score(&body)?;
    Ok(PageSpeedResult { url_path: url_path.to_string(), composite })
}

fn extract_performance_score(body: &Value) -> Result<f64, VerifyError> {
    body.pointer("/lighthouseResult/categories/performance/score")
        .and_then(Value::as_f64)
        .map(|score| score * 100.0)
        .ok_or_else(|| VerifyError::PageSpeedShape("missing lighthouseResult.categories.performance.score".to_string()))
}

/// Average composite across every page probed, used against
/// `VerifySettings::{hard,soft}_pass_pagespeed_threshold`.
#[must_use]
pub fn average_composite(results: &[PageSpeedResult]) -> f64 {
    if results.is_empty() {
        return 100.0;
    }
    results.iter().map(|r| r.composite).sum::<f64>() / results.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_score_and_scales_to_100() {
        let body = json!({
            "lighthouseResult": { "categories": { "performance": { "score": 0.87 } } }
        });
        let score = extract_performance_score(&body).unwrap();
        assert!((score - 87.0).abs() < 0.001);
    }

    #[test]
    fn missing_shape_is_an_error() {
        let body = json!({ "unexpected": true });
        assert!(extract_performance_score(&body).is_err());
    }

    #[test]
    fn average_of_empty_results_is_perfect() {
        assert_eq!(average_composite(&[]), 100.0);
    }

    #[test]
    fn average_composite_averages() {
        let results = vec![
            PageSpeedResult { url_path: "/a".to_string(), composite: 80.0 },
            PageSpeedResult { url_path: "/b".to_string(), composite: 90.0 },
        ];
        assert_eq!(average_composite(&results), 85.0);
    }
}
