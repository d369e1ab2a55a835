//! Link-reachability probe (spec §4.6): HEAD (falling back to GET) every
//! outbound link on a page, reporting non-2xx responses and
//! redirects-that-land-on-4xx.
//!
//! Mirrors `crawler::download`'s streaming-HTTP shape (same `reqwest::Client`,
//! same "failure becomes a reported result, not a propagated error") but
//! without downloading a body — a link check only needs the status line.

use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};

use crate::utils::constants::CHROME_USER_AGENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkVerdict {
    Ok,
    /// Redirected through to a 4xx/5xx final response.
    BrokenRedirect,
    NonSuccess,
    Unreachable,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LinkResult {
    pub url: String,
    pub verdict: LinkVerdict,
    pub status: Option<u16>,
}

impl LinkResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.verdict == LinkVerdict::Ok
    }
}

/// Every absolute `http(s)` anchor href on the page, deduped, in document
/// order.
#[must_use]
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else { return Vec::new() };

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();
    for el in document.select(&selector) {
        let Some(href) = el.value().attr("href") else { continue };
        if !href.starts_with("http") {
            continue;
        }
        if seen.insert(href.to_string()) {
            links.push(href.to_string());
        }
    }
    links
}

async fn check_one(client: &Client, url: &str) -> LinkResult {
    let response = client.head(url).header("User-Agent", CHROME_USER_AGENT).send().await;

    let response = match response {
        Ok(r) => r,
        Err(_) => match client.get(url).header("User-Agent", CHROME_USER_AGENT).send().await {
            Ok(r) => r,
            Err(_) => return LinkResult { url: url.to_string(), verdict: LinkVerdict::Unreachable, status: None },
        },
    };

    let status = response.status();
    let verdict = classify_status(status, response.url().as_str(), url);
    LinkResult { url: url.to_string(), verdict, status: Some(status.as_u16()) }
}

fn classify_status(status: StatusCode, final_url: &str, original_url: &str) -> LinkVerdict {
    if status.is_success() {
        return LinkVerdict::Ok;
    }
    if status.is_client_error() || status.is_server_error() {
        if final_url != original_url {
            return LinkVerdict::BrokenRedirect;
        }
        return LinkVerdict::NonSuccess;
    }
    LinkVerdict::NonSuccess
}

/// Check every extracted link with bounded concurrency, matching the
/// crawler's own per-domain politeness rather than firing everything at once.
pub async fn verify_links(client: &Client, links: &[String], max_concurrent: usize) -> Vec<LinkResult> {
    use futures::stream::{self, StreamExt};

    stream::iter(links.iter())
        .map(|url| check_one(client, url))
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_links_dedupes_and_filters_relative() {
        let html = r#"
            <a href="https://example.com/a">a</a>
            <a href="https://example.com/a">dup</a>
            <a href="/relative">rel</a>
            <a href="mailto:x@example.com">mail</a>
        "#;
        let links = extract_links(html);
        assert_eq!(links, vec!["https://example.com/a".to_string()]);
    }

    #[test]
    fn classify_status_success() {
        assert_eq!(
            classify_status(StatusCode::OK, "https://example.com/a", "https://example.com/a"),
            LinkVerdict::Ok
        );
    }

    #[test]
    fn classify_status_redirect_to_404_is_broken_redirect() {
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND, "https://example.com/final", "https://example.com/a"),
            LinkVerdict::BrokenRedirect
        );
    }

    #[test]
    fn classify_status_direct_404_is_non_success() {
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND, "https://example.com/a", "https://example.com/a"),
            LinkVerdict::NonSuccess
        );
    }
}
