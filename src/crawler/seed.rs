//! Crawl seeding (spec §4.2 step 1): sitemap parse, explicit URL list, or
//! pattern expansion against the homepage's link graph.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::browser::BrowsingDriver;
use crate::settings::types::{BuildSettings, PageSelection};

use super::errors::CrawlError;
use super::glob;

/// Seed URLs are always deduped while preserving first-seen order, matching
/// the crawler's "page ordering = discovery order" guarantee.
fn dedup_preserve_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

/// Parse a sitemap.xml's `<loc>` entries. Nested sitemap indexes are not
/// followed — a single flat sitemap is the common case this supports.
async fn parse_sitemap(client: &reqwest::Client, sitemap_url: &str) -> Result<Vec<String>> {
    let body = client
        .get(sitemap_url)
        .send()
        .await
        .context("failed to fetch sitemap")?
        .error_for_status()
        .context("sitemap request returned an error status")?
        .text()
        .await
        .context("failed to read sitemap body")?;

    let mut reader = Reader::from_str(&body);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut in_loc = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"loc" => in_loc = true,
            Ok(Event::End(e)) if e.name().as_ref() == b"loc" => in_loc = false,
            Ok(Event::Text(t)) if in_loc => {
                if let Ok(text) = t.unescape() {
                    urls.push(text.into_owned());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow::anyhow!("malformed sitemap XML: {e}")),
            _ => {}
        }
        buf.clear();
    }
    Ok(urls)
}

/// Expand a pattern against the homepage's link graph: navigate to
/// `origin`, collect every same-origin `<a href>`, and keep the ones whose
/// path matches one of `patterns`.
async fn expand_pattern(
    driver: &impl BrowsingDriver,
    origin: &str,
    patterns: &[String],
) -> Result<Vec<String>> {
    driver
        .navigate(origin, std::time::Duration::from_secs(30))
        .await
        .context("failed to navigate to homepage for pattern seeding")?;

    let links_script = r#"
        Array.from(document.querySelectorAll('a[href]'))
            .map(a => a.href)
            .filter(h => h.startsWith('http'))
    "#;
    let value = driver
        .evaluate_json(links_script)
        .await
        .context("homepage link extraction failed")?;
    let links: Vec<String> =
        serde_json::from_value(value).context("homepage link script returned unexpected shape")?;

    let origin_host = url::Url::parse(origin)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));

    Ok(links
        .into_iter()
        .filter(|link| {
            let same_origin = url::Url::parse(link)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                == origin_host;
            same_origin && glob::matches_any(link, patterns)
        })
        .collect())
}

/// Produce the initial seed list for a crawl, per `build.pageSelection`.
///
/// `custom_urls` doubles as both the `url_list` selection's input and the
/// `pattern` selection's match patterns (spec: settings don't carry a
/// separate patterns field, so the same list serves both roles by mode).
pub async fn seed_urls(
    driver: &impl BrowsingDriver,
    http_client: &reqwest::Client,
    origin: &str,
    build: &BuildSettings,
) -> Result<Vec<String>, CrawlError> {
    let urls = match build.page_selection {
        PageSelection::Sitemap => {
            let sitemap_url = format!("{}/sitemap.xml", origin.trim_end_matches('/'));
            parse_sitemap(http_client, &sitemap_url)
                .await
                .map_err(|e| CrawlError::Seed(e.to_string()))?
        }
        PageSelection::UrlList => build.custom_urls.clone(),
        PageSelection::Pattern => expand_pattern(driver, origin, &build.custom_urls)
            .await
            .map_err(|e| CrawlError::Seed(e.to_string()))?,
    };

    let mut urls = dedup_preserve_order(urls);
    if urls.is_empty() {
        urls.push(origin.to_string());
    }
    Ok(urls)
}
