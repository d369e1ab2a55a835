//! The crawler orchestrator (C2): drives the four-step algorithm from spec
//! §4.2 — seed, navigate-and-extract each seed with bounded concurrency,
//! dedupe/filter/cap, download assets — and assembles the result into a
//! `SiteInventory`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use reqwest::Client;
use scraper::{Html, Selector};
use tokio::sync::Semaphore;

use crate::browser::DriverPool;
use crate::models::inventory::SiteInventory;
use crate::models::page::CrawledPage;
use crate::settings::types::Settings;

use super::circuit_breaker::{CircuitBreaker, extract_domain};
use super::domain_limiter::DomainLimiter;
use super::download::download_asset;
use super::errors::CrawlError;
use super::extract::{capture_css_coverage, discover_asset_urls, probe_interactive_behaviors};
use super::glob;
use super::rate_limiter::{CrawlRateLimiter, RateLimitDecision};
use super::seed::seed_urls;

/// Default rate applied per-domain when no per-site override exists.
/// Not currently exposed as a setting; the crawler's own politeness default.
const DEFAULT_CRAWL_RATE_RPS: f64 = 4.0;

pub struct Crawler<P: DriverPool> {
    driver_pool: Arc<P>,
    http_client: Client,
    circuit_breaker: Arc<CircuitBreaker>,
    domain_limiter: Arc<DomainLimiter>,
    rate_limiter: Arc<CrawlRateLimiter>,
}

impl<P: DriverPool + 'static> Crawler<P> {
    #[must_use]
    pub fn new(driver_pool: Arc<P>) -> Self {
        Self {
            driver_pool,
            http_client: Client::new(),
            circuit_breaker: Arc::new(CircuitBreaker::new(5, 2, Duration::from_secs(60))),
            domain_limiter: Arc::new(DomainLimiter::new(4)),
            rate_limiter: Arc::new(CrawlRateLimiter::new()),
        }
    }

    /// Run a full crawl of `origin` per `settings.build`, writing downloaded
    /// assets under `work_dir/assets/` and returning the resulting
    /// `SiteInventory`.
    pub async fn crawl(
        &self,
        origin: &str,
        settings: &Settings,
        work_dir: &Path,
    ) -> Result<SiteInventory, CrawlError> {
        let build = &settings.build;

        tokio::fs::create_dir_all(work_dir)
            .await
            .map_err(CrawlError::WorkDir)?;

        let seed_driver = self
            .driver_pool
            .acquire()
            .await
            .map_err(|e| CrawlError::DriverUnavailable { url: origin.to_string(), source: e })?;
        let seeds = seed_urls(&seed_driver, &self.http_client, origin, build).await?;
        drop(seed_driver);

        info!("seeded {} URL(s) for {origin}", seeds.len());

        let pages = self.navigate_all(&seeds, build).await;

        let pages = dedup_and_filter(pages, build.max_pages as usize, &build.exclude_globs);

        let mut asset_urls: Vec<String> = Vec::new();
        let mut seen_assets = HashSet::new();
        for page in &pages {
            for url in &page.referenced_asset_urls {
                if seen_assets.insert(url.clone()) {
                    asset_urls.push(url.clone());
                }
            }
        }

        let assets = self.download_all(&asset_urls, work_dir).await;

        let uses_jquery = pages_use_jquery(&pages);
        let jquery_dependent_scripts = asset_urls
            .iter()
            .filter(|u| !u.to_lowercase().contains("jquery"))
            .cloned()
            .collect::<Vec<_>>();

        Ok(SiteInventory {
            pages,
            assets,
            uses_jquery,
            jquery_dependent_scripts: if uses_jquery { jquery_dependent_scripts } else { Vec::new() },
        })
    }

    /// Navigate every seed with concurrency bounded by
    /// `build.maxConcurrentPages` (spec §4.2 step 2). Per-page failures are
    /// logged and the page dropped; the crawl continues.
    async fn navigate_all(&self, seeds: &[String], build: &crate::settings::types::BuildSettings) -> Vec<CrawledPage> {
        let semaphore = Arc::new(Semaphore::new(build.max_concurrent_pages.max(1) as usize));
        let mut tasks = FuturesUnordered::new();

        for (index, url) in seeds.iter().cloned().enumerate() {
            let permit = Arc::clone(&semaphore).acquire_owned().await;
            let Ok(permit) = permit else { continue };

            let driver_pool = Arc::clone(&self.driver_pool);
            let circuit_breaker = Arc::clone(&self.circuit_breaker);
            let domain_limiter = Arc::clone(&self.domain_limiter);
            let rate_limiter = Arc::clone(&self.rate_limiter);
            let page_load_timeout = Duration::from_secs(build.page_load_timeout_secs);
            let network_idle_timeout = Duration::from_secs(build.network_idle_timeout_secs);
            let crawl_wait = Duration::from_millis(build.crawl_wait_ms);

            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                navigate_one(
                    driver_pool,
                    circuit_breaker,
                    domain_limiter,
                    rate_limiter,
                    url,
                    index,
                    page_load_timeout,
                    network_idle_timeout,
                    crawl_wait,
                )
                .await
            }));
        }

        let mut pages = Vec::new();
        while let Some(result) = tasks.next().await {
            match result {
                Ok(Some(page)) => pages.push(page),
                Ok(None) => {}
                Err(e) => warn!("crawl task panicked: {e}"),
            }
        }
        pages.sort_by_key(|p: &CrawledPage| p.url_path.clone());
        pages
    }

    /// Download every referenced asset (spec §4.2 step 4). Per-asset
    /// failures never fail the crawl — `download_asset` already converts
    /// them into pass-through entries.
    async fn download_all(
        &self,
        urls: &[String],
        work_dir: &Path,
    ) -> std::collections::HashMap<String, crate::models::asset::Asset> {
        let client = self.http_client.clone();
        let mut tasks = FuturesUnordered::new();
        for url in urls.iter().cloned() {
            let client = client.clone();
            let work_dir = work_dir.to_path_buf();
            tasks.push(async move { (url.clone(), download_asset(&client, &url, &work_dir).await) });
        }

        let mut assets = std::collections::HashMap::new();
        while let Some((url, asset)) = tasks.next().await {
            assets.insert(url, asset);
        }
        assets
    }
}

#[allow(clippy::too_many_arguments)]
async fn navigate_one<P: DriverPool>(
    driver_pool: Arc<P>,
    circuit_breaker: Arc<CircuitBreaker>,
    domain_limiter: Arc<DomainLimiter>,
    rate_limiter: Arc<CrawlRateLimiter>,
    url: String,
    discovery_index: usize,
    page_load_timeout: Duration,
    network_idle_timeout: Duration,
    crawl_wait: Duration,
) -> Option<CrawledPage> {
    let Ok(domain) = extract_domain(&url) else {
        warn!("skipping unparseable crawl URL: {url}");
        return None;
    };

    if !circuit_breaker.should_attempt(&domain) {
        debug!("circuit breaker open for {domain}, skipping {url}");
        return None;
    }

    if let RateLimitDecision::Deny { retry_after } = rate_limiter.check(&url, DEFAULT_CRAWL_RATE_RPS).await {
        tokio::time::sleep(retry_after).await;
    }

    let _domain_permit = domain_limiter.acquire(domain.clone()).await;

    let driver = match driver_pool.acquire().await {
        Ok(d) => d,
        Err(e) => {
            circuit_breaker.record_failure(&domain, &e.to_string());
            warn!("failed to acquire browser for {url}: {e}");
            return None;
        }
    };

    let result = crawl_one_page(&driver, &url, discovery_index, page_load_timeout, network_idle_timeout, crawl_wait).await;
    match result {
        Ok(page) => {
            circuit_breaker.record_success(&domain);
            Some(page)
        }
        Err(e) => {
            circuit_breaker.record_failure(&domain, &e.to_string());
            warn!("failed to crawl {url}: {e}");
            None
        }
    }
}

async fn crawl_one_page(
    driver: &impl crate::browser::BrowsingDriver,
    url: &str,
    discovery_index: usize,
    page_load_timeout: Duration,
    network_idle_timeout: Duration,
    crawl_wait: Duration,
) -> anyhow::Result<CrawledPage> {
    driver.navigate(url, page_load_timeout).await?;
    driver.settle(network_idle_timeout).await;
    driver.settle(crawl_wait).await;

    let final_url = driver.current_url().await.unwrap_or_else(|_| url.to_string());
    let html = driver.capture_html().await?;
    let screenshot = driver.capture_screenshot().await.unwrap_or_default();

    let title = extract_title(&html);
    let referenced_asset_urls = discover_asset_urls(driver).await.unwrap_or_default();
    let css_coverage = capture_css_coverage(driver).await.unwrap_or_default();
    let (interactive_elements, baseline_behaviors) =
        probe_interactive_behaviors(driver, &final_url).await.unwrap_or_default();

    let content_hash = format!("{:x}", xxhash_rust::xxh3::xxh3_64(html.as_bytes()));
    let url_path = path_of(&final_url, discovery_index);

    Ok(CrawledPage {
        url_path,
        raw_html: html,
        title,
        content_hash,
        referenced_asset_urls,
        interactive_elements,
        baseline_behaviors,
        screenshot,
        css_coverage,
    })
}

fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("title") else { return String::new() };
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn path_of(url: &str, discovery_index: usize) -> String {
    url::Url::parse(url)
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() { "/".to_string() } else { path }
        })
        .unwrap_or_else(|_| format!("/unresolved-{discovery_index}"))
}

fn pages_use_jquery(pages: &[CrawledPage]) -> bool {
    // `detect_jquery_usage` runs per page during navigation but its result
    // isn't carried on `CrawledPage` (which has no such field) — the
    // inventory-level flag is derived from the presence of a jquery.js
    // asset reference across the crawled pages instead.
    pages
        .iter()
        .any(|p| p.referenced_asset_urls.iter().any(|u| u.to_lowercase().contains("jquery")))
}

/// Dedupe by content hash, drop pages matching an exclude glob, and stop
/// once `max_pages` distinct pages have been kept (spec §4.2 step 3).
fn dedup_and_filter(pages: Vec<CrawledPage>, max_pages: usize, exclude_globs: &[String]) -> Vec<CrawledPage> {
    let mut seen_hashes = HashSet::new();
    let mut out = Vec::new();
    for page in pages {
        if !seen_hashes.insert(page.content_hash.clone()) {
            continue;
        }
        if glob::matches_any(&page.url_path, exclude_globs) {
            continue;
        }
        out.push(page);
        if out.len() >= max_pages {
            break;
        }
    }
    out
}
