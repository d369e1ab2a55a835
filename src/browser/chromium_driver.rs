//! `chromiumoxide`-backed implementation of `BrowsingDriver`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::Page;

use super::pool::{BrowserPool, PooledBrowserGuard};
use super::{BrowsingDriver, DriverPool};

pub struct ChromiumDriver {
    page: Page,
    /// Kept only to hold the leased browser open for the page's lifetime;
    /// dropping it returns the browser to the pool.
    _guard: Option<PooledBrowserGuard>,
}

impl ChromiumDriver {
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self { page, _guard: None }
    }

    #[must_use]
    fn with_guard(page: Page, guard: PooledBrowserGuard) -> Self {
        Self { page, _guard: Some(guard) }
    }
}

/// Production `DriverPool`: leases a browser from `BrowserPool`, opens a
/// fresh tab on it, and ties the tab's lifetime to the lease.
pub struct ChromiumDriverPool {
    browser_pool: Arc<BrowserPool>,
}

impl ChromiumDriverPool {
    #[must_use]
    pub fn new(browser_pool: Arc<BrowserPool>) -> Self {
        Self { browser_pool }
    }
}

impl DriverPool for ChromiumDriverPool {
    type Driver = ChromiumDriver;

    async fn acquire(&self) -> Result<ChromiumDriver> {
        let guard = self
            .browser_pool
            .acquire()
            .await
            .context("failed to acquire browser from pool")?;
        let page = guard
            .browser()
            .new_page("about:blank")
            .await
            .context("failed to open new page")?;
        Ok(ChromiumDriver::with_guard(page, guard))
    }
}

impl BrowsingDriver for ChromiumDriver {
    async fn navigate(&self, url: &str, load_timeout: Duration) -> Result<()> {
        tokio::time::timeout(load_timeout, async {
            self.page.goto(url).await?.wait_for_navigation().await
        })
        .await
        .context("page navigation timed out")?
        .map(|_| ())
        .context("page navigation failed")
    }

    async fn settle(&self, wait_for: Duration) {
        tokio::time::sleep(wait_for).await;
    }

    async fn capture_html(&self) -> Result<String> {
        self.page.content().await.context("failed to capture HTML")
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>> {
        use chromiumoxide::page::ScreenshotParams;
        self.page
            .screenshot(ScreenshotParams::builder().full_page(false).build())
            .await
            .context("failed to capture screenshot")
    }

    async fn evaluate_json(&self, script: &str) -> Result<serde_json::Value> {
        let value: serde_json::Value = self
            .page
            .evaluate(script)
            .await
            .context("script evaluation failed")?
            .into_value()
            .context("failed to decode evaluate() result as JSON")?;
        Ok(value)
    }

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .context("failed to read current URL")?
            .ok_or_else(|| anyhow::anyhow!("page has no URL"))
    }
}
