//! Headless-browser capability interface used by the crawler (C2).
//!
//! The crawler algorithm in spec §4.2 is written against "drive the headless
//! browser: navigate, wait for load, capture HTML...". `BrowsingDriver` is
//! that boundary, concretely implemented over `chromiumoxide`. Treating it
//! as a trait (rather than calling `chromiumoxide` directly from the
//! crawler) keeps the orchestrator testable without a real browser.

pub mod chromium_driver;
pub mod pool;
pub mod profile;
pub mod setup;

pub use chromium_driver::{ChromiumDriver, ChromiumDriverPool};
pub use pool::{BrowserPool, BrowserPoolConfig, PooledBrowserGuard};
pub use profile::{
    BrowserProfile, cleanup_stale_lock, cleanup_stale_profiles, create_unique_profile,
    create_unique_profile_with_prefix, is_singleton_lock_stale,
};
pub use setup::{download_managed_browser, find_browser_executable, launch_browser};

use std::time::Duration;

use anyhow::Result;

/// One crawled page as seen by the browser layer, before it's promoted to
/// a `models::CrawledPage` by the crawler's DOM-query + probe pass.
pub struct NavigatedPage {
    pub final_url: String,
    pub html: String,
    pub screenshot_png: Vec<u8>,
}

/// The capability the crawler (C2) needs from a browser: navigate, wait,
/// capture. Asset discovery, coverage, and interactive probing are layered
/// on top by the crawler itself via `evaluate_json`.
///
/// The crawler is generic over this trait (rather than boxing it as a trait
/// object) so a test harness can swap in a fake driver without paying for
/// dynamic dispatch in the production path.
pub trait BrowsingDriver: Send + Sync {
    fn navigate(&self, url: &str, load_timeout: Duration) -> impl Future<Output = Result<()>> + Send;

    /// Wait `wait_for` for JS-rendered content after load (spec §4.2 step 2:
    /// "wait `crawlWaitMs` for JS-rendered content").
    fn settle(&self, wait_for: Duration) -> impl Future<Output = ()> + Send;

    fn capture_html(&self) -> impl Future<Output = Result<String>> + Send;

    fn capture_screenshot(&self) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Run an arbitrary script in the page context and return its JSON
    /// result, used by the crawler for asset discovery, coverage capture,
    /// and the interactive-probe catalog.
    fn evaluate_json(&self, script: &str) -> impl Future<Output = Result<serde_json::Value>> + Send;

    fn current_url(&self) -> impl Future<Output = Result<String>> + Send;
}

/// Hands the crawler a fresh `BrowsingDriver` per navigation target, backed
/// by whatever leasing scheme the implementation uses (a `BrowserPool` slot,
/// a single shared browser, a fake for tests).
pub trait DriverPool: Send + Sync {
    type Driver: BrowsingDriver;

    fn acquire(&self) -> impl Future<Output = Result<Self::Driver>> + Send;
}
