//! `SiteInventory` (SPEC_FULL §3 supplement): the crawler's (C2) complete
//! output for one site, consumed by the transform/rewrite/pipeline stages
//! and persisted as the agent's checkpoint baseline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::asset::Asset;
use super::page::CrawledPage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInventory {
    /// Crawl order, preserved so later diffs are stable.
    pub pages: Vec<CrawledPage>,
    /// Keyed by the asset's source URL as seen on the page.
    pub assets: HashMap<String, Asset>,
    /// Whether any crawled page loads jQuery (drives the HTML rewriter's
    /// script-dependency ordering, spec §4.4 step "script repositioning").
    pub uses_jquery: bool,
    /// Script URLs observed to depend on jQuery being present.
    pub jquery_dependent_scripts: Vec<String>,
}

impl SiteInventory {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            pages: Vec::new(),
            assets: HashMap::new(),
            uses_jquery: false,
            jquery_dependent_scripts: Vec::new(),
        }
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn find_page(&self, url_path: &str) -> Option<&CrawledPage> {
        self.pages.iter().find(|p| p.url_path == url_path)
    }
}

impl Default for SiteInventory {
    fn default() -> Self {
        Self::empty()
    }
}
