//! Build-level statistics (spec §4.5): before/after byte counts per asset
//! category, facade/script counters, and per-page sizes for the final
//! `Build` record and the HTTP summary endpoint.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CategoryStats {
    pub original_bytes: u64,
    pub optimized_bytes: u64,
}

impl CategoryStats {
    fn add(&mut self, original: u64, optimized: u64) {
        self.original_bytes += original;
        self.optimized_bytes += optimized;
    }

    #[must_use]
    pub fn savings_ratio(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        1.0 - (self.optimized_bytes as f64 / self.original_bytes as f64)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageSize {
    pub original_bytes: u64,
    pub optimized_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStats {
    pub css: CategoryStats,
    pub js: CategoryStats,
    pub images: CategoryStats,
    pub fonts: CategoryStats,
    pub html: CategoryStats,
    pub scripts_removed: usize,
    pub facades_applied: usize,
    /// Keyed by `CrawledPage::url_path`.
    pub pages: HashMap<String, PageSize>,
}

impl PipelineStats {
    pub(super) fn record_css(&mut self, original: u64, optimized: u64) {
        self.css.add(original, optimized);
    }

    pub(super) fn record_js(&mut self, original: u64, optimized: u64) {
        self.js.add(original, optimized);
    }

    pub(super) fn record_images(&mut self, original: u64, optimized: u64) {
        self.images.add(original, optimized);
    }

    pub(super) fn record_fonts(&mut self, original: u64, optimized: u64) {
        self.fonts.add(original, optimized);
    }

    pub(super) fn record_page(&mut self, url_path: &str, original: u64, optimized: u64) {
        self.html.add(original, optimized);
        self.pages.insert(url_path.to_string(), PageSize { original_bytes: original, optimized_bytes: optimized });
    }

    #[must_use]
    pub fn total_original_bytes(&self) -> u64 {
        self.css.original_bytes + self.js.original_bytes + self.images.original_bytes
            + self.fonts.original_bytes + self.html.original_bytes
    }

    #[must_use]
    pub fn total_optimized_bytes(&self) -> u64 {
        self.css.optimized_bytes + self.js.optimized_bytes + self.images.optimized_bytes
            + self.fonts.optimized_bytes + self.html.optimized_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_ratio_is_zero_with_no_bytes() {
        assert_eq!(CategoryStats::default().savings_ratio(), 0.0);
    }

    #[test]
    fn savings_ratio_reflects_shrinkage() {
        let stats = CategoryStats { original_bytes: 100, optimized_bytes: 60 };
        assert!((stats.savings_ratio() - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn totals_sum_every_category() {
        let mut stats = PipelineStats::default();
        stats.record_css(100, 50);
        stats.record_js(200, 100);
        stats.record_page("/", 1000, 800);
        assert_eq!(stats.total_original_bytes(), 1300);
        assert_eq!(stats.total_optimized_bytes(), 950);
    }
}
