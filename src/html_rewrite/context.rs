//! Shared state threaded through the 15-step pipeline (spec §4.4): rename
//! maps from C3, decoded asset dimensions for CLS injection, and the
//! per-page LCP candidate set.

use std::collections::HashMap;

use crate::models::AssetRename;
use crate::settings::types::Settings;

/// Decoded width/height of an on-disk raster asset, looked up by its
/// (possibly already-renamed) relative path — used by step g to backfill
/// missing `width`/`height` attributes.
#[derive(Debug, Clone, Copy)]
pub struct AssetDimensions {
    pub width: u32,
    pub height: u32,
}

/// Everything one page's rewrite pass needs that isn't carried on the page
/// itself.
#[derive(Debug, Clone, Default)]
pub struct RewriteContext {
    /// Original asset URL/relative-path → rename, for CSS assets.
    pub css_renames: HashMap<String, AssetRename>,
    /// Original asset URL/relative-path → rename, for JS assets. A missing
    /// entry here for a path that's in `js_removed` means "dropped", not
    /// "untouched".
    pub js_renames: HashMap<String, AssetRename>,
    /// Relative paths of JS assets removed outright by C3 (step a drops
    /// the `<script src>` referencing them).
    pub js_removed: std::collections::HashSet<String>,
    /// Original asset URL/relative-path → rename, for image assets (the
    /// in-place recompressed file keeps its path; this only has entries
    /// when the image's primary rename changed, e.g. via content hashing
    /// if that's ever applied to images).
    pub image_renames: HashMap<String, AssetRename>,
    /// Decoded dimensions, keyed by relative path, for step g / picture
    /// srcset sizing.
    pub asset_dimensions: HashMap<String, AssetDimensions>,
    /// WebP/AVIF sibling variants, keyed by the original image's relative
    /// path, each carrying its own breakpoint width.
    pub image_variants: HashMap<String, Vec<crate::models::AssetVariant>>,
    /// Relative paths of the first-k images selected as LCP candidates
    /// (spec §4.4 step f, k = 3 in auto mode).
    pub lcp_candidates: std::collections::HashSet<String>,
    /// Self-hosted font faces available for preload (step h), produced by
    /// [`crate::transform::fonts`].
    pub font_faces: Vec<crate::transform::fonts::SelfHostedFace>,
    /// Critical-CSS text per stylesheet relative path, captured by C2's
    /// coverage pass and consumed by step k. Absence means "extraction
    /// failed or wasn't attempted" → step k falls back to async-link.
    pub critical_css: HashMap<String, String>,
    pub settings: Settings,
}

impl RewriteContext {
    pub fn is_lcp(&self, relative_path: &str) -> bool {
        self.lcp_candidates.contains(relative_path)
    }
}

/// Per-page outcome of the full pipeline.
#[derive(Debug, Clone, Default)]
pub struct RewrittenPage {
    pub html: String,
    /// One entry per step that failed and was skipped (spec §4.4 "Error
    /// isolation"), in step order.
    pub step_warnings: Vec<String>,
    pub scripts_removed: usize,
    pub facades_applied: usize,
}
