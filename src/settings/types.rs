//! Typed leaves of the settings tree (spec §4.1). These mirror the schema
//! one-for-one; `schema::validate` is the only place that should construct
//! them from an untyped `serde_json::Value`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeAggressiveness {
    Safe,
    Aggressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinifyPreset {
    Lite,
    Safe,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontDisplay {
    Auto,
    Block,
    Swap,
    Fallback,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingStrategy {
    Defer,
    Async,
    Blocking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LcpMode {
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosterQuality {
    ThumbnailLow,
    ThumbnailHigh,
    Maxres,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSelection {
    Sitemap,
    UrlList,
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildScope {
    All,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CssSettings {
    pub purge: bool,
    pub purge_aggressiveness: PurgeAggressiveness,
    pub minify_preset: MinifyPreset,
    pub critical: bool,
    pub font_display: FontDisplay,
    pub combine_stylesheets: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsSettings {
    pub minify: bool,
    pub terser_passes: u8,
    pub drop_console: bool,
    pub drop_debugger: bool,
    pub custom_remove_patterns: Vec<String>,
    pub default_loading_strategy: LoadingStrategy,
    pub remove_jquery: bool,
    pub move_to_body_end: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSettings {
    pub quality_jpeg: u8,
    pub quality_webp: u8,
    pub quality_avif: u8,
    pub max_width: u32,
    pub breakpoints: Vec<u32>,
    pub effort: u8,
    pub strip_metadata: bool,
    pub convert_to_webp: bool,
    pub convert_to_avif: bool,
    pub keep_original: bool,
    pub optimize_svg: bool,
    pub lazy_load: bool,
    pub lcp_mode: LcpMode,
    pub lcp_selector: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSettings {
    pub self_host_google_fonts: bool,
    pub preload_top_n: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlMinifySettings {
    pub remove_attribute_quotes: bool,
    pub remove_optional_tags: bool,
    pub remove_empty_elements: bool,
    pub collapse_whitespace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloatRemovalSettings {
    pub remove_generator_meta: bool,
    pub remove_rsd: bool,
    pub remove_wlwmanifest: bool,
    pub remove_shortlink: bool,
    pub remove_emoji_prefetch: bool,
    pub remove_pingback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacadeSettings {
    pub video_facades_enabled: bool,
    pub poster_quality: PosterQuality,
    pub privacy_enhanced_hosts: bool,
    pub google_maps_facade: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlSettings {
    pub bloat: BloatRemovalSettings,
    pub facades: FacadeSettings,
    pub move_head_scripts_to_body_end: bool,
    pub defer_script_exceptions: Vec<String>,
    pub critical_css: bool,
    pub svg_sprite_dedup: bool,
    pub resource_hints: bool,
    pub cls_fixes: bool,
    pub minify: HtmlMinifySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSettings {
    pub max_concurrent_pages: u32,
    pub page_selection: PageSelection,
    pub scope: BuildScope,
    pub custom_urls: Vec<String>,
    pub crawl_wait_ms: u64,
    pub pipeline_timeout_secs: u64,
    /// Crawl stops once this many distinct (post-dedup) pages are collected.
    pub max_pages: u32,
    pub page_load_timeout_secs: u64,
    pub network_idle_timeout_secs: u64,
    /// Glob patterns matched against the page's URL path; matching pages are
    /// dropped after crawl but before the dedup/stop-at-N count.
    pub exclude_globs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySettings {
    pub pagespeed_enabled: bool,
    pub hard_pass_pagespeed_threshold: f64,
    pub soft_pass_pagespeed_threshold: f64,
    pub soft_pass_avg_performance_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSettings {
    pub max_iterations: u32,
    pub ssl_readiness_poll_secs: u64,
}

/// The full, typed settings tree (spec §3 / §4.1). Every leaf here has a
/// schema entry; `schema::validate` rejects any `Value` whose leaves don't
/// fit this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub css: CssSettings,
    pub js: JsSettings,
    pub images: ImageSettings,
    pub fonts: FontSettings,
    pub html: HtmlSettings,
    pub build: BuildSettings,
    pub verify: VerifySettings,
    pub agent: AgentSettings,
}
