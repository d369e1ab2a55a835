//! Default settings tree (spec §4.1, §4.3). Values here are the "standard"
//! quality tier from §4.3.1 and the safe-preset toggles from §4.4; anything
//! an operator doesn't override resolves to these.

use super::types::*;

impl Default for CssSettings {
    fn default() -> Self {
        Self {
            purge: true,
            purge_aggressiveness: PurgeAggressiveness::Safe,
            minify_preset: MinifyPreset::Safe,
            critical: true,
            font_display: FontDisplay::Swap,
            combine_stylesheets: false,
        }
    }
}

impl Default for JsSettings {
    fn default() -> Self {
        Self {
            minify: true,
            terser_passes: 2,
            drop_console: false,
            drop_debugger: true,
            custom_remove_patterns: Vec::new(),
            default_loading_strategy: LoadingStrategy::Defer,
            remove_jquery: false,
            move_to_body_end: true,
        }
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            // "standard" quality tier, spec §4.3.1.
            quality_jpeg: 75,
            quality_webp: 75,
            quality_avif: 45,
            max_width: 2560,
            breakpoints: vec![320, 640, 960, 1280, 1920],
            effort: 4,
            strip_metadata: true,
            convert_to_webp: true,
            convert_to_avif: true,
            keep_original: false,
            optimize_svg: true,
            lazy_load: true,
            lcp_mode: LcpMode::Auto,
            lcp_selector: None,
        }
    }
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            self_host_google_fonts: true,
            preload_top_n: 3,
        }
    }
}

impl Default for HtmlMinifySettings {
    fn default() -> Self {
        Self {
            remove_attribute_quotes: false,
            remove_optional_tags: false,
            remove_empty_elements: false,
            collapse_whitespace: true,
        }
    }
}

impl Default for BloatRemovalSettings {
    fn default() -> Self {
        Self {
            remove_generator_meta: true,
            remove_rsd: true,
            remove_wlwmanifest: true,
            remove_shortlink: true,
            remove_emoji_prefetch: true,
            remove_pingback: true,
        }
    }
}

impl Default for FacadeSettings {
    fn default() -> Self {
        Self {
            video_facades_enabled: true,
            poster_quality: PosterQuality::ThumbnailHigh,
            privacy_enhanced_hosts: true,
            google_maps_facade: true,
        }
    }
}

impl Default for HtmlSettings {
    fn default() -> Self {
        Self {
            bloat: BloatRemovalSettings::default(),
            facades: FacadeSettings::default(),
            move_head_scripts_to_body_end: false,
            defer_script_exceptions: Vec::new(),
            critical_css: true,
            svg_sprite_dedup: true,
            resource_hints: true,
            cls_fixes: true,
            minify: HtmlMinifySettings::default(),
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            max_concurrent_pages: 10,
            page_selection: PageSelection::Sitemap,
            scope: BuildScope::All,
            custom_urls: Vec::new(),
            crawl_wait_ms: 2_000,
            pipeline_timeout_secs: 30 * 60,
            max_pages: 200,
            page_load_timeout_secs: 30,
            network_idle_timeout_secs: 10,
            exclude_globs: Vec::new(),
        }
    }
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            pagespeed_enabled: false,
            hard_pass_pagespeed_threshold: 85.0,
            soft_pass_pagespeed_threshold: 75.0,
            soft_pass_avg_performance_threshold: 80.0,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            ssl_readiness_poll_secs: 120,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            css: CssSettings::default(),
            js: JsSettings::default(),
            images: ImageSettings::default(),
            fonts: FontSettings::default(),
            html: HtmlSettings::default(),
            build: BuildSettings::default(),
            verify: VerifySettings::default(),
            agent: AgentSettings::default(),
        }
    }
}

impl Settings {
    /// Serialize the default tree to the untyped form `merge`/`diff` operate
    /// over (spec §4.1 operations are defined on `Value`, not on `Settings`).
    #[must_use]
    pub fn default_value() -> serde_json::Value {
        serde_json::to_value(Self::default()).expect("Settings::default always serializes")
    }
}
