//! The pipeline orchestrator (C5, spec §4.5): `optimize(pages, assets,
//! workDir, settings) -> (optimizedPages, stats)`, six phases run in
//! sequence — css, js, images, html, write, headers — each announced on the
//! event bus so the control plane's SSE stream can show progress.
//!
//! CPU-bound transform calls (CSS/JS minify, image encode) are wrapped in
//! `tokio::task::spawn_blocking`, the same offload `content_saver::compression`
//! uses to keep the async runtime responsive during heavy file work.
//!
//! Rename-map keys (`css_renames`, `js_renames`, `image_variants`, ...) are
//! each asset's `source_url`. This assumes the crawler's captured HTML
//! already carries DOM-resolved (absolute) asset references matching
//! `CrawledPage::referenced_asset_urls` — see DESIGN.md for the reasoning.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use reqwest::Client;

use crate::events::{BuildEvent, EventBus, LogLevel, Phase};
use crate::html_rewrite::{self, AssetDimensions, RewriteContext};
use crate::models::{Asset, CrawledPage, MimeClass, SiteInventory};
use crate::pipeline::headers::build_headers_manifest;
use crate::pipeline::output_writer::{copy_assets, write_headers_manifest, write_pages};
use crate::pipeline::stats::PipelineStats;
use crate::settings::types::{LcpMode, Settings};
use crate::transform::{self, css as css_transform, fonts as font_transform, image as image_transform, js as js_transform};

/// Run the full optimization pipeline over one crawled site. `origin` is
/// the site's canonical scheme+host (e.g. `https://example.com`), used to
/// build each page's absolute URL for the resource-hints step's
/// same-origin check.
pub async fn optimize(
    inventory: &SiteInventory,
    origin: &str,
    work_dir: &Path,
    settings: &Settings,
    http_client: &Client,
    events: &EventBus,
) -> anyhow::Result<(Vec<(String, String)>, PipelineStats)> {
    let mut stats = PipelineStats::default();
    let assets_dir = work_dir.join("assets");
    let page_html: Vec<String> = inventory.pages.iter().map(|p| p.raw_html.clone()).collect();

    let _ = events.publish(BuildEvent::phase(Phase::Css)).await;
    let (css_renames, css_text_cache) =
        run_css_phase(&inventory.assets, &assets_dir, &page_html, settings, &mut stats).await;

    let _ = events.publish(BuildEvent::phase(Phase::Js)).await;
    let (js_renames, js_removed) = run_js_phase(&inventory.assets, &assets_dir, settings, &mut stats).await;

    let _ = events.publish(BuildEvent::phase(Phase::Images)).await;
    let lcp_candidates = derive_lcp_candidates(&inventory.pages, &settings.images);
    let (image_variants, asset_dimensions) =
        run_images_phase(&inventory.assets, &assets_dir, settings, &lcp_candidates, &mut stats).await;

    let _ = events.publish(BuildEvent::phase(Phase::Fonts)).await;
    let font_faces = run_fonts_phase(&inventory.pages, &assets_dir, http_client, settings, &mut stats).await;

    let _ = events.publish(BuildEvent::phase(Phase::Html)).await;
    let mut ctx = RewriteContext {
        css_renames,
        js_renames,
        js_removed,
        image_renames: HashMap::new(),
        asset_dimensions,
        image_variants,
        lcp_candidates,
        font_faces,
        critical_css: HashMap::new(),
        settings: settings.clone(),
    };

    let mut optimized_pages = Vec::with_capacity(inventory.pages.len());
    for page in &inventory.pages {
        ctx.critical_css = critical_css_for_page(page, &ctx.css_renames, &css_text_cache);

        let page_url = format!("{}{}", origin.trim_end_matches('/'), page.url_path);
        let result = html_rewrite::rewrite_page(&page.raw_html, &page_url, &ctx);

        for warning in &result.step_warnings {
            let _ = events
                .publish(BuildEvent::log(Phase::Html, LogLevel::Warn, format!("{}: {warning}", page.url_path)))
                .await;
        }
        stats.scripts_removed += result.scripts_removed;
        stats.facades_applied += result.facades_applied;
        stats.record_page(&page.url_path, page.raw_html.len() as u64, result.html.len() as u64);

        optimized_pages.push((page.url_path.clone(), result.html));
    }

    let _ = events.publish(BuildEvent::phase(Phase::Deploy)).await;
    write_pages(work_dir, &optimized_pages).await?;
    copy_assets(work_dir).await?;
    let rules = build_headers_manifest(&inventory.assets.values().cloned().collect::<Vec<_>>());
    write_headers_manifest(work_dir, &rules).await?;

    Ok((optimized_pages, stats))
}

async fn run_css_phase(
    assets: &HashMap<String, Asset>,
    assets_dir: &Path,
    page_html: &[String],
    settings: &Settings,
    stats: &mut PipelineStats,
) -> (HashMap<String, crate::models::AssetRename>, HashMap<String, String>) {
    let mut renames = HashMap::new();
    let mut text_cache = HashMap::new();

    let css_assets: Vec<(&String, &Asset)> = assets
        .iter()
        .filter(|(_, a)| a.mime_class == MimeClass::Css && !a.is_pass_through())
        .collect();

    if settings.css.combine_stylesheets && css_assets.len() > 1 {
        let paths: Vec<PathBuf> = css_assets.iter().map(|(_, a)| assets_dir.join(&a.local_relative_path)).collect();
        let css_settings = settings.css.clone();
        let page_html_owned = page_html.to_vec();
        let combined = tokio::task::spawn_blocking(move || {
            css_transform::transform_css_combined(&paths, &page_html_owned, &css_settings)
        })
        .await;

        if let Ok(Ok(Some((result, _removed)))) = combined {
            let original_total: u64 = css_assets.iter().map(|(_, a)| a.original_bytes).sum();
            stats.record_css(original_total, result.new_size);
            if let Ok(text) = std::fs::read_to_string(&result.new_path) {
                for (url, _) in &css_assets {
                    text_cache.insert((*url).clone(), text.clone());
                }
            }
            for (url, _) in &css_assets {
                renames.insert((*url).clone(), result.rename.clone());
            }
        }
        return (renames, text_cache);
    }

    for (url, asset) in css_assets {
        let path = assets_dir.join(&asset.local_relative_path);
        let css_settings = settings.css.clone();
        let page_html_owned = page_html.to_vec();
        let path_owned = path.clone();
        let outcome =
            tokio::task::spawn_blocking(move || css_transform::transform_css(&path_owned, &page_html_owned, &css_settings))
                .await;

        if let Ok(Ok(Some(result))) = outcome {
            stats.record_css(asset.original_bytes, result.new_size);
            if let Ok(text) = std::fs::read_to_string(&result.new_path) {
                text_cache.insert(url.clone(), text);
            }
            renames.insert(url.clone(), result.rename);
        }
    }

    (renames, text_cache)
}

async fn run_js_phase(
    assets: &HashMap<String, Asset>,
    assets_dir: &Path,
    settings: &Settings,
    stats: &mut PipelineStats,
) -> (HashMap<String, crate::models::AssetRename>, HashSet<String>) {
    let mut renames = HashMap::new();
    let mut removed = HashSet::new();

    let js_assets: Vec<(&String, &Asset)> = assets
        .iter()
        .filter(|(_, a)| a.mime_class == MimeClass::Js && !a.is_pass_through())
        .collect();

    for (url, asset) in js_assets {
        let path = assets_dir.join(&asset.local_relative_path);
        let js_settings = settings.js.clone();
        let url_owned = url.clone();
        let path_owned = path.clone();
        let outcome =
            tokio::task::spawn_blocking(move || js_transform::transform_js(&path_owned, &url_owned, &js_settings))
                .await;

        match outcome {
            Ok(Ok(js_transform::JsTransformResult::Transformed { new_size, rename, .. })) => {
                stats.record_js(asset.original_bytes, new_size);
                renames.insert(url.clone(), rename);
            }
            Ok(Ok(js_transform::JsTransformResult::Removed)) => {
                stats.record_js(asset.original_bytes, 0);
                removed.insert(url.clone());
            }
            Ok(Ok(js_transform::JsTransformResult::Unchanged)) | Ok(Err(_)) | Err(_) => {}
        }
    }

    (renames, removed)
}

async fn run_images_phase(
    assets: &HashMap<String, Asset>,
    assets_dir: &Path,
    settings: &Settings,
    lcp_candidates: &HashSet<String>,
    stats: &mut PipelineStats,
) -> (HashMap<String, Vec<crate::models::AssetVariant>>, HashMap<String, AssetDimensions>) {
    let mut variants = HashMap::new();
    let mut dimensions = HashMap::new();

    let image_assets: Vec<(&String, &Asset)> = assets
        .iter()
        .filter(|(_, a)| a.mime_class == MimeClass::Image && !a.is_pass_through())
        .collect();

    for (url, asset) in image_assets {
        let path = assets_dir.join(&asset.local_relative_path);
        let image_settings = settings.images.clone();
        let is_lcp = lcp_candidates.contains(url);
        let path_owned = path.clone();
        let result = tokio::task::spawn_blocking(move || {
            image_transform::transform_image(&path_owned, &image_settings, is_lcp)
        })
        .await
        .unwrap_or_default();

        let optimized = result.overwritten_size.unwrap_or(asset.original_bytes);
        stats.record_images(asset.original_bytes, optimized);

        if let Ok((w, h)) = image::image_dimensions(&path) {
            dimensions.insert(url.clone(), AssetDimensions { width: w, height: h });
        }
        if !result.variants.is_empty() {
            variants.insert(url.clone(), result.variants);
        }
    }

    (variants, dimensions)
}

async fn run_fonts_phase(
    pages: &[CrawledPage],
    assets_dir: &Path,
    http_client: &Client,
    settings: &Settings,
    stats: &mut PipelineStats,
) -> Vec<transform::fonts::SelfHostedFace> {
    if !settings.fonts.self_host_google_fonts {
        return Vec::new();
    }

    let css_urls = collect_google_fonts_css_urls(pages);
    if css_urls.is_empty() {
        return Vec::new();
    }

    match font_transform::self_host_google_fonts(&css_urls, assets_dir, http_client, &settings.fonts).await {
        Ok(result) => {
            stats.record_fonts(0, result.rewritten_css.len() as u64);
            result.faces
        }
        Err(err) => {
            tracing::warn!(error = %err, "google fonts self-hosting failed, leaving remote links untouched");
            Vec::new()
        }
    }
}

fn collect_google_fonts_css_urls(pages: &[CrawledPage]) -> Vec<String> {
    let re = match regex::Regex::new(r#"https://fonts\.googleapis\.com/css[^"'\s>]*"#) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for page in pages {
        for m in re.find_iter(&page.raw_html) {
            let url = m.as_str().to_string();
            if seen.insert(url.clone()) {
                out.push(url);
            }
        }
    }
    out
}

/// First-k images referenced on a page are the auto-mode LCP candidates
/// (spec §4.4 step f, k = 3); manual mode matches `lcp_selector` against the
/// captured HTML instead, falling back to auto if nothing matches.
fn derive_lcp_candidates(pages: &[CrawledPage], image_settings: &crate::settings::types::ImageSettings) -> HashSet<String> {
    const AUTO_K: usize = 3;
    let mut out = HashSet::new();

    for page in pages {
        let mut matched = Vec::new();
        if matches!(image_settings.lcp_mode, LcpMode::Manual) {
            if let Some(selector_str) = &image_settings.lcp_selector {
                if let Ok(selector) = scraper::Selector::parse(selector_str) {
                    let doc = scraper::Html::parse_document(&page.raw_html);
                    matched = doc
                        .select(&selector)
                        .filter_map(|el| el.value().attr("src").map(str::to_string))
                        .collect();
                }
            }
        }

        if matched.is_empty() {
            matched = page
                .referenced_asset_urls
                .iter()
                .filter(|url| is_image_url(url))
                .take(AUTO_K)
                .cloned()
                .collect();
        }

        out.extend(matched);
    }

    out
}

fn is_image_url(url: &str) -> bool {
    let ext = Path::new(url).extension().and_then(|e| e.to_str()).unwrap_or("");
    MimeClass::from_extension(ext) == MimeClass::Image
}

/// Build this page's critical-CSS map, keyed by the post-rename href that
/// step k looks up (step a runs before step k in the rewrite pipeline).
fn critical_css_for_page(
    page: &CrawledPage,
    css_renames: &HashMap<String, crate::models::AssetRename>,
    css_text_cache: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for url in &page.referenced_asset_urls {
        let Some(text) = css_text_cache.get(url) else { continue };
        let (critical, _deferred) = css_transform::split_critical(text, &page.css_coverage);
        if critical.is_empty() {
            continue;
        }
        let key = css_renames.get(url).map(|r| r.new_relative_path.clone()).unwrap_or_else(|| url.clone());
        out.insert(key, critical);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetRename;

    fn page(url_path: &str, raw_html: &str, referenced: &[&str]) -> CrawledPage {
        CrawledPage {
            url_path: url_path.to_string(),
            raw_html: raw_html.to_string(),
            title: String::new(),
            content_hash: String::new(),
            referenced_asset_urls: referenced.iter().map(|s| s.to_string()).collect(),
            interactive_elements: Vec::new(),
            baseline_behaviors: Vec::new(),
            screenshot: Vec::new(),
            css_coverage: Vec::new(),
        }
    }

    #[test]
    fn is_image_url_classifies_by_extension() {
        assert!(is_image_url("https://x/hero.jpg"));
        assert!(!is_image_url("https://x/app.js"));
    }

    #[test]
    fn auto_lcp_takes_first_three_images_per_page() {
        let pages = vec![page(
            "/",
            "<html></html>",
            &["a.jpg", "b.jpg", "c.jpg", "d.jpg", "script.js"],
        )];
        let settings = crate::settings::Settings::default().images;
        let candidates = derive_lcp_candidates(&pages, &settings);
        assert!(candidates.contains("a.jpg"));
        assert!(candidates.contains("c.jpg"));
        assert!(!candidates.contains("d.jpg"));
        assert!(!candidates.contains("script.js"));
    }

    #[test]
    fn collect_google_fonts_css_urls_dedupes() {
        let pages = vec![page(
            "/",
            r#"<link href="https://fonts.googleapis.com/css2?family=Roboto">
               <link href="https://fonts.googleapis.com/css2?family=Roboto">"#,
            &[],
        )];
        let urls = collect_google_fonts_css_urls(&pages);
        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn critical_css_for_page_keys_by_post_rename_path() {
        let mut page = page("/", "<html></html>", &["style.css"]);
        page.css_coverage = vec![".hero".to_string()];

        let mut renames = HashMap::new();
        renames.insert(
            "style.css".to_string(),
            AssetRename { new_relative_path: "style-abc12345.css".to_string(), new_hash: "abc12345".to_string() },
        );
        let mut text_cache = HashMap::new();
        text_cache.insert("style.css".to_string(), ".hero{color:red}.footer{color:blue}".to_string());

        let critical = critical_css_for_page(&page, &renames, &text_cache);
        assert!(critical.contains_key("style-abc12345.css"));
        assert!(critical["style-abc12345.css"].contains(".hero"));
    }

    #[test]
    fn critical_css_for_page_skips_uncached_stylesheets() {
        let page = page("/", "<html></html>", &["unknown.css"]);
        let critical = critical_css_for_page(&page, &HashMap::new(), &HashMap::new());
        assert!(critical.is_empty());
    }
}
