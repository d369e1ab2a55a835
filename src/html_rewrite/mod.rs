//! HTML rewriter (spec §4.4): the 15-step per-page pipeline, steps a–o,
//! run in order with each step isolated — a failing step logs a warning
//! and is skipped, it never aborts the page.

pub mod bloat;
pub mod cls;
pub mod context;
pub mod critical_css;
pub mod facade;
pub mod fonts;
pub mod hints;
pub mod images;
pub mod links;
pub mod minify;
pub mod scripts;
pub mod sprite;

pub use context::{AssetDimensions, RewriteContext, RewrittenPage};

/// Run all 15 steps over one page's HTML.
pub fn rewrite_page(html: &str, page_url: &str, ctx: &RewriteContext) -> RewrittenPage {
    let mut page = RewrittenPage { html: html.to_string(), ..Default::default() };

    // a: asset reference rewrite.
    match links::rewrite_asset_references(&page.html, ctx) {
        Ok((out, _count)) => page.html = out,
        Err(e) => page.step_warnings.push(format!("step a (asset references) failed: {e}")),
    }

    // b: CMS bloat removal.
    match bloat::remove_bloat(&page.html, &ctx.settings.html.bloat) {
        Ok(out) => page.html = out,
        Err(e) => page.step_warnings.push(format!("step b (bloat removal) failed: {e}")),
    }

    // c: third-party script classification.
    match scripts::classify_third_party_scripts(&page.html) {
        Ok((out, removed, _ids)) => {
            page.html = out;
            page.scripts_removed += removed;
        }
        Err(e) => page.step_warnings.push(format!("step c (third-party scripts) failed: {e}")),
    }

    // d: video/iframe facades.
    match facade::apply_video_facades(&page.html, &ctx.settings.html.facades) {
        Ok((out, applied)) => {
            page.html = out;
            page.facades_applied += applied;
        }
        Err(e) => page.step_warnings.push(format!("step d (video facades) failed: {e}")),
    }

    // e: widget facades (Google Maps).
    match facade::apply_maps_facade(&page.html, &ctx.settings.html.facades) {
        Ok((out, applied)) => {
            page.html = out;
            page.facades_applied += applied;
        }
        Err(e) => page.step_warnings.push(format!("step e (maps facade) failed: {e}")),
    }

    // f/g: image tag rewrite + dimension injection.
    match images::rewrite_images(&page.html, ctx) {
        Ok(out) => page.html = out,
        Err(e) => page.step_warnings.push(format!("step f/g (image rewrite) failed: {e}")),
    }

    // h: font optimization.
    match fonts::optimize_fonts(&page.html, ctx) {
        Ok(out) => page.html = out,
        Err(e) => page.step_warnings.push(format!("step h (font optimization) failed: {e}")),
    }

    // i: move head scripts to body end.
    if ctx.settings.js.move_to_body_end {
        match scripts::move_head_scripts_to_body_end(&page.html) {
            Ok(out) => page.html = out,
            Err(e) => page.step_warnings.push(format!("step i (script relocation) failed: {e}")),
        }
    }

    // j: default defer.
    match scripts::apply_default_defer(&page.html, &ctx.settings.html.defer_script_exceptions) {
        Ok(out) => page.html = out,
        Err(e) => page.step_warnings.push(format!("step j (default defer) failed: {e}")),
    }

    // k: critical CSS split.
    match critical_css::apply_critical_css(&page.html, ctx) {
        Ok(out) => page.html = out,
        Err(e) => page.step_warnings.push(format!("step k (critical css) failed: {e}")),
    }

    // l: SVG sprite dedup.
    page.html = sprite::dedup_svg_sprites(&page.html, ctx.settings.html.svg_sprite_dedup);

    // m: resource hints.
    let lcp_image = ctx.lcp_candidates.iter().next().map(|s| s.as_str());
    let hero_font = ctx.font_faces.first().map(|f| f.local_relative_path.as_str());
    page.html = hints::inject_resource_hints(
        &page.html,
        page_url,
        lcp_image,
        hero_font,
        ctx.settings.html.resource_hints,
    );

    // n: CLS pass.
    match cls::apply_cls_fixes(&page.html, ctx.settings.html.cls_fixes) {
        Ok(out) => page.html = out,
        Err(e) => page.step_warnings.push(format!("step n (cls fixes) failed: {e}")),
    }

    // o: final minify.
    page.html = minify::minify_html(&page.html, &ctx.settings.html.minify);

    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_runs_end_to_end_without_panicking() {
        let ctx = RewriteContext { settings: crate::settings::Settings::default(), ..Default::default() };
        let html = r#"<html><head><title>Test</title></head><body><img src="a.jpg"><script src="x.js"></script></body></html>"#;
        let result = rewrite_page(html, "https://example.com/", &ctx);
        assert!(result.html.contains("Test"));
    }

    #[test]
    fn drops_removed_js_and_defers_rest() {
        let mut ctx = RewriteContext { settings: crate::settings::Settings::default(), ..Default::default() };
        ctx.js_removed.insert("dead.js".to_string());
        let html = r#"<script src="dead.js"></script><script src="app.js"></script>"#;
        let result = rewrite_page(html, "https://example.com/", &ctx);
        assert!(!result.html.contains("dead.js"));
        assert!(result.html.contains("app.js"));
    }
}
