//! Steps f/g: wrap raster `<img>` in `<picture>` with AVIF/WebP `<source>`s
//! and a computed `srcset`, inject missing `width`/`height`, and mark LCP
//! candidates vs. lazy-loaded images.

use lol_html::{HtmlRewriter, Settings, element};

use crate::html_rewrite::context::RewriteContext;

pub fn rewrite_images(html: &str, ctx: &RewriteContext) -> anyhow::Result<String> {
    let mut output = Vec::with_capacity(html.len());
    let lazy_load = ctx.settings.images.lazy_load;
    let variants = ctx.image_variants.clone();
    let dimensions = ctx.asset_dimensions.clone();
    let lcp = ctx.lcp_candidates.clone();

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("img[src]", move |el| {
                let Some(src) = el.get_attribute("src") else { return Ok(()) };
                if !is_raster(&src) {
                    return Ok(());
                }

                let is_lcp = lcp.contains(&src);

                if el.get_attribute("width").is_none() || el.get_attribute("height").is_none() {
                    if let Some(dims) = dimensions.get(&src) {
                        if el.get_attribute("width").is_none() {
                            el.set_attribute("width", &dims.width.to_string())?;
                        }
                        if el.get_attribute("height").is_none() {
                            el.set_attribute("height", &dims.height.to_string())?;
                        }
                    }
                }

                if is_lcp {
                    el.set_attribute("fetchpriority", "high")?;
                    el.set_attribute("loading", "eager")?;
                } else if lazy_load {
                    el.set_attribute("loading", "lazy")?;
                    el.set_attribute("decoding", "async")?;
                }

                if let Some(asset_variants) = variants.get(&src) {
                    if !asset_variants.is_empty() {
                        let sources = build_sources(asset_variants);
                        el.before(&sources, lol_html::html_content::ContentType::Html);
                        el.before("<picture>", lol_html::html_content::ContentType::Html);
                        el.after("</picture>", lol_html::html_content::ContentType::Html);
                    }
                }

                Ok(())
            })],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );
    rewriter.write(html.as_bytes()).map_err(|e| anyhow::anyhow!("image rewrite write failed: {e}"))?;
    rewriter.end().map_err(|e| anyhow::anyhow!("image rewrite end failed: {e}"))?;

    Ok(String::from_utf8(output)?)
}

fn is_raster(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    [".jpg", ".jpeg", ".png", ".webp"].iter().any(|ext| lower.ends_with(ext))
}

fn build_sources(variants: &[crate::models::AssetVariant]) -> String {
    let mut by_format: std::collections::HashMap<&str, Vec<&crate::models::AssetVariant>> =
        std::collections::HashMap::new();
    for v in variants {
        by_format.entry(v.format.as_str()).or_default().push(v);
    }

    let mut out = String::new();
    // AVIF first (best compression), then WebP — browsers pick the first
    // supported `<source>` in document order.
    for format in ["avif", "webp"] {
        let Some(list) = by_format.get(format) else { continue };
        let mime = format!("image/{format}");
        let srcset = list
            .iter()
            .map(|v| match v.width {
                Some(w) => format!("{} {}w", v.relative_path, w),
                None => v.relative_path.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(r#"<source type="{mime}" srcset="{srcset}">"#));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html_rewrite::context::AssetDimensions;
    use crate::models::AssetVariant;

    fn ctx() -> RewriteContext {
        let mut ctx = RewriteContext::default();
        ctx.settings = crate::settings::Settings::default();
        ctx
    }

    #[test]
    fn injects_missing_dimensions() {
        let mut ctx = ctx();
        ctx.asset_dimensions.insert("hero.jpg".to_string(), AssetDimensions { width: 800, height: 600 });
        let html = r#"<img src="hero.jpg">"#;
        let out = rewrite_images(html, &ctx).unwrap();
        assert!(out.contains(r#"width="800""#));
        assert!(out.contains(r#"height="600""#));
    }

    #[test]
    fn lcp_image_gets_eager_loading() {
        let mut ctx = ctx();
        ctx.lcp_candidates.insert("hero.jpg".to_string());
        let html = r#"<img src="hero.jpg">"#;
        let out = rewrite_images(html, &ctx).unwrap();
        assert!(out.contains(r#"fetchpriority="high""#));
        assert!(out.contains(r#"loading="eager""#));
    }

    #[test]
    fn non_lcp_image_gets_lazy_loading_when_enabled() {
        let mut ctx = ctx();
        ctx.settings.images.lazy_load = true;
        let html = r#"<img src="body.jpg">"#;
        let out = rewrite_images(html, &ctx).unwrap();
        assert!(out.contains(r#"loading="lazy""#));
    }

    #[test]
    fn wraps_in_picture_when_variants_exist() {
        let mut ctx = ctx();
        ctx.image_variants.insert(
            "hero.jpg".to_string(),
            vec![
                AssetVariant { relative_path: "hero.avif".to_string(), width: None, format: "avif".to_string() },
                AssetVariant { relative_path: "hero.webp".to_string(), width: None, format: "webp".to_string() },
            ],
        );
        let html = r#"<img src="hero.jpg">"#;
        let out = rewrite_images(html, &ctx).unwrap();
        assert!(out.contains("<picture>"));
        assert!(out.contains("image/avif"));
        assert!(out.contains("image/webp"));
    }

    #[test]
    fn svg_is_untouched() {
        let ctx = ctx();
        let html = r#"<img src="icon.svg">"#;
        let out = rewrite_images(html, &ctx).unwrap();
        assert_eq!(out, html);
    }
}
