//! Step a: rewrite `<link href>` / `<script src>` / `@import` / `url(...)`
//! references against the C3 rename maps; drop `<script>` elements for JS
//! assets that were removed outright.
//!
//! Built on `lol_html::{HtmlRewriter, Settings, element, text}`, the same
//! streaming-rewrite API the teacher uses in
//! `link_rewriter::rewrite_links_in_html` for href rewriting.

use lol_html::{HtmlRewriter, Settings, element, text};

use crate::html_rewrite::context::RewriteContext;

/// Apply step a to one page's HTML. Returns the rewritten HTML and the
/// count of references rewritten (for stats).
pub fn rewrite_asset_references(html: &str, ctx: &RewriteContext) -> anyhow::Result<(String, usize)> {
    let mut output = Vec::with_capacity(html.len());
    let count = std::sync::atomic::AtomicUsize::new(0);

    let css_renames = &ctx.css_renames;
    let js_renames = &ctx.js_renames;
    let js_removed = &ctx.js_removed;

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("link[href]", |el| {
                    if el.get_attribute("rel").as_deref() == Some("stylesheet") {
                        if let Some(href) = el.get_attribute("href") {
                            if let Some(rename) = css_renames.get(&href) {
                                el.set_attribute("href", &rename.new_relative_path)?;
                                count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                            }
                        }
                    }
                    Ok(())
                }),
                element!("script[src]", |el| {
                    if let Some(src) = el.get_attribute("src") {
                        if js_removed.contains(&src) {
                            el.remove();
                            count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        } else if let Some(rename) = js_renames.get(&src) {
                            el.set_attribute("src", &rename.new_relative_path)?;
                            count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    }
                    Ok(())
                }),
                text!("style", |t| {
                    let chunk = t.as_str();
                    if chunk.contains("@import") || chunk.contains("url(") {
                        let rewritten = rewrite_css_urls(chunk, css_renames);
                        if rewritten != chunk {
                            t.replace(&rewritten, lol_html::html_content::ContentType::Text);
                            count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter.write(html.as_bytes()).map_err(|e| anyhow::anyhow!("rewrite write failed: {e}"))?;
    rewriter.end().map_err(|e| anyhow::anyhow!("rewrite end failed: {e}"))?;

    let result = String::from_utf8(output)?;
    Ok((result, count.load(std::sync::atomic::Ordering::Relaxed)))
}

fn rewrite_css_urls(
    css: &str,
    renames: &std::collections::HashMap<String, crate::models::AssetRename>,
) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(pos) = rest.find("url(") {
        out.push_str(&rest[..pos + 4]);
        let after = &rest[pos + 4..];
        let Some(close) = after.find(')') else {
            out.push_str(after);
            return out;
        };
        let inner = after[..close].trim().trim_matches(['"', '\'']);
        match renames.get(inner) {
            Some(rename) => out.push_str(&rename.new_relative_path),
            None => out.push_str(inner),
        }
        out.push(')');
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetRename;
    use std::collections::HashMap;

    #[test]
    fn rewrites_css_link_href() {
        let mut ctx = RewriteContext::default();
        ctx.css_renames.insert(
            "style.css".to_string(),
            AssetRename { new_relative_path: "style-abc12345.css".to_string(), new_hash: "abc12345".to_string() },
        );
        let html = r#"<link rel="stylesheet" href="style.css">"#;
        let (out, count) = rewrite_asset_references(html, &ctx).unwrap();
        assert_eq!(count, 1);
        assert!(out.contains("style-abc12345.css"));
    }

    #[test]
    fn drops_script_for_removed_js() {
        let mut ctx = RewriteContext::default();
        ctx.js_removed.insert("analytics.js".to_string());
        let html = r#"<script src="analytics.js"></script><div>x</div>"#;
        let (out, count) = rewrite_asset_references(html, &ctx).unwrap();
        assert_eq!(count, 1);
        assert!(!out.contains("analytics.js"));
        assert!(out.contains("<div>x</div>"));
    }

    #[test]
    fn rewrites_css_url_function() {
        let mut renames = HashMap::new();
        renames.insert(
            "font.woff2".to_string(),
            AssetRename { new_relative_path: "font-deadbeef.woff2".to_string(), new_hash: "deadbeef".to_string() },
        );
        let css = "@font-face{src:url(font.woff2)}";
        let out = rewrite_css_urls(css, &renames);
        assert!(out.contains("font-deadbeef.woff2"));
    }
}
