//! Step m: resource-hint injection in priority order — preload for the LCP
//! image + hero font, preconnect to detected external origins (cap 4,
//! dropping any whose origin never appears in the page's reference set),
//! dns-prefetch for the remainder.

use std::collections::HashSet;

use regex::Regex;
use url::Url;

const MAX_PRECONNECT: usize = 4;

pub fn inject_resource_hints(
    html: &str,
    page_url: &str,
    lcp_image_path: Option<&str>,
    hero_font_path: Option<&str>,
    enabled: bool,
) -> String {
    if !enabled {
        return html.to_string();
    }

    let origins = external_origins(html, page_url);
    let (preconnect, dns_prefetch) = origins.split_at(origins.len().min(MAX_PRECONNECT));

    let mut hints = String::new();
    if let Some(path) = lcp_image_path {
        hints.push_str(&format!(r#"<link rel="preload" href="{path}" as="image">"#));
    }
    if let Some(path) = hero_font_path {
        hints.push_str(&format!(r#"<link rel="preload" href="{path}" as="font" type="font/woff2" crossorigin>"#));
    }
    for origin in preconnect {
        hints.push_str(&format!(r#"<link rel="preconnect" href="{origin}" crossorigin>"#));
    }
    for origin in dns_prefetch {
        hints.push_str(&format!(r#"<link rel="dns-prefetch" href="{origin}">"#));
    }

    if hints.is_empty() {
        return html.to_string();
    }

    match html.find("<head") .and_then(|head_open| html[head_open..].find('>').map(|i| head_open + i + 1)) {
        Some(insert_at) => {
            let mut out = html.to_string();
            out.insert_str(insert_at, &hints);
            out
        }
        None => format!("{hints}{html}"),
    }
}

/// Every distinct external origin referenced anywhere in the page
/// (`href`/`src` attributes), in first-seen order.
fn external_origins(html: &str, page_url: &str) -> Vec<String> {
    static REF_RE: once_cell::sync::Lazy<Regex> =
        once_cell::sync::Lazy::new(|| Regex::new(r#"(?:href|src)\s*=\s*["'](https?://[^"']+)["']"#).unwrap());

    let page_origin = Url::parse(page_url).ok().map(|u| u.origin().ascii_serialization());

    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for cap in REF_RE.captures_iter(html) {
        if let Ok(url) = Url::parse(&cap[1]) {
            let origin = url.origin().ascii_serialization();
            if Some(&origin) == page_origin.as_ref() {
                continue;
            }
            if seen.insert(origin.clone()) {
                ordered.push(origin);
            }
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_preload_for_lcp_and_font() {
        let html = "<html><head><title>x</title></head><body></body></html>";
        let out = inject_resource_hints(html, "https://example.com/", Some("hero.jpg"), Some("font.woff2"), true);
        assert!(out.contains(r#"as="image""#));
        assert!(out.contains(r#"as="font""#));
    }

    #[test]
    fn caps_preconnect_at_four_and_overflow_to_dns_prefetch() {
        let mut html = String::from("<html><head></head><body>");
        for i in 0..6 {
            html.push_str(&format!(r#"<img src="https://cdn{i}.example.com/a.jpg">"#));
        }
        html.push_str("</body></html>");
        let out = inject_resource_hints(&html, "https://example.com/", None, None, true);
        assert_eq!(out.matches("preconnect").count(), MAX_PRECONNECT);
        assert!(out.contains("dns-prefetch"));
    }

    #[test]
    fn same_origin_references_excluded() {
        let html = r#"<html><head></head><body><img src="https://example.com/a.jpg"></body></html>"#;
        let out = inject_resource_hints(html, "https://example.com/", None, None, true);
        assert!(!out.contains("preconnect"));
        assert!(!out.contains("dns-prefetch"));
    }

    #[test]
    fn disabled_is_no_op() {
        let html = "<html><head></head><body></body></html>";
        let out = inject_resource_hints(html, "https://example.com/", Some("hero.jpg"), None, false);
        assert_eq!(out, html);
    }
}
