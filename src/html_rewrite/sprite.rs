//! Step l: SVG sprite dedup. When the same inline
//! `<svg><symbol id="x">…</symbol></svg>` block appears ≥ 2 times, hoist
//! one copy (hidden, placed right after `<body>`) and replace every
//! occurrence with `<svg><use href="#x"></use></svg>`.

use std::collections::HashMap;

use regex::Regex;

pub fn dedup_svg_sprites(html: &str, enabled: bool) -> String {
    if !enabled {
        return html.to_string();
    }

    static SYMBOL_SVG_RE: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| {
        Regex::new(r#"(?s)<svg\b[^>]*>\s*<symbol\s+id="([^"]+)"[^>]*>.*?</symbol>\s*</svg>"#).unwrap()
    });

    let mut counts: HashMap<String, usize> = HashMap::new();
    for cap in SYMBOL_SVG_RE.captures_iter(html) {
        *counts.entry(cap[1].to_string()).or_insert(0) += 1;
    }

    let duplicated: HashMap<&str, usize> = counts
        .iter()
        .filter(|(_, &n)| n >= 2)
        .map(|(k, v)| (k.as_str(), *v))
        .collect();

    if duplicated.is_empty() {
        return html.to_string();
    }

    let mut hoisted = String::new();
    let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();

    let rewritten = SYMBOL_SVG_RE.replace_all(html, |caps: &regex::Captures| {
        let id = &caps[1];
        if !duplicated.contains_key(id) {
            return caps[0].to_string();
        }
        if seen.insert(id.to_string()) {
            hoisted.push_str(&caps[0]);
        }
        format!(r#"<svg><use href="#{id}"></use></svg>"#)
    });

    let mut out = rewritten.into_owned();
    if !hoisted.is_empty() {
        let wrapped = format!(r#"<div style="display:none">{hoisted}</div>"#);
        match out.find("<body").and_then(|body_open| out[body_open..].find('>').map(|i| body_open + i + 1)) {
            Some(insert_at) => out.insert_str(insert_at, &wrapped),
            None => out = format!("{wrapped}{out}"),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_repeated_symbol_svg() {
        let svg = r#"<svg viewBox="0 0 10 10"><symbol id="icon-x"><path d="M0 0"/></symbol></svg>"#;
        let html = format!("<body>{svg}{svg}</body>");
        let out = dedup_svg_sprites(&html, true);
        assert_eq!(out.matches("path d=").count(), 1);
        assert_eq!(out.matches(r#"<use href="#icon-x">"#).count(), 2);
    }

    #[test]
    fn leaves_single_occurrence_untouched() {
        let svg = r#"<svg viewBox="0 0 10 10"><symbol id="icon-y"><path d="M1 1"/></symbol></svg>"#;
        let html = format!("<body>{svg}</body>");
        let out = dedup_svg_sprites(&html, true);
        assert_eq!(out, html);
    }

    #[test]
    fn disabled_is_no_op() {
        let svg = r#"<svg viewBox="0 0 10 10"><symbol id="icon-z"><path d="M2 2"/></symbol></svg>"#;
        let html = format!("<body>{svg}{svg}</body>");
        let out = dedup_svg_sprites(&html, false);
        assert_eq!(out, html);
    }
}
