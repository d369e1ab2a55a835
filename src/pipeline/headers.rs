//! Step 6: `_headers` manifest — cache durations per asset class plus the
//! configured security-header set (spec §4.5).

use crate::models::{Asset, MimeClass};

const HTML_CACHE: &str = "public, max-age=300";
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";
const UNHASHED_IMAGE_CACHE: &str = "public, max-age=604800";
const FONT_CACHE: &str = "public, max-age=31536000";
const FAVICON_CACHE: &str = "public, max-age=86400";

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "SAMEORIGIN"),
    ("Strict-Transport-Security", "max-age=63072000; includeSubDomains; preload"),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
    ("Permissions-Policy", "geolocation=(), microphone=(), camera=()"),
    ("X-XSS-Protection", "0"),
];

/// One rule in the Netlify/Cloudflare-Pages-style `_headers` file: a path
/// pattern plus the header lines that apply under it.
pub struct HeaderRule {
    pub pattern: String,
    pub headers: Vec<(String, String)>,
}

/// Build the full manifest for one build's output tree.
#[must_use]
pub fn build_headers_manifest(assets: &[Asset]) -> Vec<HeaderRule> {
    let mut rules = Vec::new();

    rules.push(HeaderRule {
        pattern: "/*".to_string(),
        headers: SECURITY_HEADERS.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    });

    rules.push(HeaderRule {
        pattern: "/*.html".to_string(),
        headers: vec![("Cache-Control".to_string(), HTML_CACHE.to_string())],
    });
    rules.push(HeaderRule {
        pattern: "/".to_string(),
        headers: vec![("Cache-Control".to_string(), HTML_CACHE.to_string())],
    });
    rules.push(HeaderRule {
        pattern: "/favicon.ico".to_string(),
        headers: vec![("Cache-Control".to_string(), FAVICON_CACHE.to_string())],
    });

    for asset in assets {
        let path = format!("/{}", asset.local_relative_path.trim_start_matches('/'));
        let cache_control = match asset.mime_class {
            MimeClass::Css | MimeClass::Js if asset.rename.is_some() => IMMUTABLE_CACHE,
            MimeClass::Image if asset.rename.is_some() || !asset.variants.is_empty() => IMMUTABLE_CACHE,
            MimeClass::Image => UNHASHED_IMAGE_CACHE,
            MimeClass::Font => FONT_CACHE,
            _ => continue,
        };
        rules.push(HeaderRule {
            pattern: path,
            headers: vec![("Cache-Control".to_string(), cache_control.to_string())],
        });

        for variant in &asset.variants {
            rules.push(HeaderRule {
                pattern: format!("/{}", variant.relative_path.trim_start_matches('/')),
                headers: vec![("Cache-Control".to_string(), IMMUTABLE_CACHE.to_string())],
            });
        }
    }

    rules
}

/// Render the manifest in the `_headers` file's line-oriented format.
#[must_use]
pub fn render_headers_manifest(rules: &[HeaderRule]) -> String {
    let mut out = String::new();
    for rule in rules {
        out.push_str(&rule.pattern);
        out.push('\n');
        for (key, value) in &rule.headers {
            out.push_str(&format!("  {key}: {value}\n"));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetRename;

    #[test]
    fn hashed_css_gets_immutable_cache() {
        let mut asset = Asset::new("https://x/a.css".to_string(), "a.css".to_string(), 100, "h".to_string());
        asset.rename = Some(AssetRename { new_relative_path: "a-12345678.css".to_string(), new_hash: "12345678".to_string() });
        let rules = build_headers_manifest(&[asset]);
        let rule = rules.iter().find(|r| r.pattern.contains("a.css")).unwrap();
        assert!(rule.headers.iter().any(|(_, v)| v.contains("immutable")));
    }

    #[test]
    fn unhashed_image_gets_seven_day_cache() {
        let asset = Asset::new("https://x/a.png".to_string(), "a.png".to_string(), 100, "h".to_string());
        let rules = build_headers_manifest(&[asset]);
        let rule = rules.iter().find(|r| r.pattern.contains("a.png")).unwrap();
        assert!(rule.headers.iter().any(|(_, v)| v.contains("604800")));
    }

    #[test]
    fn security_headers_apply_globally() {
        let rules = build_headers_manifest(&[]);
        let global = rules.iter().find(|r| r.pattern == "/*").unwrap();
        assert!(global.headers.iter().any(|(k, _)| k == "Strict-Transport-Security"));
    }

    #[test]
    fn render_produces_nonempty_blocks_per_rule() {
        let rules = build_headers_manifest(&[]);
        let rendered = render_headers_manifest(&rules);
        assert!(rendered.contains("/*\n"));
        assert!(rendered.contains("X-Frame-Options"));
    }
}
