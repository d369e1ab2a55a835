//! Steps c, i, j: third-party script classification, head→body-end
//! relocation, and automatic `defer`.

use lol_html::{HtmlRewriter, Settings, element};
use regex::Regex;

/// How a recognized third-party script is handled. There's no dedicated
/// user-facing setting for this catalog (spec leaves it as engine
/// behavior, see DESIGN.md open-question resolution) — every fingerprint
/// below carries its own fixed default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThirdPartyAction {
    Remove,
    Defer,
    Keep,
}

struct Vendor {
    fingerprint: &'static str,
    action: ThirdPartyAction,
}

const VENDORS: &[Vendor] = &[
    Vendor { fingerprint: r"google-analytics\.com|googletagmanager\.com/gtag", action: ThirdPartyAction::Defer },
    Vendor { fingerprint: r"googletagmanager\.com/gtm\.js", action: ThirdPartyAction::Remove },
    Vendor { fingerprint: r"connect\.facebook\.net", action: ThirdPartyAction::Defer },
    Vendor { fingerprint: r"hotjar\.com|clarity\.ms|fullstory\.com|mouseflow\.com", action: ThirdPartyAction::Remove },
    Vendor { fingerprint: r"doubleclick\.net|adservice\.google", action: ThirdPartyAction::Remove },
];

fn classify(src: &str) -> Option<ThirdPartyAction> {
    VENDORS
        .iter()
        .find(|v| Regex::new(v.fingerprint).map(|re| re.is_match(src)).unwrap_or(false))
        .map(|v| v.action)
}

/// Step c. Returns the rewritten HTML, count removed, and the ids of
/// removed scripts (for a deferred tag-manager placeholder block, per
/// spec "collect IDs into a deferred tag-manager placeholder").
pub fn classify_third_party_scripts(html: &str) -> anyhow::Result<(String, usize, Vec<String>)> {
    let mut output = Vec::with_capacity(html.len());
    let removed_count = std::sync::atomic::AtomicUsize::new(0);
    let removed_ids = std::sync::Mutex::new(Vec::new());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("script[src]", |el| {
                if let Some(src) = el.get_attribute("src") {
                    match classify(&src) {
                        Some(ThirdPartyAction::Remove) => {
                            if let Some(id) = el.get_attribute("id") {
                                removed_ids.lock().unwrap().push(id);
                            }
                            el.remove();
                            removed_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                        Some(ThirdPartyAction::Defer) => {
                            if el.get_attribute("defer").is_none() && el.get_attribute("async").is_none() {
                                el.set_attribute("defer", "")?;
                            }
                        }
                        Some(ThirdPartyAction::Keep) | None => {}
                    }
                }
                Ok(())
            })],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );
    rewriter.write(html.as_bytes()).map_err(|e| anyhow::anyhow!("script classify write failed: {e}"))?;
    rewriter.end().map_err(|e| anyhow::anyhow!("script classify end failed: {e}"))?;

    let count = removed_count.load(std::sync::atomic::Ordering::Relaxed);
    let ids = removed_ids.into_inner().unwrap();
    Ok((String::from_utf8(output)?, count, ids))
}

/// Step i: move `<head>` scripts with `src` to just before `</body>`.
pub fn move_head_scripts_to_body_end(html: &str) -> anyhow::Result<String> {
    static HEAD_SCRIPT_RE: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| {
        Regex::new(r#"<script\b[^>]*\bsrc\s*=\s*["'][^"']+["'][^>]*>\s*</script>"#).unwrap()
    });

    let Some(head_end) = html.find("</head>") else {
        return Ok(html.to_string());
    };
    let Some(body_end) = html.rfind("</body>") else {
        return Ok(html.to_string());
    };
    if body_end < head_end {
        return Ok(html.to_string());
    }

    let head = &html[..head_end];
    let mut moved = Vec::new();
    let head_without_scripts = HEAD_SCRIPT_RE.replace_all(head, |caps: &regex::Captures| {
        moved.push(caps[0].to_string());
        String::new()
    });

    if moved.is_empty() {
        return Ok(html.to_string());
    }

    let mut out = String::with_capacity(html.len());
    out.push_str(&head_without_scripts);
    out.push_str(&html[head_end..body_end]);
    out.push_str(&moved.join("\n"));
    out.push_str(&html[body_end..]);
    Ok(out)
}

/// Step j: apply `defer` to every `<script src>` lacking async/defer,
/// unless its src matches an entry in `exceptions`.
pub fn apply_default_defer(html: &str, exceptions: &[String]) -> anyhow::Result<String> {
    let mut output = Vec::with_capacity(html.len());
    let exceptions = exceptions.to_vec();

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("script[src]", move |el| {
                if el.get_attribute("async").is_some() || el.get_attribute("defer").is_some() {
                    return Ok(());
                }
                if let Some(src) = el.get_attribute("src") {
                    if exceptions.iter().any(|e| src.contains(e.as_str())) {
                        return Ok(());
                    }
                }
                el.set_attribute("defer", "")?;
                Ok(())
            })],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );
    rewriter.write(html.as_bytes()).map_err(|e| anyhow::anyhow!("defer write failed: {e}"))?;
    rewriter.end().map_err(|e| anyhow::anyhow!("defer end failed: {e}"))?;

    Ok(String::from_utf8(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_known_heatmap_vendor() {
        let html = r#"<script id="hj" src="https://static.hotjar.com/c/hotjar-123.js"></script>"#;
        let (out, count, ids) = classify_third_party_scripts(html).unwrap();
        assert_eq!(count, 1);
        assert_eq!(ids, vec!["hj".to_string()]);
        assert!(!out.contains("hotjar"));
    }

    #[test]
    fn defers_analytics_vendor() {
        let html = r#"<script src="https://www.google-analytics.com/analytics.js"></script>"#;
        let (out, count, _) = classify_third_party_scripts(html).unwrap();
        assert_eq!(count, 0);
        assert!(out.contains("defer"));
    }

    #[test]
    fn unknown_vendor_untouched() {
        let html = r#"<script src="/js/app.js"></script>"#;
        let (out, count, _) = classify_third_party_scripts(html).unwrap();
        assert_eq!(count, 0);
        assert!(!out.contains("defer"));
    }

    #[test]
    fn moves_head_script_to_body_end() {
        let html = "<html><head><script src=\"a.js\"></script></head><body><p>x</p></body></html>";
        let out = move_head_scripts_to_body_end(html).unwrap();
        let head_idx = out.find("</head>").unwrap();
        let script_idx = out.find("a.js").unwrap();
        assert!(script_idx > head_idx);
    }

    #[test]
    fn defer_skips_exceptions() {
        let html = r#"<script src="/critical.js"></script>"#;
        let out = apply_default_defer(html, &["critical.js".to_string()]).unwrap();
        assert!(!out.contains("defer"));
    }

    #[test]
    fn defer_applies_to_non_exception() {
        let html = r#"<script src="/app.js"></script>"#;
        let out = apply_default_defer(html, &[]).unwrap();
        assert!(out.contains("defer"));
    }
}
