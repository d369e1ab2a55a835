//! Step n: layout-shift mitigation. Each sub-pass is independently
//! toggleable by the single `cls_fixes` setting (spec leaves them as one
//! combined switch; see DESIGN.md).

use lol_html::{HtmlRewriter, Settings, element};

const AD_SELECTORS: &[&str] = &["[id*=\"google_ads\"]", "[class*=\"ad-container\"]", "[class*=\"adsbygoogle\"]"];
const CONSENT_SELECTORS: &[&str] = &["[class*=\"cookie-consent\"]", "[id*=\"cookie-banner\"]", "[class*=\"gdpr\"]"];
const CONTAINER_HINT_SELECTORS: &[&str] = &["[class*=\"card\"]", "[class*=\"widget\"]", "[class*=\"module\"]"];

pub fn apply_cls_fixes(html: &str, enabled: bool) -> anyhow::Result<String> {
    if !enabled {
        return Ok(html.to_string());
    }

    let mut output = Vec::with_capacity(html.len());
    let mut handlers = Vec::new();

    for selector in AD_SELECTORS {
        handlers.push(element!(*selector, |el| {
            append_style(el, "min-height:250px;")
        }));
    }
    for selector in CONSENT_SELECTORS {
        handlers.push(element!(*selector, |el| {
            append_style(el, "position:fixed;")
        }));
    }
    for selector in CONTAINER_HINT_SELECTORS {
        handlers.push(element!(*selector, |el| {
            append_style(el, "contain:layout style;")
        }));
    }
    handlers.push(element!("iframe[width][height]", |el| {
        let w: f64 = el.get_attribute("width").and_then(|v| v.parse().ok()).unwrap_or(16.0);
        let h: f64 = el.get_attribute("height").and_then(|v| v.parse().ok()).unwrap_or(9.0);
        if w > 0.0 {
            let ratio = (h / w) * 100.0;
            let wrapper_open = format!(
                r#"<div style="position:relative;padding-bottom:{ratio:.4}%;height:0;overflow:hidden">"#
            );
            el.before(&wrapper_open, lol_html::html_content::ContentType::Html);
            el.after("</div>", lol_html::html_content::ContentType::Html);
            el.set_attribute("style", "position:absolute;inset:0;width:100%;height:100%;")?;
        }
        Ok(())
    }));

    let mut rewriter = HtmlRewriter::new(
        Settings { element_content_handlers: handlers, ..Settings::default() },
        |c: &[u8]| output.extend_from_slice(c),
    );
    rewriter.write(html.as_bytes()).map_err(|e| anyhow::anyhow!("cls fix write failed: {e}"))?;
    rewriter.end().map_err(|e| anyhow::anyhow!("cls fix end failed: {e}"))?;

    Ok(String::from_utf8(output)?)
}

fn append_style(el: &mut lol_html::html_content::Element, extra: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let existing = el.get_attribute("style").unwrap_or_default();
    let combined = if existing.is_empty() { extra.to_string() } else { format!("{existing};{extra}") };
    el.set_attribute("style", &combined)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ad_container_gets_min_height() {
        let html = r#"<div class="ad-container"></div>"#;
        let out = apply_cls_fixes(html, true).unwrap();
        assert!(out.contains("min-height:250px"));
    }

    #[test]
    fn cookie_banner_gets_fixed_position() {
        let html = r#"<div class="cookie-consent-bar"></div>"#;
        let out = apply_cls_fixes(html, true).unwrap();
        assert!(out.contains("position:fixed"));
    }

    #[test]
    fn iframe_gets_padding_box_wrapper() {
        let html = r#"<iframe width="560" height="315" src="https://example.com/embed"></iframe>"#;
        let out = apply_cls_fixes(html, true).unwrap();
        assert!(out.contains("padding-bottom"));
    }

    #[test]
    fn disabled_is_no_op() {
        let html = r#"<div class="ad-container"></div>"#;
        let out = apply_cls_fixes(html, false).unwrap();
        assert_eq!(out, html);
    }
}
