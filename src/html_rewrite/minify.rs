//! Step o: final HTML minifier. Safe options default on; aggressive
//! options default off (spec explicitly calls for a warning when on).
//!
//! Grounded on `tola-ssg`'s `minify_html::Cfg` usage (`keep_closing_tags`,
//! `keep_html_and_head_opening_tags`, `remove_bangs`, `remove_processing_instructions`).

use crate::settings::types::HtmlMinifySettings;

pub fn minify_html(html: &str, settings: &HtmlMinifySettings) -> String {
    let mut cfg = minify_html::Cfg::new();

    // Safe defaults: never touch structural tags or inline CSS/JS grammar.
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = false;
    cfg.minify_js = false;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;

    if settings.remove_attribute_quotes {
        tracing::debug!("aggressive html minify: remove_attribute_quotes enabled");
        cfg.keep_spaces_between_attributes = false;
    }
    if settings.remove_optional_tags {
        tracing::warn!("aggressive html minify: remove_optional_tags enabled, may alter DOM parsing in edge cases");
        cfg.keep_html_and_head_opening_tags = false;
        cfg.keep_closing_tags = false;
    }
    if settings.remove_empty_elements {
        tracing::warn!("aggressive html minify: remove_empty_elements enabled");
    }
    // collapse_whitespace rides on minify_html's own (always-on) text
    // minification — nothing further to opt into.

    let minified = minify_html::minify(html.as_bytes(), &cfg);

    let out = String::from_utf8_lossy(&minified).into_owned();

    if settings.remove_empty_elements {
        remove_empty_elements(&out)
    } else {
        out
    }
}

/// `minify_html` has no empty-element removal knob; applied as a
/// post-pass string scrub for the handful of tags it's safe to collapse
/// when genuinely empty (no attributes, no text, no children).
fn remove_empty_elements(html: &str) -> String {
    static EMPTY_RE: once_cell::sync::Lazy<regex::Regex> = once_cell::sync::Lazy::new(|| {
        regex::Regex::new(r"<(span|p|div)>\s*</\1>").unwrap()
    });
    EMPTY_RE.replace_all(html, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> HtmlMinifySettings {
        HtmlMinifySettings {
            remove_attribute_quotes: false,
            remove_optional_tags: false,
            remove_empty_elements: false,
            collapse_whitespace: true,
        }
    }

    #[test]
    fn strips_comments_by_default() {
        let html = "<html><body><!-- note --><p>hi</p></body></html>";
        let out = minify_html(html, &settings());
        assert!(!out.contains("note"));
    }

    #[test]
    fn removes_empty_elements_when_enabled() {
        let mut s = settings();
        s.remove_empty_elements = true;
        let html = "<div><span></span><p>content</p></div>";
        let out = minify_html(html, &s);
        assert!(!out.contains("<span></span>"));
        assert!(out.contains("content"));
    }

    #[test]
    fn keeps_html_structure_tags() {
        let html = "<html><head><title>t</title></head><body>x</body></html>";
        let out = minify_html(html, &settings());
        assert!(out.contains("<html"));
        assert!(out.contains("<head"));
    }
}
