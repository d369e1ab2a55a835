//! Step k: split each stylesheet into an inlined above-fold critical block
//! and a deferred async-loaded remainder. Falls back to the unconditional
//! async-link rewrite for every stylesheet when extraction failed for it.

use lol_html::{HtmlRewriter, Settings, element};

use crate::html_rewrite::context::RewriteContext;

pub fn apply_critical_css(html: &str, ctx: &RewriteContext) -> anyhow::Result<String> {
    if !ctx.settings.css.critical {
        return Ok(html.to_string());
    }

    let critical = ctx.critical_css.clone();
    let mut output = Vec::with_capacity(html.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!(r#"link[rel="stylesheet"][href]"#, move |el| {
                let Some(href) = el.get_attribute("href") else { return Ok(()) };

                if let Some(critical_css) = critical.get(&href) {
                    let style_block = format!("<style>{critical_css}</style>");
                    el.before(&style_block, lol_html::html_content::ContentType::Html);
                }

                el.set_attribute("rel", "preload")?;
                el.set_attribute("as", "style")?;
                el.set_attribute("onload", "this.onload=null;this.rel='stylesheet'")?;
                let noscript = format!(r#"<noscript><link rel="stylesheet" href="{href}"></noscript>"#);
                el.after(&noscript, lol_html::html_content::ContentType::Html);

                Ok(())
            })],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );
    rewriter.write(html.as_bytes()).map_err(|e| anyhow::anyhow!("critical css write failed: {e}"))?;
    rewriter.end().map_err(|e| anyhow::anyhow!("critical css end failed: {e}"))?;

    Ok(String::from_utf8(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RewriteContext {
        let mut ctx = RewriteContext::default();
        ctx.settings = crate::settings::Settings::default();
        ctx.settings.css.critical = true;
        ctx
    }

    #[test]
    fn inlines_critical_css_when_available() {
        let mut ctx = ctx();
        ctx.critical_css.insert("style.css".to_string(), "body{color:red}".to_string());
        let html = r#"<link rel="stylesheet" href="style.css">"#;
        let out = apply_critical_css(html, &ctx).unwrap();
        assert!(out.contains("<style>body{color:red}</style>"));
        assert!(out.contains(r#"rel="preload""#));
        assert!(out.contains("<noscript>"));
    }

    #[test]
    fn falls_back_to_async_link_without_extraction() {
        let ctx = ctx();
        let html = r#"<link rel="stylesheet" href="style.css">"#;
        let out = apply_critical_css(html, &ctx).unwrap();
        assert!(!out.contains("<style>"));
        assert!(out.contains(r#"rel="preload""#));
    }

    #[test]
    fn no_op_when_disabled() {
        let mut ctx = ctx();
        ctx.settings.css.critical = false;
        let html = r#"<link rel="stylesheet" href="style.css">"#;
        let out = apply_critical_css(html, &ctx).unwrap();
        assert_eq!(out, html);
    }
}
