//! Step h: font optimization — inject preload links for the self-hosted
//! faces C3 produced, and append a `display=<value>` query param to any
//! Google Fonts stylesheet link that wasn't self-hosted.

use lol_html::{HtmlRewriter, Settings, element};

use crate::html_rewrite::context::RewriteContext;
use crate::transform::fonts::preload_hints;

pub fn optimize_fonts(html: &str, ctx: &RewriteContext) -> anyhow::Result<String> {
    let hints = preload_hints(&ctx.font_faces, ctx.settings.fonts.preload_top_n);
    let display_value = font_display_param(ctx.settings.css.font_display);

    let mut output = Vec::with_capacity(html.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("head", |el| {
                    if !hints.is_empty() {
                        el.append(&hints.join(""), lol_html::html_content::ContentType::Html);
                    }
                    Ok(())
                }),
                element!(r#"link[href*="fonts.googleapis.com"]"#, move |el| {
                    if let Some(href) = el.get_attribute("href") {
                        if !href.contains("display=") {
                            let sep = if href.contains('?') { "&" } else { "?" };
                            el.set_attribute("href", &format!("{href}{sep}display={display_value}"))?;
                        }
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );
    rewriter.write(html.as_bytes()).map_err(|e| anyhow::anyhow!("font optimize write failed: {e}"))?;
    rewriter.end().map_err(|e| anyhow::anyhow!("font optimize end failed: {e}"))?;

    Ok(String::from_utf8(output)?)
}

fn font_display_param(display: crate::settings::types::FontDisplay) -> &'static str {
    use crate::settings::types::FontDisplay;
    match display {
        FontDisplay::Auto => "auto",
        FontDisplay::Block => "block",
        FontDisplay::Swap => "swap",
        FontDisplay::Fallback => "fallback",
        FontDisplay::Optional => "optional",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::fonts::SelfHostedFace;

    fn ctx() -> RewriteContext {
        let mut ctx = RewriteContext::default();
        ctx.settings = crate::settings::Settings::default();
        ctx
    }

    #[test]
    fn injects_preload_for_self_hosted_faces() {
        let mut ctx = ctx();
        ctx.font_faces = vec![SelfHostedFace { local_relative_path: "roboto.woff2".to_string(), family: None }];
        ctx.settings.fonts.preload_top_n = 3;
        let html = "<html><head><title>x</title></head><body></body></html>";
        let out = optimize_fonts(html, &ctx).unwrap();
        assert!(out.contains("roboto.woff2"));
        assert!(out.contains(r#"rel="preload""#));
    }

    #[test]
    fn appends_display_param_to_remote_google_fonts_link() {
        let ctx = ctx();
        let html = r#"<link href="https://fonts.googleapis.com/css2?family=Roboto">"#;
        let out = optimize_fonts(html, &ctx).unwrap();
        assert!(out.contains("display=swap"));
    }

    #[test]
    fn does_not_duplicate_existing_display_param() {
        let ctx = ctx();
        let html = r#"<link href="https://fonts.googleapis.com/css2?family=Roboto&display=block">"#;
        let out = optimize_fonts(html, &ctx).unwrap();
        assert_eq!(out.matches("display=").count(), 1);
    }
}
