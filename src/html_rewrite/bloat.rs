//! Step b: CMS bloat removal, each toggle independent (spec §4.4).

use lol_html::{HtmlRewriter, Settings, element};

use crate::settings::types::BloatRemovalSettings;

pub fn remove_bloat(html: &str, settings: &BloatRemovalSettings) -> anyhow::Result<String> {
    let mut output = Vec::with_capacity(html.len());

    let mut handlers = Vec::new();
    if settings.remove_generator_meta {
        handlers.push(element!(r#"meta[name="generator"]"#, |el| {
            el.remove();
            Ok(())
        }));
    }
    if settings.remove_rsd {
        handlers.push(element!(r#"link[rel="EditURI"]"#, |el| {
            el.remove();
            Ok(())
        }));
    }
    if settings.remove_wlwmanifest {
        handlers.push(element!(r#"link[rel="wlwmanifest"]"#, |el| {
            el.remove();
            Ok(())
        }));
    }
    if settings.remove_shortlink {
        handlers.push(element!(r#"link[rel="shortlink"]"#, |el| {
            el.remove();
            Ok(())
        }));
    }
    if settings.remove_pingback {
        handlers.push(element!(r#"link[rel="pingback"]"#, |el| {
            el.remove();
            Ok(())
        }));
    }
    if settings.remove_emoji_prefetch {
        handlers.push(element!(r#"link[rel="dns-prefetch"][href*="s.w.org"]"#, |el| {
            el.remove();
            Ok(())
        }));
        handlers.push(element!(r#"script[id="wp-emoji-settings-js"]"#, |el| {
            el.remove();
            Ok(())
        }));
    }

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: handlers,
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );
    rewriter.write(html.as_bytes()).map_err(|e| anyhow::anyhow!("bloat removal write failed: {e}"))?;
    rewriter.end().map_err(|e| anyhow::anyhow!("bloat removal end failed: {e}"))?;

    Ok(String::from_utf8(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_on() -> BloatRemovalSettings {
        BloatRemovalSettings {
            remove_generator_meta: true,
            remove_rsd: true,
            remove_wlwmanifest: true,
            remove_shortlink: true,
            remove_emoji_prefetch: true,
            remove_pingback: true,
        }
    }

    #[test]
    fn removes_generator_meta_when_enabled() {
        let html = r#"<head><meta name="generator" content="WordPress 6.4"></head>"#;
        let out = remove_bloat(html, &all_on()).unwrap();
        assert!(!out.contains("generator"));
    }

    #[test]
    fn keeps_generator_meta_when_disabled() {
        let mut s = all_on();
        s.remove_generator_meta = false;
        let html = r#"<head><meta name="generator" content="WordPress 6.4"></head>"#;
        let out = remove_bloat(html, &s).unwrap();
        assert!(out.contains("generator"));
    }

    #[test]
    fn removes_shortlink_and_rsd() {
        let html = r#"<link rel="shortlink" href="https://x.test/?p=1"><link rel="EditURI" href="xmlrpc.php">"#;
        let out = remove_bloat(html, &all_on()).unwrap();
        assert!(!out.contains("shortlink"));
        assert!(!out.contains("EditURI"));
    }
}
