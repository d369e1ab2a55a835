//! Steps d/e: video/iframe and widget facades (spec §4.4, SPEC_FULL.md §4.4
//! supplement). Every embed matching an enabled platform's host/path
//! fingerprint is replaced with a click-to-load placeholder: poster image,
//! play overlay, inline activator script. All eleven platforms — including
//! Google Maps and self-hosted `<video>` — are `Facade` records in `CATALOG`;
//! dispatch is a single lookup against it, never a per-platform function.

use lol_html::{HtmlRewriter, Settings, element};
use regex::Regex;

use crate::settings::types::{FacadeSettings, PosterQuality};

/// Which settings leaf gates a `Facade` and which element selector it is
/// dispatched from (SPEC_FULL.md §4.4 supplement: "matched by host/path
/// fingerprint regex, never by dynamic dispatch").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacadeCategory {
    /// Third-party video-platform iframe embeds, gated by
    /// `video_facades_enabled`.
    VideoEmbed,
    /// Google Maps embeds, gated by `google_maps_facade`.
    Maps,
    /// Self-hosted `<video>` tags, gated by `video_facades_enabled`.
    SelfHostedVideo,
}

/// One recognized embeddable platform.
pub struct Facade {
    pub name: &'static str,
    pub category: FacadeCategory,
    /// Matches the iframe/video `src` host (and, where needed, path shape).
    /// `SelfHostedVideo`'s entry uses `.*` — there is no remote host to
    /// fingerprint for a locally-served file.
    pub host_pattern: &'static str,
    pub privacy_enhanced_host: Option<&'static str>,
}

pub static CATALOG: &[Facade] = &[
    Facade { name: "youtube", category: FacadeCategory::VideoEmbed, host_pattern: r"(?:www\.)?youtube(?:-nocookie)?\.com|youtu\.be", privacy_enhanced_host: Some("www.youtube-nocookie.com") },
    Facade { name: "vimeo", category: FacadeCategory::VideoEmbed, host_pattern: r"player\.vimeo\.com|vimeo\.com", privacy_enhanced_host: None },
    Facade { name: "wistia", category: FacadeCategory::VideoEmbed, host_pattern: r"fast\.wistia\.(?:net|com)", privacy_enhanced_host: None },
    Facade { name: "loom", category: FacadeCategory::VideoEmbed, host_pattern: r"www\.loom\.com", privacy_enhanced_host: None },
    Facade { name: "bunny", category: FacadeCategory::VideoEmbed, host_pattern: r"iframe\.mediadelivery\.net", privacy_enhanced_host: None },
    Facade { name: "mux", category: FacadeCategory::VideoEmbed, host_pattern: r"stream\.mux\.com", privacy_enhanced_host: None },
    Facade { name: "dailymotion", category: FacadeCategory::VideoEmbed, host_pattern: r"(?:www\.)?dailymotion\.com", privacy_enhanced_host: None },
    Facade { name: "streamable", category: FacadeCategory::VideoEmbed, host_pattern: r"streamable\.com", privacy_enhanced_host: None },
    Facade { name: "twitch", category: FacadeCategory::VideoEmbed, host_pattern: r"(?:player|clips)\.twitch\.tv", privacy_enhanced_host: None },
    Facade { name: "google-maps", category: FacadeCategory::Maps, host_pattern: r"google\.com/maps|maps\.google\.com", privacy_enhanced_host: None },
    Facade { name: "video", category: FacadeCategory::SelfHostedVideo, host_pattern: r".*", privacy_enhanced_host: None },
];

fn matching_facade(src: &str, category: FacadeCategory) -> Option<&'static Facade> {
    CATALOG.iter().find(|f| {
        f.category == category
            && Regex::new(f.host_pattern)
                .map(|re| re.is_match(src))
                .unwrap_or(false)
    })
}

fn poster_url(facade: &Facade, src: &str, quality: PosterQuality) -> Option<String> {
    match facade.name {
        "youtube" => {
            let video_id = extract_youtube_id(src)?;
            let suffix = match quality {
                PosterQuality::ThumbnailLow => "hqdefault",
                PosterQuality::ThumbnailHigh => "sddefault",
                PosterQuality::Maxres => "maxresdefault",
            };
            Some(format!("https://i.ytimg.com/vi/{video_id}/{suffix}.jpg"))
        }
        _ => None,
    }
}

fn extract_youtube_id(src: &str) -> Option<String> {
    let re = Regex::new(r"(?:embed/|v=|youtu\.be/)([A-Za-z0-9_-]{6,})").ok()?;
    re.captures(src).map(|c| c[1].to_string())
}

fn resolve_src(facade: &Facade, src: &str, settings: &FacadeSettings) -> String {
    if settings.privacy_enhanced_hosts {
        if let Some(host) = facade.privacy_enhanced_host {
            if let Ok(re) = Regex::new(facade.host_pattern) {
                return re.replace(src, host).to_string();
            }
        }
    }
    src.to_string()
}

fn placeholder_markup(facade_name: &str, activate_src: &str, poster: Option<&str>) -> String {
    let poster_style = poster
        .map(|p| format!("background-image:url('{p}');background-size:cover;background-position:center;"))
        .unwrap_or_default();
    format!(
        r#"<div class="facade-embed facade-{facade_name}" style="position:relative;aspect-ratio:16/9;{poster_style}" data-embed-src="{activate_src}" onclick="(function(d){{var f=document.createElement('iframe');f.src=d.getAttribute('data-embed-src');f.setAttribute('allow','autoplay; encrypted-media');f.style.cssText='position:absolute;inset:0;width:100%;height:100%;border:0';d.replaceWith(f);}})(this)"><button class="facade-play" aria-label="Play video" style="position:absolute;inset:0;margin:auto;width:68px;height:48px;">&#9658;</button></div>"#
    )
}

/// Step d: video-platform iframe embeds plus self-hosted `<video>` tags,
/// both gated by `video_facades_enabled` and both dispatched off `CATALOG`.
///
/// `<video src="...">` is handled by the streaming element handler like any
/// iframe entry. `<video><source src="..."></video>` has no attribute on the
/// `video` tag itself for lol_html to match on and select away — the id
/// element handler has no ancestor-replace operation — so that shape falls
/// through to `replace_nested_source_videos`'s regex pass, the same
/// lookahead-free-regex idiom the sprite/hints steps already use for spans
/// lol_html's element-at-a-time model can't express.
pub fn apply_video_facades(html: &str, settings: &FacadeSettings) -> anyhow::Result<(String, usize)> {
    if !settings.video_facades_enabled {
        return Ok((html.to_string(), 0));
    }

    let mut output = Vec::with_capacity(html.len());
    let count = std::sync::atomic::AtomicUsize::new(0);
    let settings = settings.clone();

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("iframe[src]", |el| {
                    if let Some(src) = el.get_attribute("src") {
                        if let Some(facade) = matching_facade(&src, FacadeCategory::VideoEmbed) {
                            let resolved = resolve_src(facade, &src, &settings);
                            let poster = poster_url(facade, &src, settings.poster_quality);
                            let markup = placeholder_markup(facade.name, &resolved, poster.as_deref());
                            el.replace(&markup, lol_html::html_content::ContentType::Html);
                            count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    }
                    Ok(())
                }),
                element!("video[src]", |el| {
                    if let Some(src) = el.get_attribute("src") {
                        if let Some(facade) = matching_facade(&src, FacadeCategory::SelfHostedVideo) {
                            let markup = placeholder_markup(facade.name, &src, None);
                            el.replace(&markup, lol_html::html_content::ContentType::Html);
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
    rewriter.write(html.as_bytes()).map_err(|e| anyhow::anyhow!("facade write failed: {e}"))?;
    rewriter.end().map_err(|e| anyhow::anyhow!("facade end failed: {e}"))?;

    let rewritten = String::from_utf8(output)?;
    let (rewritten, nested_count) = replace_nested_source_videos(&rewritten);

    Ok((rewritten, count.load(std::sync::atomic::Ordering::Relaxed) + nested_count))
}

/// Catches `<video>...<source src="...">...</video>` blocks the `video[src]`
/// element handler can't see because the activating URL lives on a nested
/// `<source>`, not the `video` tag's own attributes. Any `<video>` reaching
/// this pass already lacks a usable own `src` — the element handler above
/// would have matched and replaced it otherwise — so no lookahead is needed
/// to exclude that case.
fn replace_nested_source_videos(html: &str) -> (String, usize) {
    let re = match Regex::new(r#"(?s)<video\b[^>]*>.*?<source\b[^>]+src\s*=\s*"([^"]*)"[^>]*>.*?</video>"#) {
        Ok(re) => re,
        Err(_) => return (html.to_string(), 0),
    };
    let mut count = 0usize;
    let rewritten = re.replace_all(html, |caps: &regex::Captures| {
        count += 1;
        placeholder_markup("video", &caps[1], None)
    });
    (rewritten.into_owned(), count)
}

/// Step e: Google Maps embed facade, dispatched off `CATALOG` like every
/// other platform instead of its own hardcoded selector/regex.
pub fn apply_maps_facade(html: &str, settings: &FacadeSettings) -> anyhow::Result<(String, usize)> {
    if !settings.google_maps_facade {
        return Ok((html.to_string(), 0));
    }

    let mut output = Vec::with_capacity(html.len());
    let count = std::sync::atomic::AtomicUsize::new(0);

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("iframe[src]", |el| {
                if let Some(src) = el.get_attribute("src") {
                    if let Some(facade) = matching_facade(&src, FacadeCategory::Maps) {
                        let markup = placeholder_markup(facade.name, &src, None);
                        el.replace(&markup, lol_html::html_content::ContentType::Html);
                        count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    }
                }
                Ok(())
            })],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );
    rewriter.write(html.as_bytes()).map_err(|e| anyhow::anyhow!("maps facade write failed: {e}"))?;
    rewriter.end().map_err(|e| anyhow::anyhow!("maps facade end failed: {e}"))?;

    Ok((String::from_utf8(output)?, count.load(std::sync::atomic::Ordering::Relaxed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> FacadeSettings {
        FacadeSettings {
            video_facades_enabled: true,
            poster_quality: PosterQuality::ThumbnailHigh,
            privacy_enhanced_hosts: true,
            google_maps_facade: true,
        }
    }

    #[test]
    fn replaces_youtube_iframe_with_placeholder() {
        let html = r#"<iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ"></iframe>"#;
        let (out, count) = apply_video_facades(html, &settings()).unwrap();
        assert_eq!(count, 1);
        assert!(out.contains("facade-youtube"));
        assert!(!out.contains("<iframe"));
    }

    #[test]
    fn privacy_enhanced_host_swap_applies() {
        let html = r#"<iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ"></iframe>"#;
        let (out, _) = apply_video_facades(html, &settings()).unwrap();
        assert!(out.contains("youtube-nocookie.com"));
    }

    #[test]
    fn disabled_setting_leaves_iframe_untouched() {
        let mut s = settings();
        s.video_facades_enabled = false;
        let html = r#"<iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ"></iframe>"#;
        let (out, count) = apply_video_facades(html, &s).unwrap();
        assert_eq!(count, 0);
        assert!(out.contains("<iframe"));
    }

    #[test]
    fn maps_facade_replaces_embed() {
        let html = r#"<iframe src="https://www.google.com/maps/embed?pb=xyz"></iframe>"#;
        let (out, count) = apply_maps_facade(html, &settings()).unwrap();
        assert_eq!(count, 1);
        assert!(out.contains("facade-google-maps"));
    }

    #[test]
    fn maps_facade_is_a_catalog_entry() {
        assert!(CATALOG.iter().any(|f| f.name == "google-maps" && f.category == FacadeCategory::Maps));
    }

    #[test]
    fn non_matching_iframe_is_untouched() {
        let html = r#"<iframe src="https://example.com/widget"></iframe>"#;
        let (out, count) = apply_video_facades(html, &settings()).unwrap();
        assert_eq!(count, 0);
        assert!(out.contains("example.com/widget"));
    }

    #[test]
    fn self_hosted_video_with_inline_src_is_replaced() {
        let html = r#"<video src="/media/clip.mp4" controls></video>"#;
        let (out, count) = apply_video_facades(html, &settings()).unwrap();
        assert_eq!(count, 1);
        assert!(out.contains("facade-video"));
        assert!(out.contains("/media/clip.mp4"));
        assert!(!out.contains("<video"));
    }

    #[test]
    fn self_hosted_video_with_nested_source_is_replaced() {
        let html = r#"<video controls><source src="/media/clip.webm" type="video/webm"></video>"#;
        let (out, count) = apply_video_facades(html, &settings()).unwrap();
        assert_eq!(count, 1);
        assert!(out.contains("facade-video"));
        assert!(out.contains("/media/clip.webm"));
        assert!(!out.contains("<video"));
        assert!(!out.contains("<source"));
    }

    #[test]
    fn disabled_setting_leaves_self_hosted_video_untouched() {
        let mut s = settings();
        s.video_facades_enabled = false;
        let html = r#"<video src="/media/clip.mp4" controls></video>"#;
        let (out, count) = apply_video_facades(html, &s).unwrap();
        assert_eq!(count, 0);
        assert!(out.contains("<video"));
    }
}
