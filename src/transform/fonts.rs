//! Font transformer (spec §4.3.4): self-host Google Fonts, rewrite `@font-face`
//! `url()`s to local `.woff2` paths, emit preload hints for the top N faces.
//!
//! Download/size-limit/streaming shape grounded on
//! `inline_css::downloaders::download_css_core` (pre-allocate from
//! `Content-Length`, stream with a running-total size check, bail before
//! buffering past the limit).

use std::path::Path;

use anyhow::Context;
use futures::StreamExt;
use regex::Regex;
use reqwest::Client;

use crate::settings::types::FontSettings;
use crate::transform::errors::TransformError;
use crate::utils::constants::CHROME_USER_AGENT;

const MAX_FONT_CSS_SIZE: usize = 256 * 1024;
const MAX_WOFF2_SIZE: usize = 4 * 1024 * 1024;

/// One `@font-face` src rewritten to a local file, in discovery order —
/// the first `preload_top_n` of these get a `<link rel="preload">` hint.
#[derive(Debug, Clone)]
pub struct SelfHostedFace {
    pub local_relative_path: String,
    pub family: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FontTransformResult {
    pub rewritten_css: String,
    pub faces: Vec<SelfHostedFace>,
}

/// Self-host every Google Fonts stylesheet reachable at `google_fonts_css_urls`,
/// downloading the referenced `.woff2` files into `assets_dir` and returning
/// the rewritten CSS plus the ordered list of self-hosted faces.
pub async fn self_host_google_fonts(
    google_fonts_css_urls: &[String],
    assets_dir: &Path,
    client: &Client,
    settings: &FontSettings,
) -> Result<FontTransformResult, TransformError> {
    if !settings.self_host_google_fonts || google_fonts_css_urls.is_empty() {
        return Ok(FontTransformResult::default());
    }

    let mut combined_css = String::new();
    let mut faces = Vec::new();

    for css_url in google_fonts_css_urls {
        let css = download_font_css(css_url, client).await.map_err(|source| TransformError::Font {
            url: css_url.clone(),
            source,
        })?;

        let (rewritten, mut css_faces) = rewrite_and_download_faces(&css, assets_dir, client)
            .await
            .map_err(|source| TransformError::Font { url: css_url.clone(), source })?;

        combined_css.push_str(&rewritten);
        combined_css.push('\n');
        faces.append(&mut css_faces);
    }

    Ok(FontTransformResult {
        rewritten_css: combined_css,
        faces,
    })
}

/// Build `<link rel="preload" as="font" type="font/woff2" crossorigin>`
/// hints for the first `preload_top_n` self-hosted faces (spec §4.3.4,
/// default cap of 3).
#[must_use]
pub fn preload_hints(faces: &[SelfHostedFace], preload_top_n: u8) -> Vec<String> {
    faces
        .iter()
        .take(preload_top_n as usize)
        .map(|face| {
            format!(
                r#"<link rel="preload" href="{}" as="font" type="font/woff2" crossorigin>"#,
                face.local_relative_path
            )
        })
        .collect()
}

async fn download_font_css(url: &str, client: &Client) -> anyhow::Result<String> {
    let response = client
        .get(url)
        .header("User-Agent", CHROME_USER_AGENT)
        .header("Accept", "text/css,*/*;q=0.1")
        .send()
        .await
        .context("failed to download google fonts css")?;

    if !response.status().is_success() {
        anyhow::bail!("google fonts css download failed with status: {}", response.status());
    }

    let expected = response.content_length().unwrap_or(0);
    if expected > MAX_FONT_CSS_SIZE as u64 {
        anyhow::bail!("font css too large: {expected} bytes exceeds limit of {MAX_FONT_CSS_SIZE}");
    }

    let mut buffer = if expected > 0 { Vec::with_capacity(expected as usize) } else { Vec::new() };
    let mut stream = response.bytes_stream();
    let mut total = 0usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("failed to read font css chunk")?;
        total += chunk.len();
        if total > MAX_FONT_CSS_SIZE {
            anyhow::bail!("font css exceeded size limit during download: {total} bytes");
        }
        buffer.extend_from_slice(&chunk);
    }

    String::from_utf8(buffer).context("font css is not valid utf-8")
}

async fn download_font_file(url: &str, client: &Client) -> anyhow::Result<Vec<u8>> {
    let response = client
        .get(url)
        .header("User-Agent", CHROME_USER_AGENT)
        .send()
        .await
        .context("failed to download font file")?;

    if !response.status().is_success() {
        anyhow::bail!("font file download failed with status: {}", response.status());
    }

    let expected = response.content_length().unwrap_or(0);
    if expected > MAX_WOFF2_SIZE as u64 {
        anyhow::bail!("font file too large: {expected} bytes exceeds limit of {MAX_WOFF2_SIZE}");
    }

    let mut buffer = if expected > 0 { Vec::with_capacity(expected as usize) } else { Vec::new() };
    let mut stream = response.bytes_stream();
    let mut total = 0usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("failed to read font file chunk")?;
        total += chunk.len();
        if total > MAX_WOFF2_SIZE {
            anyhow::bail!("font file exceeded size limit during download: {total} bytes");
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer)
}

async fn rewrite_and_download_faces(
    css: &str,
    assets_dir: &Path,
    client: &Client,
) -> anyhow::Result<(String, Vec<SelfHostedFace>)> {
    static URL_RE: once_cell::sync::Lazy<Regex> =
        once_cell::sync::Lazy::new(|| Regex::new(r#"url\((https://fonts\.gstatic\.com/[^)'"]+)\)"#).unwrap());
    static FAMILY_RE: once_cell::sync::Lazy<Regex> =
        once_cell::sync::Lazy::new(|| Regex::new(r#"font-family:\s*['"]?([^;'"}]+)['"]?;"#).unwrap());

    std::fs::create_dir_all(assets_dir).context("failed to create fonts asset directory")?;

    let mut out = String::with_capacity(css.len());
    let mut last_end = 0usize;
    let mut faces = Vec::new();

    for cap in URL_RE.captures_iter(css) {
        let whole = cap.get(0).unwrap();
        let remote_url = &cap[1];

        out.push_str(&css[last_end..whole.start()]);

        let bytes = download_font_file(remote_url, client).await?;
        let file_name = local_font_file_name(remote_url, &bytes);
        let local_path = assets_dir.join(&file_name);
        std::fs::write(&local_path, &bytes).context("failed to write self-hosted font file")?;

        let local_relative_path = local_path.to_string_lossy().replace('\\', "/");
        out.push_str(&format!("url({local_relative_path})"));

        let preceding = &css[..whole.start()];
        let family = FAMILY_RE
            .captures(preceding)
            .map(|c| c[1].trim().to_string());

        faces.push(SelfHostedFace { local_relative_path, family });

        last_end = whole.end();
    }
    out.push_str(&css[last_end..]);

    Ok((out, faces))
}

fn local_font_file_name(remote_url: &str, bytes: &[u8]) -> String {
    let hash = format!("{:016x}", xxhash_rust::xxh3::xxh3_64(bytes));
    let stem = remote_url
        .rsplit('/')
        .next()
        .and_then(|s| s.split('.').next())
        .unwrap_or("font");
    format!("{stem}-{}.woff2", &hash[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preload_hints_caps_at_top_n() {
        let faces = vec![
            SelfHostedFace { local_relative_path: "a.woff2".into(), family: Some("A".into()) },
            SelfHostedFace { local_relative_path: "b.woff2".into(), family: Some("B".into()) },
            SelfHostedFace { local_relative_path: "c.woff2".into(), family: None },
        ];
        let hints = preload_hints(&faces, 2);
        assert_eq!(hints.len(), 2);
        assert!(hints[0].contains("a.woff2"));
        assert!(hints[1].contains("b.woff2"));
    }

    #[test]
    fn preload_hints_empty_when_zero() {
        let faces = vec![SelfHostedFace { local_relative_path: "a.woff2".into(), family: None }];
        assert!(preload_hints(&faces, 0).is_empty());
    }

    #[test]
    fn local_font_file_name_is_deterministic() {
        let a = local_font_file_name("https://fonts.gstatic.com/s/roboto/v30/x.woff2", b"abc");
        let b = local_font_file_name("https://fonts.gstatic.com/s/roboto/v30/x.woff2", b"abc");
        assert_eq!(a, b);
        assert!(a.ends_with(".woff2"));
    }
}
