//! Image transformer (spec §4.3.1): raster recompression + AVIF/WebP
//! sibling variants, SVG optimization, GIF/ICO pass-through.
//!
//! Grounded on the `image`/`ravif`/`usvg` stack already used by the
//! `tola-rs-tola-ssg` pack example for exactly this job (raster transcode +
//! AVIF encode + SVG parse), reused here instead of inventing a codec
//! layer.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::models::AssetVariant;
use crate::settings::types::{ImageSettings, LcpMode};
use crate::transform::errors::TransformError;

/// Per-format quality tier, picked by LCP-ness / path hint and overridable
/// leaf-wise from user settings (spec §4.3.1 "Quality tiers").
///
/// `jpeg`/`avif` are applied at encode time. `webp` is carried through for
/// settings/API parity but is not applied: `image`'s bundled WebP encoder is
/// lossless-only (no quality knob, no near-lossless mode), the same
/// limitation that makes `tola-rs-tola-ssg` bail out of WebP conversion
/// entirely. `encode_variant_webp` always produces a lossless WebP
/// regardless of this value.
#[derive(Debug, Clone, Copy)]
pub struct QualityTier {
    pub jpeg: u8,
    pub webp: u8,
    pub avif: u8,
}

const HERO: QualityTier = QualityTier { jpeg: 88, webp: 88, avif: 60 };
const STANDARD: QualityTier = QualityTier { jpeg: 75, webp: 75, avif: 45 };
const THUMBNAIL: QualityTier = QualityTier { jpeg: 65, webp: 65, avif: 40 };

/// Path substrings that hint "thumbnail" in the absence of an explicit LCP
/// flag — common CMS/theme conventions (`-thumb`, `/thumbnails/`, `icon`).
const THUMBNAIL_HINTS: &[&str] = &["thumb", "icon", "avatar", "favicon"];

#[must_use]
pub fn derive_quality_tier(path: &str, is_lcp: bool, settings: &ImageSettings) -> QualityTier {
    let derived = if is_lcp {
        HERO
    } else if THUMBNAIL_HINTS.iter().any(|hint| path.to_ascii_lowercase().contains(hint)) {
        THUMBNAIL
    } else {
        STANDARD
    };

    // User settings override the derived tier leaf-wise: a non-zero
    // explicit quality always wins over the heuristic.
    QualityTier {
        jpeg: if settings.quality_jpeg > 0 { settings.quality_jpeg } else { derived.jpeg },
        webp: if settings.quality_webp > 0 { settings.quality_webp } else { derived.webp },
        avif: if settings.quality_avif > 0 { settings.quality_avif } else { derived.avif },
    }
}

/// Outcome of transforming one image asset.
#[derive(Debug, Clone, Default)]
pub struct ImageTransformResult {
    /// `Some(new_size)` when the original was overwritten in place.
    pub overwritten_size: Option<u64>,
    pub variants: Vec<AssetVariant>,
}

/// Transform the image at `path` in place, per spec §4.3.1. Any decode or
/// encode failure is swallowed into a pass-through result (original file
/// untouched, no variants) rather than propagated — callers log the error
/// and move on to the next asset.
pub fn transform_image(
    path: &Path,
    settings: &ImageSettings,
    is_lcp: bool,
) -> ImageTransformResult {
    match try_transform_image(path, settings, is_lcp) {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "image transform failed, passing through");
            ImageTransformResult::default()
        }
    }
}

fn try_transform_image(
    path: &Path,
    settings: &ImageSettings,
    is_lcp: bool,
) -> Result<ImageTransformResult, TransformError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if ext == "svg" {
        return if settings.optimize_svg {
            optimize_svg(path)
        } else {
            Ok(ImageTransformResult::default())
        };
    }

    if ext == "gif" || ext == "ico" {
        return Ok(ImageTransformResult::default());
    }

    let original_bytes = std::fs::read(path).map_err(|source| TransformError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let original_len = original_bytes.len() as u64;

    let img = image::load_from_memory(&original_bytes).map_err(|source| TransformError::Image {
        path: path.to_path_buf(),
        source: source.into(),
    })?;

    let (src_w, _src_h) = img.dimensions();
    let target_w = settings.max_width.min(src_w);
    let resized = resize_without_upscale(&img, target_w);

    let path_str = path.to_string_lossy();
    let tier = derive_quality_tier(&path_str, is_lcp, settings);

    let mut result = ImageTransformResult::default();

    let format = ImageFormat::from_path(path).ok();
    if let Some(format) = format {
        if let Some(new_bytes) = encode_recompressed(&resized, format, &tier) {
            let threshold = if is_lcp { 1.0 } else { 0.95 };
            if (new_bytes.len() as f64) < (original_len as f64) * threshold {
                if settings.keep_original {
                    // Leave `path` untouched; the recompressed bytes land in
                    // a sibling file instead (spec §4.3.1 Inputs: `keepOriginal`).
                    let out_path = recompressed_sibling_path(path, &ext);
                    std::fs::write(&out_path, &new_bytes).map_err(|source| TransformError::Io {
                        path: out_path.clone(),
                        source,
                    })?;
                    result.variants.push(AssetVariant {
                        relative_path: out_path.to_string_lossy().replace('\\', "/"),
                        width: None,
                        format: ext.clone(),
                    });
                } else {
                    std::fs::write(path, &new_bytes).map_err(|source| TransformError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                    result.overwritten_size = Some(new_bytes.len() as u64);
                }
            }
        }
    }

    if settings.convert_to_webp {
        if let Some(variant) = encode_variant_webp(&resized, path, None)? {
            result.variants.push(variant);
        }
    }
    if settings.convert_to_avif {
        if let Some(variant) = encode_variant_avif(&resized, path, None, tier.avif, original_len)? {
            result.variants.push(variant);
        }
    }

    for &breakpoint in &settings.breakpoints {
        if breakpoint >= src_w {
            continue;
        }
        let scaled = resize_without_upscale(&img, breakpoint);
        if settings.convert_to_webp {
            if let Some(variant) = encode_variant_webp(&scaled, path, Some(breakpoint))? {
                result.variants.push(variant);
            }
        }
    }

    let _ = settings.strip_metadata; // re-encoding via `image` already drops source metadata.
    let _ = matches!(settings.lcp_mode, LcpMode::Auto | LcpMode::Manual); // tier derivation handles both modes via `is_lcp`.

    Ok(result)
}

fn resize_without_upscale(img: &DynamicImage, target_w: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if target_w >= w || target_w == 0 {
        return img.clone();
    }
    let target_h = ((h as u64 * target_w as u64) / w as u64).max(1) as u32;
    img.resize(target_w, target_h, image::imageops::FilterType::Lanczos3)
}

fn encode_recompressed(
    img: &DynamicImage,
    format: ImageFormat,
    tier: &QualityTier,
) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buf);
    match format {
        ImageFormat::Jpeg => {
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, tier.jpeg);
            img.write_with_encoder(encoder).ok()?;
        }
        ImageFormat::Png => {
            img.write_to(&mut cursor, ImageFormat::Png).ok()?;
        }
        ImageFormat::WebP => {
            img.write_to(&mut cursor, ImageFormat::WebP).ok()?;
        }
        _ => return None,
    }
    Some(buf)
}

fn sibling_path(original: &Path, suffix: Option<u32>, extension: &str) -> PathBuf {
    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset");
    let name = match suffix {
        Some(w) => format!("{stem}-{w}w.{extension}"),
        None => format!("{stem}.{extension}"),
    };
    original.parent().map(|dir| dir.join(&name)).unwrap_or_else(|| PathBuf::from(&name))
}

/// Always lossless — see `QualityTier`'s doc comment for why no quality
/// argument is taken here.
/// Sibling path for a recompressed-but-kept original (`settings.keep_original`):
/// `<stem>-optimized.<ext>`, alongside the untouched source file.
fn recompressed_sibling_path(original: &Path, extension: &str) -> PathBuf {
    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset");
    let name = format!("{stem}-optimized.{extension}");
    original.parent().map(|dir| dir.join(&name)).unwrap_or_else(|| PathBuf::from(&name))
}

fn encode_variant_webp(
    img: &DynamicImage,
    original: &Path,
    width_suffix: Option<u32>,
) -> Result<Option<AssetVariant>, TransformError> {
    let out_path = sibling_path(original, width_suffix, "webp");
    let mut buf = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buf);
    img.write_to(&mut cursor, ImageFormat::WebP)
        .map_err(|source| TransformError::Image { path: original.to_path_buf(), source: source.into() })?;
    std::fs::write(&out_path, &buf).map_err(|source| TransformError::Io { path: out_path.clone(), source })?;
    Ok(Some(AssetVariant {
        relative_path: out_path.to_string_lossy().replace('\\', "/"),
        width: width_suffix,
        format: "webp".to_string(),
    }))
}

fn encode_variant_avif(
    img: &DynamicImage,
    original: &Path,
    width_suffix: Option<u32>,
    quality: u8,
    original_len: u64,
) -> Result<Option<AssetVariant>, TransformError> {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let pixels: Vec<ravif::RGBA8> = rgba
        .pixels()
        .map(|p| ravif::RGBA8::new(p[0], p[1], p[2], p[3]))
        .collect();
    let img_buf = ravif::Img::new(pixels.as_slice(), w as usize, h as usize);

    let encoded = ravif::Encoder::new()
        .with_quality(quality as f32)
        .with_speed(8)
        .encode_rgba(img_buf)
        .map_err(|source| TransformError::Image {
            path: original.to_path_buf(),
            source: anyhow::anyhow!("avif encode failed: {source}"),
        })?;

    // AVIF is slower to decode than WebP/JPEG; only keep it when the win is
    // substantial (spec §4.3.1: reject marginal AVIF wins).
    if (encoded.avif_file.len() as f64) >= (original_len as f64) * 0.70 {
        return Ok(None);
    }

    let out_path = sibling_path(original, width_suffix, "avif");
    std::fs::write(&out_path, &encoded.avif_file)
        .map_err(|source| TransformError::Io { path: out_path.clone(), source })?;
    Ok(Some(AssetVariant {
        relative_path: out_path.to_string_lossy().replace('\\', "/"),
        width: width_suffix,
        format: "avif".to_string(),
    }))
}

fn optimize_svg(path: &Path) -> Result<ImageTransformResult, TransformError> {
    let data = std::fs::read(path).map_err(|source| TransformError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let original_len = data.len() as u64;

    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_data(&data, &opt).map_err(|source| TransformError::Image {
        path: path.to_path_buf(),
        source: anyhow::anyhow!("svg parse failed: {source}"),
    })?;

    let write_opts = usvg::WriteOptions {
        preserve_text: true,
        ..Default::default()
    };
    let optimized = tree.to_string(&write_opts);

    if (optimized.len() as u64) < original_len {
        std::fs::write(path, optimized.as_bytes()).map_err(|source| TransformError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        return Ok(ImageTransformResult {
            overwritten_size: Some(optimized.len() as u64),
            variants: Vec::new(),
        });
    }

    Ok(ImageTransformResult::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ImageSettings {
        ImageSettings {
            quality_jpeg: 0,
            quality_webp: 0,
            quality_avif: 0,
            max_width: 1920,
            breakpoints: vec![640, 1024],
            effort: 4,
            strip_metadata: true,
            convert_to_webp: true,
            convert_to_avif: true,
            keep_original: true,
            optimize_svg: true,
            lazy_load: true,
            lcp_mode: LcpMode::Auto,
            lcp_selector: None,
        }
    }

    #[test]
    fn hero_tier_uses_higher_quality_than_standard() {
        let s = settings();
        let hero = derive_quality_tier("img/hero.jpg", true, &s);
        let standard = derive_quality_tier("img/body.jpg", false, &s);
        assert!(hero.jpeg >= standard.jpeg);
        assert!(hero.avif >= standard.avif);
    }

    #[test]
    fn thumbnail_hint_overrides_default_tier() {
        let s = settings();
        let thumb = derive_quality_tier("img/user-thumb.png", false, &s);
        assert_eq!(thumb.jpeg, THUMBNAIL.jpeg);
    }

    #[test]
    fn explicit_quality_override_wins_over_heuristic() {
        let mut s = settings();
        s.quality_jpeg = 50;
        let tier = derive_quality_tier("img/hero.jpg", true, &s);
        assert_eq!(tier.jpeg, 50);
    }

    /// A 64x64 solid-color JPEG saved at quality 100, large enough that
    /// recompressing at the standard tier (quality 75) clears the 0.95
    /// shrink threshold reliably.
    fn write_high_quality_jpeg(path: &Path) {
        let img = image::RgbImage::from_fn(64, 64, |x, y| image::Rgb([(x * 3) as u8, (y * 5) as u8, 128]));
        let dynamic = DynamicImage::ImageRgb8(img);
        let mut buf = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buf);
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, 100);
        dynamic.write_with_encoder(encoder).unwrap();
        std::fs::write(path, &buf).unwrap();
    }

    #[test]
    fn keep_original_leaves_the_source_untouched_and_writes_a_sibling() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("photo.jpg");
        write_high_quality_jpeg(&path);
        let original_bytes = std::fs::read(&path).unwrap();

        let mut s = settings();
        s.convert_to_webp = false;
        s.convert_to_avif = false;
        s.breakpoints = Vec::new();
        s.keep_original = true;

        let result = try_transform_image(&path, &s, false).unwrap();

        assert!(result.overwritten_size.is_none());
        assert_eq!(std::fs::read(&path).unwrap(), original_bytes, "source must be untouched when keepOriginal is set");

        let sibling = tmp.path().join("photo-optimized.jpg");
        assert!(sibling.exists(), "expected a recompressed sibling file");
        assert!(std::fs::metadata(&sibling).unwrap().len() < original_bytes.len() as u64);
    }

    #[test]
    fn without_keep_original_the_source_is_overwritten_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("photo.jpg");
        write_high_quality_jpeg(&path);
        let original_bytes = std::fs::read(&path).unwrap();

        let mut s = settings();
        s.convert_to_webp = false;
        s.convert_to_avif = false;
        s.breakpoints = Vec::new();
        s.keep_original = false;

        let result = try_transform_image(&path, &s, false).unwrap();

        assert!(result.overwritten_size.is_some());
        assert_ne!(std::fs::read(&path).unwrap(), original_bytes);
        assert!(!tmp.path().join("photo-optimized.jpg").exists());
    }
}
