//! Visual probe (spec §4.6): screenshot each page against the optimized
//! edge URL and compare it to the crawl-time baseline with a deterministic
//! perceptual diff.
//!
//! The diff itself is a plain per-pixel RGB delta over `image::DynamicImage`
//! buffers — the same crate `transform::image` already uses for raster
//! decode, so no extra perceptual-hash dependency was pulled in for this.

use image::{GenericImageView, imageops::FilterType};

use crate::browser::BrowsingDriver;

use super::errors::VerifyError;

/// Fraction of pixels differing by more than this ratio still counts as
/// "identical" — screenshots of the same page taken seconds apart are
/// rarely byte-identical (anti-aliasing, font hinting).
const EPSILON_IDENTICAL: f64 = 0.01;
/// Above this, the page still renders recognizably the same but the diff
/// is visible (reflowed text, a moved image).
const EPSILON_ACCEPTABLE: f64 = 0.05;
/// Above this, the page has likely broken in some visible way rather than
/// just drifted.
const EPSILON_NEEDS_REVIEW: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualVerdict {
    Identical,
    Acceptable,
    NeedsReview,
    Failed,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VisualResult {
    pub url_path: String,
    pub verdict: VisualVerdict,
    pub diff_ratio: f64,
}

impl VisualResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self.verdict, VisualVerdict::Identical | VisualVerdict::Acceptable)
    }
}

/// Average normalized per-channel RGB delta between two same-shape images,
/// in `[0.0, 1.0]`. Images of differing dimensions are resized to the
/// baseline's size first so a responsive-layout reflow doesn't short-circuit
/// the comparison — the resize itself is deterministic (`Triangle` filter).
fn pixel_diff_ratio(baseline: &[u8], candidate: &[u8]) -> Result<f64, VerifyError> {
    let baseline_img = image::load_from_memory(baseline).map_err(VerifyError::ImageDecode)?;
    let candidate_img = image::load_from_memory(candidate).map_err(VerifyError::ImageDecode)?;

    let (width, height) = baseline_img.dimensions();
    let candidate_img = if candidate_img.dimensions() == (width, height) {
        candidate_img
    } else {
        candidate_img.resize_exact(width, height, FilterType::Triangle)
    };

    let baseline_rgb = baseline_img.to_rgb8();
    let candidate_rgb = candidate_img.to_rgb8();

    let mut total_delta: u64 = 0;
    let pixel_count = (width as u64) * (height as u64);
    for (b, c) in baseline_rgb.pixels().zip(candidate_rgb.pixels()) {
        for channel in 0..3 {
            total_delta += (b[channel] as i32 - c[channel] as i32).unsigned_abs() as u64;
        }
    }

    if pixel_count == 0 {
        return Ok(0.0);
    }
    Ok(total_delta as f64 / (pixel_count * 3 * 255) as f64)
}

#[must_use]
pub fn classify(diff_ratio: f64) -> VisualVerdict {
    if diff_ratio <= EPSILON_IDENTICAL {
        VisualVerdict::Identical
    } else if diff_ratio <= EPSILON_ACCEPTABLE {
        VisualVerdict::Acceptable
    } else if diff_ratio <= EPSILON_NEEDS_REVIEW {
        VisualVerdict::NeedsReview
    } else {
        VisualVerdict::Failed
    }
}

/// Navigate to `page_url` on the optimized edge, screenshot it, and diff
/// against the crawl-time `baseline_png`.
pub async fn verify_page(
    driver: &impl BrowsingDriver,
    url_path: &str,
    page_url: &str,
    baseline_png: &[u8],
    settle_after: std::time::Duration,
    load_timeout: std::time::Duration,
) -> Result<VisualResult, VerifyError> {
    driver
        .navigate(page_url, load_timeout)
        .await
        .map_err(|source| VerifyError::Navigation { url: page_url.to_string(), source })?;
    driver.settle(settle_after).await;

    let candidate_png =
        driver.capture_screenshot().await.map_err(|source| VerifyError::Navigation { url: page_url.to_string(), source })?;

    let diff_ratio = pixel_diff_ratio(baseline_png, &candidate_png)?;
    Ok(VisualResult { url_path: url_path.to_string(), verdict: classify(diff_ratio), diff_ratio })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb(rgb);
        }
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn identical_images_have_zero_diff() {
        let a = solid_png(16, 16, [120, 120, 120]);
        let b = a.clone();
        let ratio = pixel_diff_ratio(&a, &b).unwrap();
        assert_eq!(classify(ratio), VisualVerdict::Identical);
    }

    #[test]
    fn wildly_different_images_fail() {
        let a = solid_png(16, 16, [0, 0, 0]);
        let b = solid_png(16, 16, [255, 255, 255]);
        let ratio = pixel_diff_ratio(&a, &b).unwrap();
        assert_eq!(classify(ratio), VisualVerdict::Failed);
    }

    #[test]
    fn differing_dimensions_are_resized_before_comparison() {
        let a = solid_png(16, 16, [10, 10, 10]);
        let b = solid_png(32, 32, [10, 10, 10]);
        let ratio = pixel_diff_ratio(&a, &b).unwrap();
        assert_eq!(classify(ratio), VisualVerdict::Identical);
    }

    #[test]
    fn classify_boundaries() {
        assert_eq!(classify(0.0), VisualVerdict::Identical);
        assert_eq!(classify(EPSILON_IDENTICAL), VisualVerdict::Identical);
        assert_eq!(classify(EPSILON_ACCEPTABLE), VisualVerdict::Acceptable);
        assert_eq!(classify(EPSILON_NEEDS_REVIEW), VisualVerdict::NeedsReview);
        assert_eq!(classify(0.9), VisualVerdict::Failed);
    }
}
