//! Asset download (spec §4.2 step 4): fetch every referenced asset to
//! `workDir/assets/`, preserving its extension, recording size + hash.
//!
//! Streaming-with-size-limit is the same shape as `inline_css::downloaders`,
//! adapted here for writing to disk instead of inlining as a data URL.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use log::warn;
use reqwest::Client;

use crate::models::asset::Asset;
use crate::utils::constants::CHROME_USER_AGENT;

/// Refuse assets larger than this; oversized downloads are recorded as
/// pass-through rather than risking unbounded memory use during a crawl.
const MAX_ASSET_BYTES: usize = 25 * 1024 * 1024;

/// Compute the on-disk path for an asset URL under `work_dir/assets/`,
/// mirroring the source URL's host + path so collisions between assets from
/// different domains can't happen.
fn asset_relative_path(url: &str) -> Option<PathBuf> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let mut path = PathBuf::from(host);
    let segments: Vec<&str> = parsed.path_segments().map(Iterator::collect).unwrap_or_default();
    if segments.is_empty() || segments.last() == Some(&"") {
        path.push("asset.bin");
    } else {
        for segment in segments {
            path.push(segment);
        }
    }
    Some(path)
}

async fn download_bytes(client: &Client, url: &str) -> anyhow::Result<Vec<u8>> {
    let response = client
        .get(url)
        .header("User-Agent", CHROME_USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let expected = response.content_length().unwrap_or(0) as usize;
    if expected > MAX_ASSET_BYTES {
        anyhow::bail!("asset too large: {expected} bytes exceeds {MAX_ASSET_BYTES}");
    }

    let mut buffer = Vec::with_capacity(expected.min(MAX_ASSET_BYTES));
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if buffer.len() + chunk.len() > MAX_ASSET_BYTES {
            anyhow::bail!("asset exceeded size limit during download");
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer)
}

/// Download one asset. On any failure, returns an `Asset` with
/// `originalBytes = 0` (spec §4.2 failure semantics: "the asset is recorded
/// with originalBytes=0 and the pipeline treats it as pass-through") rather
/// than propagating the error — per-asset failures must not abort the crawl.
pub async fn download_asset(client: &Client, url: &str, work_dir: &Path) -> Asset {
    let Some(relative_path) = asset_relative_path(url) else {
        warn!("could not derive a local path for asset url: {url}");
        return Asset::new(url.to_string(), String::new(), 0, String::new());
    };
    let relative_str = relative_path.to_string_lossy().replace('\\', "/");

    match download_bytes(client, url).await {
        Ok(bytes) => {
            let hash = format!("{:x}", xxhash_rust::xxh3::xxh3_64(&bytes));
            let dest = work_dir.join("assets").join(&relative_path);
            if let Some(parent) = dest.parent() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    warn!("failed to create asset directory for {url}: {e}");
                    return Asset::new(url.to_string(), relative_str, 0, String::new());
                }
            }
            if let Err(e) = tokio::fs::write(&dest, &bytes).await {
                warn!("failed to write asset {url} to {}: {e}", dest.display());
                return Asset::new(url.to_string(), relative_str, 0, String::new());
            }
            Asset::new(url.to_string(), relative_str, bytes.len() as u64, hash)
        }
        Err(e) => {
            warn!("failed to download asset {url}: {e}");
            Asset::new(url.to_string(), relative_str, 0, String::new())
        }
    }
}
