use anyhow::Result;

use crate::utils::{ensure_domain_gitignore, get_mirror_path};

use super::compression::save_compressed_file;

/// Write one rewritten page to `workDir/output/<path>/index.html`
/// (spec §4.5 phase 5, "write"). The HTML rewriter (C4) has already done
/// all transformation; this is a plain mirrored write.
pub async fn save_html_content(
    html_content: String,
    url: String,
    output_dir: std::path::PathBuf,
    compress: bool,
    compression_threshold: usize,
) -> Result<()> {
    let path = get_mirror_path(&url, &output_dir, "index.html").await?;
    ensure_domain_gitignore(&path, &output_dir).await?;

    tokio::fs::create_dir_all(
        path.parent()
            .ok_or_else(|| anyhow::anyhow!("Path has no parent directory"))?,
    )
    .await?;

    let (_saved_path, _metadata) = save_compressed_file(
        html_content.into_bytes(),
        &path,
        "text/html",
        compress,
        compression_threshold,
    )
    .await?;

    Ok(())
}
