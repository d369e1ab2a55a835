use anyhow::Result;

use crate::utils::{ensure_domain_gitignore, get_mirror_path};

use super::compression::save_compressed_file;

/// Save an arbitrary JSON document at the mirrored path for `url`. Used for
/// checkpoint/history persistence and stats output (spec §4.7, §4.5).
pub async fn save_json_data(
    data: serde_json::Value,
    url: String,
    output_dir: std::path::PathBuf,
) -> Result<()> {
    let path = get_mirror_path(&url, &output_dir, "index.json").await?;
    ensure_domain_gitignore(&path, &output_dir).await?;

    let json_str = tokio::task::spawn_blocking(move || serde_json::to_string_pretty(&data))
        .await
        .map_err(|e| anyhow::anyhow!("JSON serialization task panicked: {e}"))??;

    tokio::fs::create_dir_all(
        path.parent()
            .ok_or_else(|| anyhow::anyhow!("Path has no parent directory"))?,
    )
    .await?;

    let (_saved_path, _metadata) =
        save_compressed_file(json_str.into_bytes(), &path, "application/json", false, 1_048_576).await?;

    Ok(())
}
