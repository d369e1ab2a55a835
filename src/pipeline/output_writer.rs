//! Step "write" (spec §4.5): mirror every rewritten page to
//! `workDir/output/<path>/index.html`, copy the transformed asset tree to
//! `workDir/output/assets/`, and drop the `_headers` manifest at the output
//! root.
//!
//! The recursive copy runs inside `spawn_blocking`, the same offload shape
//! `content_saver::compression` uses for its own file I/O so the async
//! runtime never blocks on a large asset tree.

use std::path::{Path, PathBuf};

use crate::pipeline::headers::{HeaderRule, render_headers_manifest};

/// Map a crawled page's URL path to its output file: `/` → `index.html`,
/// `/about` → `about/index.html`, `/about/` → `about/index.html`.
fn page_output_path(output_dir: &Path, url_path: &str) -> PathBuf {
    let trimmed = url_path.trim_matches('/');
    if trimmed.is_empty() {
        output_dir.join("index.html")
    } else {
        output_dir.join(trimmed).join("index.html")
    }
}

/// Write every rewritten page's HTML under `work_dir/output/`.
pub async fn write_pages(work_dir: &Path, pages: &[(String, String)]) -> anyhow::Result<()> {
    let output_dir = work_dir.join("output");
    for (url_path, html) in pages {
        let dest = page_output_path(&output_dir, url_path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, html).await?;
    }
    Ok(())
}

/// Copy `work_dir/assets/` to `work_dir/output/assets/` in its
/// post-transform state (renamed files, variant siblings, everything C3
/// produced).
pub async fn copy_assets(work_dir: &Path) -> anyhow::Result<()> {
    let src = work_dir.join("assets");
    let dest = work_dir.join("output").join("assets");
    if !src.exists() {
        return Ok(());
    }
    tokio::task::spawn_blocking(move || copy_dir_recursive(&src, &dest)).await??;
    Ok(())
}

/// Recursive directory copy, reused by `publish::LocalEdgePublisher` to
/// stage a build's output under its own publish root.
pub(crate) fn copy_dir_recursive(src: &Path, dest: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else {
            std::fs::copy(&src_path, &dest_path)?;
        }
    }
    Ok(())
}

/// Render and write the `_headers` manifest at `work_dir/output/_headers`.
pub async fn write_headers_manifest(work_dir: &Path, rules: &[HeaderRule]) -> anyhow::Result<()> {
    let dest = work_dir.join("output").join("_headers");
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&dest, render_headers_manifest(rules)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_page_maps_to_index_html() {
        let out = Path::new("/tmp/out");
        assert_eq!(page_output_path(out, "/"), out.join("index.html"));
    }

    #[test]
    fn nested_page_maps_to_directory_index() {
        let out = Path::new("/tmp/out");
        assert_eq!(page_output_path(out, "/about/team"), out.join("about/team/index.html"));
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let out = Path::new("/tmp/out");
        assert_eq!(page_output_path(out, "/about/"), out.join("about/index.html"));
    }

    #[tokio::test]
    async fn write_pages_creates_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let pages = vec![
            ("/".to_string(), "<html>home</html>".to_string()),
            ("/about".to_string(), "<html>about</html>".to_string()),
        ];
        write_pages(dir.path(), &pages).await.unwrap();
        assert!(dir.path().join("output/index.html").exists());
        assert!(dir.path().join("output/about/index.html").exists());
    }

    #[tokio::test]
    async fn copy_assets_is_noop_when_source_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(copy_assets(dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn copy_assets_mirrors_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("assets/css");
        tokio::fs::create_dir_all(&nested).await.unwrap();
        tokio::fs::write(nested.join("app.css"), b"body{}").await.unwrap();
        copy_assets(dir.path()).await.unwrap();
        assert!(dir.path().join("output/assets/css/app.css").exists());
    }
}
