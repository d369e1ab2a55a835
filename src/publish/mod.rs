//! Edge publisher boundary (spec §1 Non-goals: "edge deployment targets
//! \[are\] treated as an opaque publisher returning an edge URL"; SPEC_FULL
//! §1 names it `EdgePublisher`).
//!
//! `EdgePublisher` is the narrow trait C9 calls after a successful build;
//! `LocalEdgePublisher` is the one concrete implementation this crate
//! ships — it stages the build's output under a local directory tree and
//! hands back a URL an `http`-layer `ServeDir` can serve, useful for the
//! `serve` CLI subcommand and for tests. A real deployment target (S3 +
//! CloudFront, Vercel, Netlify, ...) implements the same trait without
//! touching C9.

pub mod errors;

pub use errors::PublishError;

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::pipeline::output_writer::copy_dir_recursive;

/// Publish one build's output directory to wherever the edge lives,
/// returning the URL it is now reachable at.
pub trait EdgePublisher: Send + Sync {
    fn publish(
        &self,
        site_id: Uuid,
        build_id: Uuid,
        output_dir: &Path,
    ) -> impl Future<Output = Result<String, PublishError>> + Send;
}

/// Publishes by copying `output_dir` into `publish_root/<site_id>/<build_id>/`
/// and returning a `base_url`-relative path into it. Intended for local
/// development and the `serve` CLI subcommand (spec §6), where the HTTP
/// layer mounts `publish_root` with `tower_http::services::ServeDir`.
pub struct LocalEdgePublisher {
    publish_root: PathBuf,
    base_url: String,
}

impl LocalEdgePublisher {
    #[must_use]
    pub fn new(publish_root: PathBuf, base_url: impl Into<String>) -> Self {
        Self { publish_root, base_url: base_url.into() }
    }
}

impl EdgePublisher for LocalEdgePublisher {
    async fn publish(&self, site_id: Uuid, build_id: Uuid, output_dir: &Path) -> Result<String, PublishError> {
        let dest = self.publish_root.join(site_id.to_string()).join(build_id.to_string());
        let output_dir = output_dir.to_path_buf();
        let dest_for_copy = dest.clone();
        tokio::task::spawn_blocking(move || copy_dir_recursive(&output_dir, &dest_for_copy))
            .await
            .map_err(|e| PublishError::Io(std::io::Error::other(e)))?
            .map_err(|e| PublishError::Io(std::io::Error::other(e)))?;

        Ok(format!("{}/{site_id}/{build_id}/", self.base_url.trim_end_matches('/')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_publisher_copies_output_and_returns_url() {
        let tmp = tempfile::tempdir().unwrap();
        let output_dir = tmp.path().join("output");
        tokio::fs::create_dir_all(&output_dir).await.unwrap();
        tokio::fs::write(output_dir.join("index.html"), "<html></html>").await.unwrap();

        let publish_root = tmp.path().join("published");
        let publisher = LocalEdgePublisher::new(publish_root.clone(), "http://127.0.0.1:8787");

        let site_id = Uuid::new_v4();
        let build_id = Uuid::new_v4();
        let url = publisher.publish(site_id, build_id, &output_dir).await.unwrap();

        assert_eq!(url, format!("http://127.0.0.1:8787/{site_id}/{build_id}/"));
        assert!(publish_root.join(site_id.to_string()).join(build_id.to_string()).join("index.html").exists());
    }
}
