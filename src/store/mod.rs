//! Checkpoint/history store boundary (spec §1 Non-goals: "the relational
//! store \[is\] treated as a checkpoint+history KV, not re-specified").
//!
//! `CheckpointStore` is the narrow external-collaborator trait the agent
//! controller (C7) persists `AgentRun` state through after every phase
//! (spec §4.7 "Checkpointing"). `JsonFileCheckpointStore` is the one
//! concrete implementation this crate ships, grounded on
//! `content_saver::json_saver::save_json_data`'s
//! serialize-in-`spawn_blocking`-then-write shape, keyed by run id instead
//! of URL-mirrored path. A real deployment swaps in a Postgres- or
//! Redis-backed store behind the same trait without touching C7.

pub mod errors;

pub use errors::StoreError;

use std::path::PathBuf;

use uuid::Uuid;

use crate::models::AgentRun;

/// Persist and retrieve `AgentRun` checkpoints, keyed by run id.
pub trait CheckpointStore: Send + Sync {
    fn save(&self, run: &AgentRun) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn load(&self, run_id: Uuid) -> impl Future<Output = Result<AgentRun, StoreError>> + Send;
    fn delete(&self, run_id: Uuid) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// One JSON file per run under `root/<run_id>.json`. Simple and durable
/// enough for the single-node deployment this crate targets; a clustered
/// deployment would implement `CheckpointStore` against a real KV instead.
pub struct JsonFileCheckpointStore {
    root: PathBuf,
}

impl JsonFileCheckpointStore {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, run_id: Uuid) -> PathBuf {
        self.root.join(format!("{run_id}.json"))
    }
}

impl CheckpointStore for JsonFileCheckpointStore {
    async fn save(&self, run: &AgentRun) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(StoreError::Io)?;
        let path = self.path_for(run.id);
        let run = run.clone();
        let json = tokio::task::spawn_blocking(move || serde_json::to_vec_pretty(&run))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
            .map_err(StoreError::Serde)?;
        tokio::fs::write(&path, json).await.map_err(StoreError::Io)
    }

    async fn load(&self, run_id: Uuid) -> Result<AgentRun, StoreError> {
        let path = self.path_for(run_id);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound { StoreError::NotFound { run_id } } else { StoreError::Io(e) }
        })?;
        tokio::task::spawn_blocking(move || serde_json::from_slice(&bytes))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
            .map_err(StoreError::Serde)
    }

    async fn delete(&self, run_id: Uuid) -> Result<(), StoreError> {
        let path = self.path_for(run_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_run() -> AgentRun {
        AgentRun::new(Uuid::new_v4(), PathBuf::from("/tmp/work"), json!({"css": {"purge": true}}))
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileCheckpointStore::new(tmp.path().to_path_buf());
        let run = sample_run();

        store.save(&run).await.unwrap();
        let loaded = store.load(run.id).await.unwrap();

        assert_eq!(loaded.id, run.id);
        assert_eq!(loaded.site_id, run.site_id);
        assert_eq!(loaded.checkpoint.current_settings, run.checkpoint.current_settings);
    }

    #[tokio::test]
    async fn load_missing_run_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileCheckpointStore::new(tmp.path().to_path_buf());
        let err = store.load(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_removes_checkpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileCheckpointStore::new(tmp.path().to_path_buf());
        let run = sample_run();
        store.save(&run).await.unwrap();

        store.delete(run.id).await.unwrap();
        assert!(matches!(store.load(run.id).await.unwrap_err(), StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_of_unknown_run_is_a_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileCheckpointStore::new(tmp.path().to_path_buf());
        store.delete(Uuid::new_v4()).await.unwrap();
    }
}
