//! Shared application state for the control plane (SPEC_FULL §6).
//!
//! `Site`/`Build` records are kept in-memory here rather than through
//! `CheckpointStore`, which spec.md's Non-goals deliberately scope to
//! "a checkpoint+history KV" for `AgentRun`s only (see DESIGN.md). A
//! clustered deployment would back `SiteDirectory` with the same relational
//! store the Non-goal defers, behind an unchanged `AppState` shape.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::agent::{AgentController, RemotePlanner, RemoteReviewer};
use crate::browser::ChromiumDriverPool;
use crate::engine_config::EngineConfig;
use crate::events::EventBusRegistry;
use crate::models::Site;
use crate::publish::LocalEdgePublisher;
use crate::queue::{BuildQueue, SiteRegistry};
use crate::store::JsonFileCheckpointStore;

/// The concrete `AgentController` instantiation the CLI's `serve` and
/// `agent` subcommands wire up: a real headless-browser pool, HTTP-backed
/// planner/reviewer, local-disk publishing, and JSON-file checkpoints.
pub type Engine = AgentController<ChromiumDriverPool, RemotePlanner, RemoteReviewer, LocalEdgePublisher, JsonFileCheckpointStore>;

/// In-memory directory of known sites, plus a pointer to each site's most
/// recent `AgentRun` id (there is no reverse index from site to run in
/// `CheckpointStore`, which is keyed purely by run id).
#[derive(Default)]
pub struct SiteDirectory {
    sites: DashMap<Uuid, Site>,
    latest_run: DashMap<Uuid, Uuid>,
}

impl SiteDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, site: Site) {
        self.sites.insert(site.id, site);
    }

    #[must_use]
    pub fn get(&self, site_id: Uuid) -> Option<Site> {
        self.sites.get(&site_id).map(|entry| entry.value().clone())
    }

    pub fn update(&self, site_id: Uuid, f: impl FnOnce(&mut Site)) -> bool {
        match self.sites.get_mut(&site_id) {
            Some(mut entry) => {
                f(&mut entry);
                true
            }
            None => false,
        }
    }

    pub fn record_run(&self, site_id: Uuid, run_id: Uuid) {
        self.latest_run.insert(site_id, run_id);
    }

    #[must_use]
    pub fn latest_run(&self, site_id: Uuid) -> Option<Uuid> {
        self.latest_run.get(&site_id).map(|entry| *entry.value())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sites: Arc<SiteDirectory>,
    pub registry: Arc<SiteRegistry>,
    pub queue: Arc<BuildQueue<LocalEdgePublisher>>,
    pub events: Arc<EventBusRegistry>,
    pub engine: Arc<Engine>,
    pub config: Arc<EngineConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_site_returns_none() {
        let dir = SiteDirectory::new();
        assert!(dir.get(Uuid::new_v4()).is_none());
        assert!(!dir.update(Uuid::new_v4(), |_| {}));
    }

    #[test]
    fn insert_then_get_round_trips() {
        let dir = SiteDirectory::new();
        let site = Site::new("https://example.com");
        let site_id = site.id;
        dir.insert(site);

        let fetched = dir.get(site_id).unwrap();
        assert_eq!(fetched.origin_url, "https://example.com");
    }

    #[test]
    fn update_mutates_the_stored_site() {
        let dir = SiteDirectory::new();
        let site = Site::new("https://example.com");
        let site_id = site.id;
        dir.insert(site);

        let updated = dir.update(site_id, |site| site.settings_overrides = serde_json::json!({"a": 1}));
        assert!(updated);
        assert_eq!(dir.get(site_id).unwrap().settings_overrides, serde_json::json!({"a": 1}));
    }

    #[test]
    fn latest_run_tracks_the_most_recent_record_run_call() {
        let dir = SiteDirectory::new();
        let site_id = Uuid::new_v4();
        assert!(dir.latest_run(site_id).is_none());

        let run_a = Uuid::new_v4();
        let run_b = Uuid::new_v4();
        dir.record_run(site_id, run_a);
        dir.record_run(site_id, run_b);

        assert_eq!(dir.latest_run(site_id), Some(run_b));
    }
}
