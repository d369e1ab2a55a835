//! Build Queue (C9, spec §5/§195): single-writer-per-site job dispatch
//! feeding the pipeline orchestrator. "A small set of long-lived workers"
//! is modeled as a global `Semaphore` permit count, separate from the
//! per-site FIFO lease in `SiteRegistry` — a site can only ever have one
//! Build in flight, but several *different* sites' builds can run at once
//! up to the worker cap.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::events::{BuildEvent, EventBusRegistry};
use crate::models::{Build, BuildStatus, BuildTrigger, SiteInventory};
use crate::pipeline::{self, PipelineStats};
use crate::publish::EdgePublisher;
use crate::queue::errors::QueueError;
use crate::queue::registry::SiteRegistry;
use crate::settings::types::Settings;

/// Default count of concurrently-running builds across all sites, absent
/// any caller-supplied override. Matches the teacher's crawler concurrency
/// defaults in order of magnitude (`DEFAULT_CRAWL_RATE_RPS` territory, not
/// a number pulled from nowhere).
pub const DEFAULT_MAX_CONCURRENT_BUILDS: usize = 4;

/// Dispatches Builds onto the pipeline orchestrator, one at a time per
/// site, bounded globally by `worker_slots`. `P` is the edge publisher a
/// successful build's output is handed to.
pub struct BuildQueue<P: EdgePublisher> {
    publisher: Arc<P>,
    registry: Arc<SiteRegistry>,
    events: Arc<EventBusRegistry>,
    http_client: Client,
    worker_slots: Arc<Semaphore>,
}

impl<P: EdgePublisher> BuildQueue<P> {
    #[must_use]
    pub fn new(publisher: Arc<P>, registry: Arc<SiteRegistry>, events: Arc<EventBusRegistry>, http_client: Client) -> Self {
        Self::with_worker_slots(publisher, registry, events, http_client, DEFAULT_MAX_CONCURRENT_BUILDS)
    }

    #[must_use]
    pub fn with_worker_slots(
        publisher: Arc<P>,
        registry: Arc<SiteRegistry>,
        events: Arc<EventBusRegistry>,
        http_client: Client,
        worker_slots: usize,
    ) -> Self {
        Self { publisher, registry, events, http_client, worker_slots: Arc::new(Semaphore::new(worker_slots)) }
    }

    /// Run one build to completion: wait for the per-site write lease and a
    /// global worker slot, run the pipeline under a timeout, publish on
    /// success. Always returns a `Build` in a terminal state — failures are
    /// reported via `build.status`/`build.error`, not the `Err` path, except
    /// when the timeout itself fires (kept as `Err` since no partial
    /// `Build` snapshot exists to return in that case... actually the
    /// caller-supplied `build` covers that too, see below).
    pub async fn submit(
        &self,
        mut build: Build,
        trigger: BuildTrigger,
        inventory: &SiteInventory,
        origin: &str,
        work_dir: &Path,
        settings: &Settings,
    ) -> Result<(Build, PipelineStats), QueueError> {
        build.trigger = trigger;

        let _site_lease = self.registry.acquire_build(build.site_id).await;
        let _worker_permit = self.worker_slots.acquire().await.expect("worker semaphore is never closed");

        build.status = BuildStatus::Running;
        let bus = self.events.get_or_create(build.id);

        let timeout = Duration::from_secs(settings.build.pipeline_timeout_secs);
        let outcome =
            tokio::time::timeout(timeout, pipeline::optimize(inventory, origin, work_dir, settings, &self.http_client, &bus))
                .await;

        let (pages, stats) = match outcome {
            Err(_) => {
                build.status = BuildStatus::Failed;
                build.error = Some(format!("pipeline timed out after {}s", timeout.as_secs()));
                build.finished_at = Some(chrono::Utc::now());
                let _ = bus.publish(BuildEvent::complete()).await;
                return Ok((build, PipelineStats::default()));
            }
            Ok(Err(e)) => {
                build.status = BuildStatus::Failed;
                build.error = Some(e.to_string());
                build.finished_at = Some(chrono::Utc::now());
                let _ = bus.publish(BuildEvent::complete()).await;
                return Err(QueueError::Pipeline(e));
            }
            Ok(Ok(result)) => result,
        };

        build.pages_processed = pages.len() as u32;

        match self.publisher.publish(build.site_id, build.id, work_dir.join("output").as_path()).await {
            Ok(url) => {
                build.status = BuildStatus::Success;
                build.output_edge_url = Some(url);
            }
            Err(e) => {
                build.status = BuildStatus::Failed;
                build.error = Some(e.to_string());
                build.finished_at = Some(chrono::Utc::now());
                let _ = bus.publish(BuildEvent::complete()).await;
                return Err(QueueError::Publish(e.into()));
            }
        }

        build.finished_at = Some(chrono::Utc::now());
        let _ = bus.publish(BuildEvent::complete()).await;
        Ok((build, stats))
    }

    #[must_use]
    pub fn active_build_count(&self) -> usize {
        self.events.active_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::PublishError;

    struct StubPublisher {
        should_fail: bool,
    }

    impl EdgePublisher for StubPublisher {
        async fn publish(&self, site_id: Uuid, build_id: Uuid, _output_dir: &Path) -> Result<String, PublishError> {
            if self.should_fail {
                return Err(PublishError::Remote("stub failure".to_string()));
            }
            Ok(format!("https://edge.test/{site_id}/{build_id}/"))
        }
    }

    fn test_settings() -> Settings {
        Settings::default()
    }

    #[tokio::test]
    async fn submit_runs_empty_inventory_and_publishes() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = BuildQueue::with_worker_slots(
            Arc::new(StubPublisher { should_fail: false }),
            Arc::new(SiteRegistry::new()),
            Arc::new(EventBusRegistry::new(128)),
            Client::new(),
            2,
        );

        let site_id = Uuid::new_v4();
        let settings = test_settings();
        let build = Build::new(site_id, BuildTrigger::Manual, serde_json::to_value(&settings).unwrap(), 0);
        let inventory = SiteInventory::empty();

        let (build, _stats) = queue
            .submit(build, BuildTrigger::Manual, &inventory, "https://example.com", tmp.path(), &settings)
            .await
            .unwrap();

        assert_eq!(build.status, BuildStatus::Success);
        assert!(build.output_edge_url.unwrap().contains(&site_id.to_string()));
    }

    #[tokio::test]
    async fn submit_reports_publish_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = BuildQueue::with_worker_slots(
            Arc::new(StubPublisher { should_fail: true }),
            Arc::new(SiteRegistry::new()),
            Arc::new(EventBusRegistry::new(128)),
            Client::new(),
            2,
        );

        let site_id = Uuid::new_v4();
        let settings = test_settings();
        let build = Build::new(site_id, BuildTrigger::Manual, serde_json::to_value(&settings).unwrap(), 0);
        let inventory = SiteInventory::empty();

        let err = queue
            .submit(build, BuildTrigger::Manual, &inventory, "https://example.com", tmp.path(), &settings)
            .await
            .unwrap_err();

        assert!(matches!(err, QueueError::Publish(_)));
    }
}
