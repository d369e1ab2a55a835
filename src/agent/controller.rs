//! Agent Controller (C7, spec §4.7): the optimize-measure-iterate loop —
//! crawl once, plan once, then repeatedly build/verify/review until the
//! iteration-pass rule is met, the reviewer says stop, or `maxIterations`
//! is reached.
//!
//! Generic over the same external-collaborator traits the rest of the
//! crate models as narrow interfaces: `P: DriverPool` (browser capability,
//! shared with C2), `Pl: Planner`, `Rv: Reviewer`, `Ed: EdgePublisher`
//! (C9's collaborator), `St: CheckpointStore`.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use reqwest::Client;
use serde_json::Value;
use uuid::Uuid;

use crate::browser::DriverPool;
use crate::crawler::Crawler;
use crate::models::{AgentPhase, AgentRun, AgentRunStatus, Build, BuildStatus, BuildTrigger, IterationResult, SiteInventory};
use crate::publish::EdgePublisher;
use crate::queue::{BuildQueue, SiteRegistry};
use crate::settings::types::Settings;
use crate::settings::{merge_values, safer};
use crate::store::CheckpointStore;
use crate::verify::gate::{self, GateInputs};
use crate::verify::{functional, links, pagespeed, performance, visual};

use super::checkpoint;
use super::errors::AgentError;
use super::planner::Planner;
use super::reviewer::{ReviewVerdict, Reviewer};

/// Outbound link checks run with this much concurrency, matching the
/// crawler's own default per-domain politeness rather than firing
/// everything at once.
const LINK_CHECK_CONCURRENCY: usize = 8;
/// Total time budget for the SSL-readiness poll after a build publishes
/// (spec §4.7 step 4: "bounded poll, 2 min, non-fatal if not ready").
const SSL_READINESS_TOTAL_WAIT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalVerdict {
    Pass,
    Incomplete,
    Failed,
}

#[derive(Debug, Clone)]
pub struct AgentReport {
    pub run: AgentRun,
    pub verdict: FinalVerdict,
}

type VerifyOutputs =
    (Vec<visual::VisualResult>, Vec<functional::FunctionalResult>, Vec<performance::PerformanceResult>, Vec<links::LinkResult>, Vec<pagespeed::PageSpeedResult>);

/// Removes a run's abort flag once its loop exits, so `abort_flags` never
/// accumulates entries for finished runs.
struct AbortGuard<'a> {
    flags: &'a DashMap<Uuid, Arc<AtomicBool>>,
    run_id: Uuid,
}

impl Drop for AbortGuard<'_> {
    fn drop(&mut self) {
        self.flags.remove(&self.run_id);
    }
}

pub struct AgentController<P, Pl, Rv, Ed, St>
where
    P: DriverPool + 'static,
    Pl: Planner,
    Rv: Reviewer,
    Ed: EdgePublisher,
    St: CheckpointStore,
{
    crawler: Crawler<P>,
    driver_pool: Arc<P>,
    planner: Arc<Pl>,
    reviewer: Arc<Rv>,
    queue: Arc<BuildQueue<Ed>>,
    store: Arc<St>,
    registry: Arc<SiteRegistry>,
    http_client: Client,
    pagespeed_api_key: Option<String>,
    /// Abort flags keyed by run id (spec §5 "Cancellation": `stopAgent`
    /// sets a flag observed at phase boundaries and between iterations).
    abort_flags: DashMap<Uuid, Arc<AtomicBool>>,
}

impl<P, Pl, Rv, Ed, St> AgentController<P, Pl, Rv, Ed, St>
where
    P: DriverPool + 'static,
    Pl: Planner,
    Rv: Reviewer,
    Ed: EdgePublisher,
    St: CheckpointStore,
{
    #[must_use]
    pub fn new(
        driver_pool: Arc<P>,
        planner: Arc<Pl>,
        reviewer: Arc<Rv>,
        queue: Arc<BuildQueue<Ed>>,
        store: Arc<St>,
        registry: Arc<SiteRegistry>,
        pagespeed_api_key: Option<String>,
    ) -> Self {
        Self {
            crawler: Crawler::new(Arc::clone(&driver_pool)),
            driver_pool,
            planner,
            reviewer,
            queue,
            store,
            registry,
            http_client: Client::new(),
            pagespeed_api_key,
            abort_flags: DashMap::new(),
        }
    }

    /// Load a run's current checkpoint state, for the HTTP control
    /// plane's `GET /sites/{id}/agent` route.
    pub async fn load_run(&self, run_id: Uuid) -> Result<AgentRun, AgentError> {
        self.store.load(run_id).await.map_err(AgentError::Store)
    }

    /// Set the abort flag for `run_id` (spec §5 `stopAgent`). Returns
    /// `false` if no run with that id is currently tracked — callers that
    /// need "is this a real run" semantics should check `CheckpointStore`
    /// first; this call is intentionally fire-and-forget so a stop racing
    /// a run's own completion never errors.
    pub fn stop(&self, run_id: Uuid) -> bool {
        match self.abort_flags.get(&run_id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    fn aborted(&self, run_id: Uuid) -> bool {
        self.abort_flags.get(&run_id).map(|flag| flag.load(Ordering::SeqCst)).unwrap_or(false)
    }

    /// Start a fresh `AgentRun` for `site_id`. Rejected if a run is
    /// already active for this site (spec §5 single-writer discipline —
    /// "at most one AgentRun active... enforced by an in-process
    /// registry").
    pub async fn start(&self, site_id: Uuid, origin: String, work_dir: PathBuf, initial_settings: Value) -> Result<AgentReport, AgentError> {
        let _lease = self.registry.try_acquire_agent(site_id).ok_or(AgentError::AlreadyRunning { site_id })?;
        let run = AgentRun::new(site_id, work_dir, initial_settings);
        self.store.save(&run).await.map_err(AgentError::Store)?;
        self.run_loop(run, origin).await
    }

    /// Resume a failed run within its work-directory TTL (spec §4.7
    /// `resume(siteId, runId)`: "verifies workDir still exists, reinstates
    /// the last phase, and re-enters the loop at its next step").
    pub async fn resume(&self, run_id: Uuid, origin: String) -> Result<AgentReport, AgentError> {
        let run = self.store.load(run_id).await.map_err(AgentError::Store)?;
        if !run.work_dir.exists() {
            return Err(AgentError::WorkDirMissing(run.work_dir.clone()));
        }
        let _lease = self.registry.try_acquire_agent(run.site_id).ok_or(AgentError::AlreadyRunning { site_id: run.site_id })?;
        self.run_loop(run, origin).await
    }

    /// Same as `start`, but returns the new run's id as soon as the write
    /// lease is acquired and the initial checkpoint is queued, continuing
    /// the loop on a background task. This is what the HTTP control
    /// plane's `POST /sites/{id}/agent` route calls — the endpoint returns
    /// a `runId` immediately (spec §6), it does not block for the run's
    /// full duration.
    pub fn start_background(self: &Arc<Self>, site_id: Uuid, origin: String, work_dir: PathBuf, initial_settings: Value) -> Result<Uuid, AgentError>
    where
        P: Send + Sync,
        Pl: 'static,
        Rv: 'static,
        Ed: 'static,
        St: 'static,
    {
        let lease = self.registry.try_acquire_agent(site_id).ok_or(AgentError::AlreadyRunning { site_id })?;
        let run = AgentRun::new(site_id, work_dir, initial_settings);
        let run_id = run.id;
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _lease = lease;
            if let Err(e) = this.store.save(&run).await {
                tracing::error!(error = ?e, run_id = %run_id, "failed to persist initial agent run checkpoint");
                return;
            }
            match this.run_loop(run, origin).await {
                Ok(report) => tracing::info!(run_id = %run_id, verdict = ?report.verdict, "agent run finished"),
                Err(e) => tracing::error!(run_id = %run_id, error = ?e, "agent run failed"),
            }
        });
        Ok(run_id)
    }

    /// Background counterpart to `resume`, used by the `POST
    /// /sites/{id}/agent/{runId}/resume` route.
    pub async fn resume_background(self: &Arc<Self>, run_id: Uuid, origin: String) -> Result<(), AgentError>
    where
        P: Send + Sync,
        Pl: 'static,
        Rv: 'static,
        Ed: 'static,
        St: 'static,
    {
        let run = self.store.load(run_id).await.map_err(AgentError::Store)?;
        if !run.work_dir.exists() {
            return Err(AgentError::WorkDirMissing(run.work_dir.clone()));
        }
        let lease = self.registry.try_acquire_agent(run.site_id).ok_or(AgentError::AlreadyRunning { site_id: run.site_id })?;
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _lease = lease;
            match this.run_loop(run, origin).await {
                Ok(report) => tracing::info!(run_id = %run_id, verdict = ?report.verdict, "agent run resumed to completion"),
                Err(e) => tracing::error!(run_id = %run_id, error = ?e, "resumed agent run failed"),
            }
        });
        Ok(())
    }

    async fn run_loop(&self, mut run: AgentRun, origin: String) -> Result<AgentReport, AgentError> {
        self.abort_flags.insert(run.id, Arc::new(AtomicBool::new(false)));
        let _guard = AbortGuard { flags: &self.abort_flags, run_id: run.id };

        let max_iterations = self.current_typed_settings(&run)?.agent.max_iterations;

        // Spec §8: "maxIterations=0 -> agent completes in analyzing with
        // verdict incomplete".
        if max_iterations == 0 {
            run.status = AgentRunStatus::Completed;
            self.store.save(&run).await.map_err(AgentError::Store)?;
            return Ok(AgentReport { run, verdict: FinalVerdict::Incomplete });
        }

        loop {
            // Spec §5 "Cancellation": the abort flag is observed at phase
            // boundaries and between iterations, not mid-phase.
            if self.aborted(run.id) {
                run.status = AgentRunStatus::Aborted;
                self.store.save(&run).await.map_err(AgentError::Store)?;
                return Ok(AgentReport { run, verdict: FinalVerdict::Incomplete });
            }

            if run.iteration >= max_iterations {
                run.status = AgentRunStatus::Completed;
                self.store.save(&run).await.map_err(AgentError::Store)?;
                return Ok(AgentReport { run, verdict: FinalVerdict::Incomplete });
            }

            match self.run_iteration(&mut run, &origin).await {
                Ok(Some(verdict)) => {
                    run.status = AgentRunStatus::Completed;
                    self.store.save(&run).await.map_err(AgentError::Store)?;
                    return Ok(AgentReport { run, verdict });
                }
                Ok(None) => {
                    run.iteration += 1;
                    self.store.save(&run).await.map_err(AgentError::Store)?;
                }
                Err(e) => {
                    // Spec §4.7 step 8: merge the safer-settings patch,
                    // log the error, advance iteration, loop unless maxed.
                    checkpoint::push_log(&mut run, format!("iteration {} failed: {e}", run.iteration));
                    run.checkpoint.current_settings = safer::apply(&run.checkpoint.current_settings);
                    run.iteration += 1;
                    run.last_error = Some(e.to_string());

                    if run.iteration >= max_iterations {
                        run.fail(e.to_string());
                        self.store.save(&run).await.map_err(AgentError::Store)?;
                        return Ok(AgentReport { run, verdict: FinalVerdict::Failed });
                    }
                    self.store.save(&run).await.map_err(AgentError::Store)?;
                }
            }
        }
    }

    fn current_typed_settings(&self, run: &AgentRun) -> Result<Settings, AgentError> {
        serde_json::from_value(run.checkpoint.current_settings.clone()).map_err(AgentError::SettingsShape)
    }

    /// Run one iteration body. `Ok(Some(verdict))` finalizes the run;
    /// `Ok(None)` means loop again; `Err` is a per-iteration failure that
    /// `run_loop` recovers from with the safer-settings fallback.
    async fn run_iteration(&self, run: &mut AgentRun, origin: &str) -> Result<Option<FinalVerdict>, AgentError> {
        let mut phase_started_at = Instant::now();

        // Spec §4.7 steps 1-2: crawl + plan run once, on the first
        // iteration only. Later iterations rebuild straight from the
        // reviewer's merged settings (state_machine: Reviewing -> Building).
        if run.iteration == 0 {
            let settings = self.current_typed_settings(run)?;
            let inventory = self.crawler.crawl(origin, &settings, &run.work_dir).await.map_err(AgentError::Crawl)?;
            let page_count = inventory.pages.len();
            run.checkpoint.inventory = Some(inventory);
            checkpoint::push_log(run, format!("crawled {page_count} page(s)"));

            if settings.verify.pagespeed_enabled {
                if let Ok(result) = pagespeed::fetch(&self.http_client, "/", origin, self.pagespeed_api_key.as_deref()).await {
                    run.checkpoint.pagespeed_snapshot = serde_json::to_value(&result).ok();
                }
            }

            phase_started_at = checkpoint::advance_phase_timed(run, AgentPhase::Planning, phase_started_at);
            self.store.save(run).await.map_err(AgentError::Store)?;

            let inventory_ref = run.checkpoint.inventory.as_ref().ok_or(AgentError::MissingInventory)?;
            let suggestion = self
                .planner
                .plan(inventory_ref, run.checkpoint.pagespeed_snapshot.as_ref(), &run.checkpoint.current_settings)
                .await
                .map_err(AgentError::Planner)?;

            run.checkpoint.plan = Some(suggestion.settings_patch.clone());
            run.checkpoint.current_settings = merge_values(&run.checkpoint.current_settings, &suggestion.settings_patch);
            checkpoint::push_log(run, format!("planner: {}", suggestion.rationale));
        }

        let inventory = run.checkpoint.inventory.clone().ok_or(AgentError::MissingInventory)?;

        phase_started_at = checkpoint::advance_phase_timed(run, AgentPhase::Building, phase_started_at);
        self.store.save(run).await.map_err(AgentError::Store)?;

        let typed_settings = self.current_typed_settings(run)?;
        let build = Build::new(
            run.site_id,
            BuildTrigger::AgentIteration { agent_run_id: run.id },
            run.checkpoint.current_settings.clone(),
            inventory.pages.len() as u32,
        );
        let (build, _stats) = self
            .queue
            .submit(build, BuildTrigger::AgentIteration { agent_run_id: run.id }, &inventory, origin, &run.work_dir, &typed_settings)
            .await
            .map_err(AgentError::Queue)?;

        if build.status != BuildStatus::Success {
            return Err(AgentError::BuildFailed(build.error.unwrap_or_else(|| "unknown pipeline failure".to_string())));
        }

        phase_started_at = checkpoint::advance_phase_timed(run, AgentPhase::Verifying, phase_started_at);
        self.store.save(run).await.map_err(AgentError::Store)?;

        let edge_url = build.output_edge_url.clone().unwrap_or_default();
        self.wait_for_ssl_ready(&edge_url, typed_settings.agent.ssl_readiness_poll_secs).await;

        let (visual_results, functional_results, performance_results, link_results, pagespeed_results) =
            self.verify_all_pages(&inventory, &edge_url, &typed_settings).await?;

        phase_started_at = checkpoint::advance_phase_timed(run, AgentPhase::Measuring, phase_started_at);

        let gate_inputs = GateInputs {
            visual: &visual_results,
            functional: &functional_results,
            links: &link_results,
            performance: &performance_results,
            pagespeed: &pagespeed_results,
        };
        let gate_report = gate::evaluate(&gate_inputs, &typed_settings.verify);
        checkpoint::push_log(run, format!("verify gate: {:?} ({})", gate_report.verdict, gate_report.reasons.join("; ")));

        checkpoint::advance_phase_timed(run, AgentPhase::Reviewing, phase_started_at);
        self.store.save(run).await.map_err(AgentError::Store)?;

        let iteration_result = IterationResult {
            iteration: run.iteration,
            settings_snapshot: run.checkpoint.current_settings.clone(),
            build_id: Some(build.id),
            edge_url: build.output_edge_url.clone(),
            visual_results: visual_results.iter().map(|v| format!("{}: {:?} ({:.3})", v.url_path, v.verdict, v.diff_ratio)).collect(),
            functional_results: functional_results.iter().map(|f| f.description.clone()).collect(),
            link_results: link_results.iter().map(|l| l.url.clone()).collect(),
            performance_results: performance_results.iter().map(|p| format!("{}: {:.1}", p.url_path, p.score)).collect(),
            pagespeed_scores: pagespeed_results.into_iter().map(|p| (p.url_path, p.composite)).collect(),
        };

        if gate_report.verdict.passed() {
            checkpoint::record_iteration(run, iteration_result);
            return Ok(Some(FinalVerdict::Pass));
        }

        let review = self.reviewer.review(&iteration_result, &run.checkpoint.iteration_history).await.map_err(AgentError::Reviewer)?;
        checkpoint::record_iteration(run, iteration_result);

        if !review.should_rebuild {
            return Ok(Some(Self::verdict_from_review(&review)));
        }

        run.checkpoint.current_settings = merge_values(&run.checkpoint.current_settings, &review.setting_changes);
        Ok(None)
    }

    async fn verify_all_pages(&self, inventory: &SiteInventory, edge_url: &str, settings: &Settings) -> Result<VerifyOutputs, AgentError> {
        let driver = self.driver_pool.acquire().await.map_err(AgentError::DriverUnavailable)?;
        let settle_after = Duration::from_millis(settings.build.crawl_wait_ms);
        let load_timeout = Duration::from_secs(settings.build.page_load_timeout_secs);

        let mut visual_results = Vec::new();
        let mut functional_results = Vec::new();
        let mut performance_results = Vec::new();
        let mut link_results = Vec::new();
        let mut pagespeed_results = Vec::new();

        for page in &inventory.pages {
            let page_url = format!("{}{}", edge_url.trim_end_matches('/'), page.url_path);

            if let Ok(v) = visual::verify_page(&driver, &page.url_path, &page_url, &page.screenshot, settle_after, load_timeout).await {
                visual_results.push(v);
            }
            functional_results.extend(functional::verify_page(&driver, &page.baseline_behaviors).await);
            if let Ok(p) = performance::verify_page(&driver, &page.url_path, &page_url, settle_after, load_timeout).await {
                performance_results.push(p);
            }

            let page_links = links::extract_links(&page.raw_html);
            link_results.extend(links::verify_links(&self.http_client, &page_links, LINK_CHECK_CONCURRENCY).await);

            if settings.verify.pagespeed_enabled {
                if let Ok(ps) = pagespeed::fetch(&self.http_client, &page.url_path, &page_url, self.pagespeed_api_key.as_deref()).await {
                    pagespeed_results.push(ps);
                }
            }
        }

        Ok((visual_results, functional_results, performance_results, link_results, pagespeed_results))
    }

    /// Poll `edge_url` until it answers successfully, up to
    /// `SSL_READINESS_TOTAL_WAIT`. Never fails the iteration — the build
    /// has already succeeded; a not-yet-ready edge just means the
    /// verifier's probes will hit it while it's still warming up.
    async fn wait_for_ssl_ready(&self, edge_url: &str, poll_secs: u64) {
        if edge_url.is_empty() {
            return;
        }
        let deadline = Instant::now() + SSL_READINESS_TOTAL_WAIT;
        let poll_interval = Duration::from_secs(poll_secs.max(1));

        loop {
            let ready = self.http_client.head(edge_url).send().await.map(|r| r.status().is_success()).unwrap_or(false);
            if ready || Instant::now() >= deadline {
                return;
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    fn verdict_from_review(review: &ReviewVerdict) -> FinalVerdict {
        match review.overall_verdict.to_lowercase().as_str() {
            "pass" => FinalVerdict::Pass,
            "failed" | "fail" => FinalVerdict::Failed,
            _ => FinalVerdict::Incomplete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowsingDriver;
    use crate::publish::PublishError;
    use crate::store::JsonFileCheckpointStore;
    use serde_json::json;
    use std::path::Path;

    /// Never actually driven in these tests — `run_loop` short-circuits
    /// before anything touches the browser, planner, reviewer, or queue
    /// when `maxIterations == 0`.
    struct UnusedDriver;

    impl BrowsingDriver for UnusedDriver {
        async fn navigate(&self, _url: &str, _load_timeout: Duration) -> anyhow::Result<()> {
            unreachable!("not driven in this test")
        }
        async fn settle(&self, _wait_for: Duration) {
            unreachable!("not driven in this test")
        }
        async fn capture_html(&self) -> anyhow::Result<String> {
            unreachable!("not driven in this test")
        }
        async fn capture_screenshot(&self) -> anyhow::Result<Vec<u8>> {
            unreachable!("not driven in this test")
        }
        async fn evaluate_json(&self, _script: &str) -> anyhow::Result<Value> {
            unreachable!("not driven in this test")
        }
        async fn current_url(&self) -> anyhow::Result<String> {
            unreachable!("not driven in this test")
        }
    }

    struct UnusedDriverPool;

    impl DriverPool for UnusedDriverPool {
        type Driver = UnusedDriver;
        async fn acquire(&self) -> anyhow::Result<Self::Driver> {
            unreachable!("not driven in this test")
        }
    }

    struct UnusedPlanner;

    impl Planner for UnusedPlanner {
        async fn plan(&self, _inventory: &SiteInventory, _pagespeed_snapshot: Option<&Value>, _current_settings: &Value) -> anyhow::Result<super::super::planner::PlannerSuggestion> {
            unreachable!("not driven in this test")
        }
    }

    struct UnusedReviewer;

    impl Reviewer for UnusedReviewer {
        async fn review(&self, _latest: &IterationResult, _history: &[IterationResult]) -> anyhow::Result<ReviewVerdict> {
            unreachable!("not driven in this test")
        }
    }

    struct UnusedPublisher;

    impl EdgePublisher for UnusedPublisher {
        async fn publish(&self, _site_id: Uuid, _build_id: Uuid, _output_dir: &Path) -> Result<String, PublishError> {
            unreachable!("not driven in this test")
        }
    }

    fn settings_with_max_iterations(max_iterations: u32) -> Value {
        let mut settings = serde_json::to_value(Settings::default()).unwrap();
        settings["agent"]["maxIterations"] = json!(max_iterations);
        settings
    }

    fn test_controller(
        tmp: &tempfile::TempDir,
    ) -> AgentController<UnusedDriverPool, UnusedPlanner, UnusedReviewer, UnusedPublisher, JsonFileCheckpointStore> {
        AgentController::new(
            Arc::new(UnusedDriverPool),
            Arc::new(UnusedPlanner),
            Arc::new(UnusedReviewer),
            Arc::new(BuildQueue::new(
                Arc::new(UnusedPublisher),
                Arc::new(SiteRegistry::new()),
                Arc::new(crate::events::EventBusRegistry::new(128)),
                Client::new(),
            )),
            Arc::new(JsonFileCheckpointStore::new(tmp.path().to_path_buf())),
            Arc::new(SiteRegistry::new()),
            None,
        )
    }

    #[tokio::test]
    async fn zero_max_iterations_completes_as_incomplete_without_crawling() {
        let tmp = tempfile::tempdir().unwrap();
        let controller = test_controller(&tmp);

        let report = controller
            .start(Uuid::new_v4(), "https://example.com".to_string(), tmp.path().to_path_buf(), settings_with_max_iterations(0))
            .await
            .unwrap();

        assert_eq!(report.verdict, FinalVerdict::Incomplete);
        assert_eq!(report.run.status, AgentRunStatus::Completed);
        assert_eq!(report.run.iteration, 0);
    }

    #[tokio::test]
    async fn concurrent_start_for_the_same_site_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = Arc::new(SiteRegistry::new());
        let site_id = Uuid::new_v4();
        let _lease = registry.try_acquire_agent(site_id).unwrap();

        let controller = AgentController::new(
            Arc::new(UnusedDriverPool),
            Arc::new(UnusedPlanner),
            Arc::new(UnusedReviewer),
            Arc::new(BuildQueue::new(
                Arc::new(UnusedPublisher),
                Arc::new(SiteRegistry::new()),
                Arc::new(crate::events::EventBusRegistry::new(128)),
                Client::new(),
            )),
            Arc::new(JsonFileCheckpointStore::new(tmp.path().to_path_buf())),
            Arc::clone(&registry),
            None,
        );

        let err = controller
            .start(site_id, "https://example.com".to_string(), tmp.path().to_path_buf(), settings_with_max_iterations(0))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::AlreadyRunning { .. }));
    }

    #[test]
    fn stop_on_unknown_run_returns_false() {
        let tmp = tempfile::tempdir().unwrap();
        let controller = test_controller(&tmp);
        assert!(!controller.stop(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn start_background_returns_immediately_and_releases_the_lease_on_completion() {
        let tmp = tempfile::tempdir().unwrap();
        let controller = Arc::new(test_controller(&tmp));
        let site_id = Uuid::new_v4();

        let run_id = controller
            .start_background(site_id, "https://example.com".to_string(), tmp.path().to_path_buf(), settings_with_max_iterations(0))
            .unwrap();

        for _ in 0..100 {
            if let Ok(run) = controller.load_run(run_id).await {
                if run.status == AgentRunStatus::Completed {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let run = controller.load_run(run_id).await.unwrap();
        assert_eq!(run.status, AgentRunStatus::Completed);

        // The lease must have been released, or this would return
        // `AlreadyRunning`.
        let second = controller
            .start_background(site_id, "https://example.com".to_string(), tmp.path().to_path_buf(), settings_with_max_iterations(0))
            .unwrap();
        assert_ne!(second, run_id);
    }
}
