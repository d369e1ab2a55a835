//! `pageforge` CLI (SPEC_FULL §2 `[AMBIENT]`): a thin `clap`-derived
//! wrapper exposing `crawl`, `build`, `agent run/resume/stop`, and `serve`
//! over the library's components, returning the exit codes in spec §6.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use reqwest::Client;
use uuid::Uuid;

use pageforge::browser::{BrowserPool, BrowserPoolConfig, ChromiumDriverPool};
use pageforge::engine_config::EngineConfig;
use pageforge::http::state::{AppState, SiteDirectory};
use pageforge::models::{Build, BuildStatus, BuildTrigger, Site};
use pageforge::publish::LocalEdgePublisher;
use pageforge::queue::{BuildQueue, SiteRegistry};
use pageforge::settings::Settings;
use pageforge::store::JsonFileCheckpointStore;
use pageforge::{AgentController, Crawler, EventBusRegistry, FinalVerdict, RemotePlanner, RemoteReviewer};

// Validation errors (spec §6 exit code 2) surface as `clap`'s own parse
// failures, which already exit with code 2 before `main` is ever reached.
/// Build failure.
const EXIT_BUILD_FAILURE: u8 = 3;
/// Verification failure.
const EXIT_VERIFY_FAILURE: u8 = 4;
/// Run was aborted.
const EXIT_ABORTED: u8 = 5;
/// Anything else.
const EXIT_OTHER: u8 = 1;

#[derive(Parser)]
#[command(name = "pageforge", about = "Autonomous website performance optimization engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl a live origin and write its inventory under `--work-dir`.
    Crawl {
        origin: String,
        #[arg(long)]
        work_dir: PathBuf,
    },
    /// Run the optimization pipeline once against a previously-crawled
    /// inventory and publish the result.
    Build {
        origin: String,
        #[arg(long)]
        work_dir: PathBuf,
    },
    /// Agent-controller subcommands.
    Agent {
        #[command(subcommand)]
        action: AgentCommand,
    },
    /// Start the control-plane HTTP server.
    Serve,
}

#[derive(Subcommand)]
enum AgentCommand {
    /// Start a fresh autonomous optimize-measure-iterate run.
    Run {
        origin: String,
        #[arg(long)]
        work_dir: PathBuf,
    },
    /// Resume a failed run.
    Resume { run_id: Uuid, origin: String },
    /// Stop a run on a running `serve` instance, over HTTP.
    Stop {
        run_id: Uuid,
        site_id: Uuid,
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        api_url: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = Arc::new(EngineConfig::from_env());

    match run(cli.command, config).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = ?e, "command failed");
            ExitCode::from(EXIT_OTHER)
        }
    }
}

async fn build_driver_pool() -> anyhow::Result<Arc<ChromiumDriverPool>> {
    let browser_pool = BrowserPool::new(BrowserPoolConfig::default());
    Ok(Arc::new(ChromiumDriverPool::new(browser_pool)))
}

async fn run(command: Command, config: Arc<EngineConfig>) -> anyhow::Result<u8> {
    match command {
        Command::Crawl { origin, work_dir } => cmd_crawl(&origin, &work_dir).await,
        Command::Build { origin, work_dir } => cmd_build(&origin, &work_dir, &config).await,
        Command::Agent { action } => cmd_agent(action, &config).await,
        Command::Serve => cmd_serve(config).await,
    }
}

async fn cmd_crawl(origin: &str, work_dir: &PathBuf) -> anyhow::Result<u8> {
    let driver_pool = build_driver_pool().await?;
    let crawler = Crawler::new(driver_pool);
    let settings = Settings::default();

    let inventory = crawler.crawl(origin, &settings, work_dir).await?;
    tokio::fs::create_dir_all(work_dir).await?;
    let bytes = serde_json::to_vec_pretty(&inventory)?;
    tokio::fs::write(work_dir.join("inventory.json"), bytes).await?;

    tracing::info!(pages = inventory.page_count(), "crawl complete");
    Ok(0)
}

async fn cmd_build(origin: &str, work_dir: &PathBuf, config: &EngineConfig) -> anyhow::Result<u8> {
    let bytes = tokio::fs::read(work_dir.join("inventory.json")).await?;
    let inventory = serde_json::from_slice(&bytes)?;

    let settings = Settings::default();
    let publisher = Arc::new(LocalEdgePublisher::new(config.publish_root.clone(), config.publish_base_url.clone()));
    let registry = Arc::new(SiteRegistry::new());
    let events = Arc::new(EventBusRegistry::new(config.event_bus_capacity));
    let queue = BuildQueue::with_worker_slots(publisher, registry, events, Client::new(), config.max_concurrent_builds);

    let site_id = Uuid::new_v4();
    let resolved = serde_json::to_value(&settings)?;
    let build = Build::new(site_id, BuildTrigger::Manual, resolved.clone(), inventory.page_count() as u32);
    let settings_typed: Settings = serde_json::from_value(resolved)?;

    let (build, stats) = queue.submit(build, BuildTrigger::Manual, &inventory, origin, work_dir, &settings_typed).await?;

    tracing::info!(?stats, edge_url = ?build.output_edge_url, "build complete");
    Ok(if build.status == BuildStatus::Success { 0 } else { EXIT_BUILD_FAILURE })
}

/// Build the `AgentController`, sharing the caller's `SiteRegistry`/`BuildQueue`
/// rather than constructing private ones — `serve` and any direct build
/// route need to see the same single-writer leases the agent loop does.
fn make_engine(
    config: &EngineConfig,
    driver_pool: Arc<ChromiumDriverPool>,
    queue: Arc<BuildQueue<LocalEdgePublisher>>,
    registry: Arc<SiteRegistry>,
) -> anyhow::Result<Arc<pageforge::http::state::Engine>> {
    let client = Client::new();
    let planner_url = std::env::var("PAGEFORGE_PLANNER_URL").unwrap_or_else(|_| "http://127.0.0.1:9001/plan".to_string());
    let reviewer_url = std::env::var("PAGEFORGE_REVIEWER_URL").unwrap_or_else(|_| "http://127.0.0.1:9001/review".to_string());

    let planner = Arc::new(RemotePlanner::new(client.clone(), planner_url));
    let reviewer = Arc::new(RemoteReviewer::new(client, reviewer_url));
    let store = Arc::new(JsonFileCheckpointStore::new(config.work_dir_root.join("checkpoints")));

    Ok(Arc::new(AgentController::new(driver_pool, planner, reviewer, queue, store, registry, config.pagespeed_api_key.clone())))
}

fn standalone_queue(config: &EngineConfig) -> (Arc<BuildQueue<LocalEdgePublisher>>, Arc<SiteRegistry>, Arc<EventBusRegistry>) {
    let publisher = Arc::new(LocalEdgePublisher::new(config.publish_root.clone(), config.publish_base_url.clone()));
    let registry = Arc::new(SiteRegistry::new());
    let events = Arc::new(EventBusRegistry::new(config.event_bus_capacity));
    let queue =
        Arc::new(BuildQueue::with_worker_slots(publisher, Arc::clone(&registry), Arc::clone(&events), Client::new(), config.max_concurrent_builds));
    (queue, registry, events)
}

async fn cmd_agent(action: AgentCommand, config: &EngineConfig) -> anyhow::Result<u8> {
    match action {
        AgentCommand::Run { origin, work_dir } => {
            let driver_pool = build_driver_pool().await?;
            let (queue, registry, _events) = standalone_queue(config);
            let engine = make_engine(config, driver_pool, queue, registry)?;
            let site_id = Uuid::new_v4();
            let initial_settings = Settings::default_value();

            let report = engine.start(site_id, origin, work_dir, initial_settings).await?;
            tracing::info!(run_id = %report.run.id, verdict = ?report.verdict, "agent run finished");

            Ok(match (report.run.status, report.verdict) {
                (pageforge::AgentRunStatus::Aborted, _) => EXIT_ABORTED,
                (_, FinalVerdict::Pass) => 0,
                (_, FinalVerdict::Failed) => EXIT_BUILD_FAILURE,
                (_, FinalVerdict::Incomplete) => EXIT_VERIFY_FAILURE,
            })
        }
        AgentCommand::Resume { run_id, origin } => {
            let driver_pool = build_driver_pool().await?;
            let (queue, registry, _events) = standalone_queue(config);
            let engine = make_engine(config, driver_pool, queue, registry)?;
            let report = engine.resume(run_id, origin).await?;
            tracing::info!(run_id = %report.run.id, verdict = ?report.verdict, "agent run resumed to completion");

            Ok(match (report.run.status, report.verdict) {
                (pageforge::AgentRunStatus::Aborted, _) => EXIT_ABORTED,
                (_, FinalVerdict::Pass) => 0,
                (_, FinalVerdict::Failed) => EXIT_BUILD_FAILURE,
                (_, FinalVerdict::Incomplete) => EXIT_VERIFY_FAILURE,
            })
        }
        AgentCommand::Stop { run_id, site_id, api_url } => {
            let client = Client::new();
            let url = format!("{}/sites/{site_id}/agent/{run_id}/stop", api_url.trim_end_matches('/'));
            let response = client.post(&url).send().await?;
            if response.status().is_success() {
                Ok(0)
            } else {
                tracing::error!(status = %response.status(), "stop request rejected");
                Ok(EXIT_OTHER)
            }
        }
    }
}

async fn cmd_serve(config: Arc<EngineConfig>) -> anyhow::Result<u8> {
    let driver_pool = build_driver_pool().await?;
    let (queue, registry, events) = standalone_queue(&config);
    let engine = make_engine(&config, driver_pool, Arc::clone(&queue), Arc::clone(&registry))?;

    let state = AppState { sites: Arc::new(SiteDirectory::new()), registry, queue, events, engine, config };

    pageforge::http::serve(state).await?;
    Ok(0)
}

#[allow(dead_code)]
fn new_site(origin_url: impl Into<String>) -> Site {
    Site::new(origin_url)
}
