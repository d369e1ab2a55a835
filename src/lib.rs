#![feature(integer_atomics)]

pub mod agent;
pub mod browser;
pub mod config;
pub mod content_saver;
pub mod crawler;
pub mod engine_config;
pub mod events;
pub mod html_rewrite;
pub mod http;
pub mod imurl;
pub mod inline_css;
pub mod models;
pub mod page_extractor;
pub mod pipeline;
pub mod publish;
pub mod queue;
pub mod runtime;
pub mod settings;
pub mod store;
pub mod transform;
pub mod utils;
pub mod verify;

pub use agent::{
    AgentController, AgentError, AgentReport, FinalVerdict, Planner, PlannerSuggestion, RemotePlanner, RemoteReviewer, ReviewVerdict,
    Reviewer,
};
pub use crawler::{Crawler, CrawlError};
pub use engine_config::EngineConfig;
pub use events::{BuildEvent, EventBus, EventBusRegistry, Phase as EventPhase};
pub use imurl::ImUrl;
pub use models::{Asset, AssetRename, AssetVariant, MimeClass};
pub use models::{Build, BuildStatus, BuildTrigger};
pub use models::{BaselineBehavior, CrawledPage, InteractiveElement};
pub use models::{AgentPhase, AgentRun, AgentRunStatus, Checkpoint, IterationResult};
pub use models::{Site, SiteInventory};
pub use pipeline::{PipelineStats, optimize};
pub use publish::{EdgePublisher, LocalEdgePublisher, PublishError};
pub use queue::{BuildQueue, QueueError, SiteRegistry};
pub use settings::{Settings, SettingsError, ValidationIssue, diff, merge_values, resolve};
pub use store::{CheckpointStore, JsonFileCheckpointStore, StoreError};

/// Macro for handling streaming data chunks with safe unwrapping
#[macro_export]
macro_rules! on_chunk {
    ($closure:expr) => {
        move |chunk| match chunk {
            Ok(data) => $closure(data),
            Err(e) => {
                tracing::warn!(error = ?e, "Chunk processing error");
            }
        }
    };
}

/// Macro for handling errors with safe unwrapping
#[macro_export]
macro_rules! on_error {
    ($closure:expr) => {
        move |error| match error {
            Some(e) => $closure(e),
            None => {
                tracing::error!("Unknown error occurred in event handler");
            }
        }
    };
}
