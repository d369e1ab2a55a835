//! Event system for tracking and reporting build progress (spec §6, C8).
//!
//! An `EventBus` is an in-process broadcaster for a single build; the
//! `registry` keys one bus per `(siteId, buildId)` so the HTTP layer can
//! look up the right stream for a given build's SSE connection.

// Sub-modules
pub mod bus;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod registry;
pub mod streaming;
pub mod types;

// Re-exports for public API
pub use bus::EventBus;
pub use config::EventBusConfig;
pub use errors::EventBusError;
pub use metrics::EventBusMetrics;
pub use registry::EventBusRegistry;
pub use streaming::FilteredReceiver;
pub use types::{
    BatchPublishResult, BuildEvent, EventMeta, LogEntry, LogLevel, Phase, Savings, ShutdownReason,
};
