//! Event type definitions for the build event system (spec §6).
//!
//! A build emits a `BuildEvent` at each phase transition and for every log
//! line; the HTTP control plane's SSE stream is the primary consumer
//! (`{phase}`, `{log: {...}}`, `{complete}` frames).

use serde::{Deserialize, Serialize};

/// Reason for event bus shutdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShutdownReason {
    /// Build completed successfully
    BuildCompleted,
    /// Build encountered an error
    Error(String),
    /// Build was cancelled by the user or the agent controller
    Cancelled,
}

/// Pipeline phase a log line or phase-transition event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Crawl,
    Images,
    Css,
    Js,
    Html,
    Fonts,
    Deploy,
    Measure,
}

/// Log severity, mirrors `tracing::Level` but kept as its own small enum so
/// the wire format doesn't depend on the tracing crate's representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Byte counts before/after a transform, for savings reporting in logs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Savings {
    pub before: u64,
    pub after: u64,
}

/// Optional structured detail attached to a log line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMeta {
    pub savings: Option<Savings>,
    pub duration_ms: Option<u64>,
    pub page_url: Option<String>,
    pub asset_url: Option<String>,
}

/// A single log entry as delivered to subscribers (spec §6 event payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub phase: Phase,
    pub message: String,
    pub meta: Option<EventMeta>,
}

/// Events published on a per-build event bus and fanned out to subscribers
/// (the SSE stream is the primary consumer; not further specified beyond
/// that contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BuildEvent {
    /// Emitted at every pipeline phase transition.
    Phase {
        phase: Phase,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// A structured log line within the current phase.
    Log(LogEntry),
    /// The build finished (successfully or not); summary counters live in
    /// the final `Log` lines, not here.
    Complete {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// Signals that the event bus is shutting down.
    ///
    /// Subscribers should exit their event loops when receiving this event.
    Shutdown {
        reason: ShutdownReason,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Result of publishing a batch of events
///
/// Provides detailed information about batch publication success/failure.
/// Unlike a Result type, this always represents successful execution of the
/// batch operation itself - the fields indicate how many individual events
/// succeeded or failed within the batch.
///
/// # Best-Effort Semantics
///
/// The event bus uses best-effort delivery. All events in the batch are attempted
/// regardless of individual failures. This struct transparently reports what happened
/// so callers can make informed decisions about partial success scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPublishResult {
    /// Total number of events in the batch
    pub total: usize,

    /// Number of events successfully published
    pub published: usize,

    /// Number of events that failed to publish (no active subscribers)
    pub failed: usize,

    /// Peak subscriber count observed during batch
    pub max_subscribers: usize,
}

impl BatchPublishResult {
    /// Check if all events were successfully published
    ///
    /// Returns true only if published == total and failed == 0
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.published == self.total && self.failed == 0
    }

    /// Check if any events failed to publish
    ///
    /// Returns true if failed > 0
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Calculate success rate as a percentage
    ///
    /// Returns 100.0 if total is 0 (empty batch), otherwise (published / total) * 100.0
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.published as f64 / self.total as f64) * 100.0
    }
}

/// Helper functions for creating common events
impl BuildEvent {
    /// Create a `Phase` transition event
    #[must_use]
    pub fn phase(phase: Phase) -> Self {
        Self::Phase {
            phase,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a plain informational log line for the given phase
    #[must_use]
    pub fn log(phase: Phase, level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log(LogEntry {
            timestamp: chrono::Utc::now(),
            level,
            phase,
            message: message.into(),
            meta: None,
        })
    }

    /// Create a log line carrying structured `meta` detail
    #[must_use]
    pub fn log_with_meta(
        phase: Phase,
        level: LogLevel,
        message: impl Into<String>,
        meta: EventMeta,
    ) -> Self {
        Self::Log(LogEntry {
            timestamp: chrono::Utc::now(),
            level,
            phase,
            message: message.into(),
            meta: Some(meta),
        })
    }

    /// Create a `Complete` event
    #[must_use]
    pub fn complete() -> Self {
        Self::Complete {
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a `Shutdown` event
    #[must_use]
    pub fn shutdown(reason: ShutdownReason) -> Self {
        Self::Shutdown {
            reason,
            timestamp: chrono::Utc::now(),
        }
    }
}
