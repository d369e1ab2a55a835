//! Per-build event bus registry (spec §6, §9: "an in-process broadcaster
//! keyed by `(siteId, buildId)`").
//!
//! One `EventBus` per in-flight build, looked up by build id. Grounded on
//! the same lock-free `DashMap`-keyed-state pattern as
//! `crawler::domain_limiter`/`crawler::circuit_breaker`, just keyed by
//! build instead of domain.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::bus::EventBus;
use super::config::EventBusConfig;

/// Tracks one `EventBus` per active build.
///
/// Buses are created on first access and removed once the build finishes
/// and its final subscriber disconnects; a registry entry outliving its
/// build only wastes a bounded broadcast channel, never correctness.
#[derive(Debug, Default)]
pub struct EventBusRegistry {
    buses: DashMap<Uuid, Arc<EventBus>>,
    bus_capacity: usize,
}

impl EventBusRegistry {
    #[must_use]
    pub fn new(bus_capacity: usize) -> Self {
        Self {
            buses: DashMap::new(),
            bus_capacity,
        }
    }

    /// Get the bus for `build_id`, creating one if this is the first access.
    #[must_use]
    pub fn get_or_create(&self, build_id: Uuid) -> Arc<EventBus> {
        Arc::clone(
            self.buses
                .entry(build_id)
                .or_insert_with(|| {
                    Arc::new(EventBus::with_config(EventBusConfig {
                        capacity: self.bus_capacity,
                        ..Default::default()
                    }))
                })
                .value(),
        )
    }

    /// Look up an existing bus without creating one (used by the SSE route,
    /// which should 404 on an unknown build rather than silently opening a
    /// fresh empty bus for it).
    #[must_use]
    pub fn get(&self, build_id: Uuid) -> Option<Arc<EventBus>> {
        self.buses.get(&build_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Drop the bus for a finished build. Safe to call even if subscribers
    /// still hold a cloned `Arc<EventBus>` — they keep the channel alive
    /// for themselves, this just stops new lookups from finding it.
    pub fn remove(&self, build_id: Uuid) {
        self.buses.remove(&build_id);
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.buses.len()
    }
}
