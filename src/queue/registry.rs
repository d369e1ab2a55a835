//! Single-writer-per-site discipline (spec §5): at most one Build running
//! and at most one AgentRun active per site, each backed by a per-site
//! one-permit semaphore.
//!
//! Grounded on `crawler::domain_limiter::DomainLimiter`'s lock-free
//! `DashMap<key, Arc<Semaphore>>` shape. Builds and agent runs need
//! opposite acquire semantics, so each gets its own method: a second Build
//! for a busy site should queue FIFO behind the first (spec §5 "FIFO per
//! site"), which is exactly what `Semaphore::acquire_owned` already gives
//! for free; a second `AgentRun` for a busy site should be rejected
//! outright, which needs `try_acquire_owned`.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore, TryAcquireError};
use uuid::Uuid;

/// Holding this permit means "I am the active build/agent-run writer for
/// this site"; dropping it releases the slot for the next caller.
pub struct WriterLease(#[allow(dead_code)] OwnedSemaphorePermit);

#[derive(Debug, Default)]
pub struct SiteRegistry {
    build_locks: DashMap<Uuid, Arc<Semaphore>>,
    agent_locks: DashMap<Uuid, Arc<Semaphore>>,
}

impl SiteRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { build_locks: DashMap::new(), agent_locks: DashMap::new() }
    }

    fn semaphore_for(locks: &DashMap<Uuid, Arc<Semaphore>>, site_id: Uuid) -> Arc<Semaphore> {
        Arc::clone(locks.entry(site_id).or_insert_with(|| Arc::new(Semaphore::new(1))).value())
    }

    /// Wait in FIFO order to become the active Build writer for `site_id`.
    /// Never closed by this type, so the only error path is a logic bug.
    pub async fn acquire_build(&self, site_id: Uuid) -> WriterLease {
        let semaphore = Self::semaphore_for(&self.build_locks, site_id);
        match semaphore.acquire_owned().await {
            Ok(permit) => WriterLease(permit),
            Err(AcquireError { .. }) => unreachable!("build semaphore is never closed"),
        }
    }

    /// Try to become the active `AgentRun` writer for `site_id`. Returns
    /// `None` if an agent run is already active for this site — a second
    /// run must be rejected, not queued behind the first.
    #[must_use]
    pub fn try_acquire_agent(&self, site_id: Uuid) -> Option<WriterLease> {
        let semaphore = Self::semaphore_for(&self.agent_locks, site_id);
        match semaphore.try_acquire_owned() {
            Ok(permit) => Some(WriterLease(permit)),
            Err(TryAcquireError::NoPermits) => None,
            Err(TryAcquireError::Closed) => unreachable!("agent semaphore is never closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn second_build_lease_queues_behind_the_first() {
        let registry = Arc::new(SiteRegistry::new());
        let site_id = Uuid::new_v4();
        let first = registry.acquire_build(site_id).await;

        let registry2 = Arc::clone(&registry);
        let waiter = tokio::spawn(async move {
            registry2.acquire_build(site_id).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_millis(200), waiter).await.unwrap().unwrap();
    }

    #[test]
    fn second_agent_lease_is_rejected_while_first_held() {
        let registry = SiteRegistry::new();
        let site_id = Uuid::new_v4();
        let first = registry.try_acquire_agent(site_id);
        assert!(first.is_some());
        assert!(registry.try_acquire_agent(site_id).is_none());
    }

    #[test]
    fn agent_lease_release_frees_the_slot() {
        let registry = SiteRegistry::new();
        let site_id = Uuid::new_v4();
        let first = registry.try_acquire_agent(site_id);
        drop(first);
        assert!(registry.try_acquire_agent(site_id).is_some());
    }

    #[test]
    fn build_and_agent_locks_are_independent() {
        let registry = SiteRegistry::new();
        let site_id = Uuid::new_v4();
        let _agent = registry.try_acquire_agent(site_id);
        assert!(registry.try_acquire_agent(site_id).is_none());
    }
}
