//! # Clustered Coordinator
//!
//! Keeps worker identities in a replicated map keyed by member identity:
//!
//! ```text
//! compute_engine.worker_uuids
//! ├── member A -> {w1, w2}
//! ├── member B -> {w3}
//! └── member C -> {w4, w5, w6}   (C disconnected: entry still present, not counted)
//! ```
//!
//! Reads filter the map by the live member set, so an entry left behind by a
//! crashed member stops counting as soon as the grid reports it gone.

use super::coordinator::ClusterCoordinator;
use super::errors::CoordinationError;
use super::lock::ClusterLock;
use super::membership::{MembershipProvider, ReplicatedSetMap};
use crate::constants::cluster_objects::{CLEAN_JOB_LOCK, WORKER_UUIDS};
use crate::error::EngineResult;
use crate::logging::log_cluster_operation;
use crate::registry::WorkerRegistry;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub struct ClusteredCoordinator {
    registry: Arc<WorkerRegistry>,
    provider: Arc<dyn MembershipProvider>,
}

impl std::fmt::Debug for ClusteredCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusteredCoordinator")
            .field("member_id", self.provider.local_member_id())
            .field("worker_count", &self.registry.len())
            .finish()
    }
}

impl ClusteredCoordinator {
    pub fn new(registry: Arc<WorkerRegistry>, provider: Arc<dyn MembershipProvider>) -> Self {
        Self { registry, provider }
    }

    fn worker_uuids_map(&self) -> Result<Arc<dyn ReplicatedSetMap>, CoordinationError> {
        self.provider.replicated_set_map(WORKER_UUIDS)
    }

    async fn retract_local_entry(&self) -> Result<(), CoordinationError> {
        self.worker_uuids_map()?
            .remove(self.provider.local_member_id())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ClusterCoordinator for ClusteredCoordinator {
    fn is_clustered(&self) -> bool {
        true
    }

    #[instrument(skip(self), fields(member_id = %self.provider.local_member_id()))]
    async fn broadcast_worker_uuids(&self) -> EngineResult<()> {
        let uuids = self.registry.worker_uuids();
        let count = uuids.len();
        self.worker_uuids_map()?
            .put(self.provider.local_member_id(), uuids)
            .await?;

        log_cluster_operation(
            "broadcast_worker_uuids",
            self.provider.local_member_id().as_str(),
            Some(&format!("{count} workers")),
        );
        Ok(())
    }

    async fn worker_uuids(&self) -> EngineResult<HashSet<String>> {
        let live = self.provider.live_member_ids().await?;
        let entries = self.worker_uuids_map()?.entries().await?;

        let mut stale = 0;
        let mut uuids = HashSet::new();
        for (member, published) in entries {
            if live.contains(&member) {
                uuids.extend(published);
            } else {
                stale += 1;
            }
        }

        if stale > 0 {
            debug!(stale_members = stale, "Ignored worker UUIDs of disconnected members");
        }
        Ok(uuids)
    }

    async fn acquire_clean_job_lock(&self) -> EngineResult<Arc<dyn ClusterLock>> {
        Ok(self.provider.lock(CLEAN_JOB_LOCK)?)
    }

    async fn stop(&self) {
        let member_id = self.provider.local_member_id();
        match self.retract_local_entry().await {
            Ok(()) => log_cluster_operation("stop", member_id.as_str(), None),
            Err(e) if e.is_service_inactive() => {
                debug!(
                    member_id = %member_id,
                    error = %e,
                    "Membership service already inactive - worker UUIDs not retracted"
                );
            }
            Err(e) => {
                warn!(
                    member_id = %member_id,
                    error = %e,
                    "Failed to retract worker UUIDs - membership expiry will clean up"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{InMemoryGrid, MemberId};

    #[tokio::test]
    async fn test_broadcast_overwrites_own_entry_only() {
        let grid = InMemoryGrid::new();
        let other = grid.join("B");
        other
            .replicated_set_map(WORKER_UUIDS)
            .unwrap()
            .put(&MemberId::from("B"), ["w3".to_string()].into_iter().collect())
            .await
            .unwrap();

        let registry = Arc::new(WorkerRegistry::new(2));
        let coordinator =
            ClusteredCoordinator::new(Arc::clone(&registry), Arc::new(grid.join("A")));
        coordinator.broadcast_worker_uuids().await.unwrap();
        coordinator.broadcast_worker_uuids().await.unwrap();

        let entries = other
            .replicated_set_map(WORKER_UUIDS)
            .unwrap()
            .entries()
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[&MemberId::from("A")], registry.worker_uuids());
        assert_eq!(entries[&MemberId::from("B")].len(), 1);
    }
}
