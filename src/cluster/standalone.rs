//! Coordinator for an engine made of this process alone.

use super::coordinator::ClusterCoordinator;
use super::lock::{ClusterLock, StandaloneLock};
use crate::constants::cluster_objects::CLEAN_JOB_LOCK;
use crate::error::{EngineError, EngineResult};
use crate::registry::WorkerRegistry;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct StandaloneCoordinator {
    registry: Arc<WorkerRegistry>,
    published: RwLock<Option<HashSet<String>>>,
    clean_job_lock: Arc<StandaloneLock>,
}

impl StandaloneCoordinator {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self {
            registry,
            published: RwLock::new(None),
            clean_job_lock: Arc::new(StandaloneLock::new(CLEAN_JOB_LOCK)),
        }
    }
}

#[async_trait]
impl ClusterCoordinator for StandaloneCoordinator {
    fn is_clustered(&self) -> bool {
        false
    }

    async fn broadcast_worker_uuids(&self) -> EngineResult<()> {
        let uuids = self.registry.worker_uuids();
        debug!(worker_count = uuids.len(), "Worker UUIDs recorded");
        *self.published.write() = Some(uuids);
        Ok(())
    }

    async fn worker_uuids(&self) -> EngineResult<HashSet<String>> {
        self.published.read().clone().ok_or_else(|| {
            EngineError::invalid_state("broadcast_worker_uuids() must be called first")
        })
    }

    async fn acquire_clean_job_lock(&self) -> EngineResult<Arc<dyn ClusterLock>> {
        Ok(self.clean_job_lock.clone())
    }

    async fn stop(&self) {
        *self.published.write() = None;
    }
}
