//! # Engine Diagnostics
//!
//! Point-in-time snapshot of the engine for operators: lifecycle state,
//! worker identities as seen locally and cluster-wide, queue depth and the
//! pause switches.

use crate::cluster::ClusterCoordinator;
use crate::error::EngineResult;
use crate::lifecycle::EngineState;
use crate::queue::{TaskQueue, WorkersPauseStatus};
use crate::registry::WorkerRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsSnapshot {
    pub state: EngineState,
    pub clustered: bool,
    pub local_worker_uuids: Vec<String>,
    /// `None` until the worker UUIDs are broadcast, or while the grid is unreachable
    pub cluster_worker_uuids: Option<Vec<String>>,
    pub busy_workers: usize,
    pub pending_count: usize,
    pub in_progress_count: usize,
    pub submit_paused: bool,
    pub workers_pause_status: WorkersPauseStatus,
    pub captured_at: DateTime<Utc>,
}

impl DiagnosticsSnapshot {
    pub async fn capture(
        state: EngineState,
        queue: &TaskQueue,
        registry: &WorkerRegistry,
        coordinator: &dyn ClusterCoordinator,
    ) -> EngineResult<Self> {
        let mut local_worker_uuids: Vec<String> = registry.worker_uuids().into_iter().collect();
        local_worker_uuids.sort();

        let cluster_worker_uuids = match coordinator.worker_uuids().await {
            Ok(uuids) => {
                let mut uuids: Vec<String> = uuids.into_iter().collect();
                uuids.sort();
                Some(uuids)
            }
            Err(e) => {
                debug!(error = %e, "Cluster worker UUIDs unavailable");
                None
            }
        };

        Ok(Self {
            state,
            clustered: coordinator.is_clustered(),
            local_worker_uuids,
            cluster_worker_uuids,
            busy_workers: registry.busy_count(),
            pending_count: queue.pending_count().await?,
            in_progress_count: queue.in_progress_count().await?,
            submit_paused: queue.is_submit_paused(),
            workers_pause_status: queue.workers_pause_status().await?,
            captured_at: Utc::now(),
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
