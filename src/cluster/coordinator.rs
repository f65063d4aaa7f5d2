//! # Cluster Coordinator Contract
//!
//! Worker-identity visibility and the clean-job lock, independent of
//! deployment topology. The variant is picked once at process start by
//! [`coordinator_for`].

use super::clustered::ClusteredCoordinator;
use super::lock::ClusterLock;
use super::membership::MembershipProvider;
use super::standalone::StandaloneCoordinator;
use crate::config::ClusterConfig;
use crate::error::{EngineError, EngineResult};
use crate::registry::WorkerRegistry;
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait]
pub trait ClusterCoordinator: Send + Sync + Debug {
    /// Whether other processes may share this engine
    fn is_clustered(&self) -> bool;

    /// Publish the local worker UUIDs under this process's own identity.
    ///
    /// Republishing overwrites the same entry.
    async fn broadcast_worker_uuids(&self) -> EngineResult<()>;

    /// Worker UUIDs published by members that are currently connected
    async fn worker_uuids(&self) -> EngineResult<HashSet<String>>;

    /// Lock held by at most one clean job across the whole engine
    async fn acquire_clean_job_lock(&self) -> EngineResult<Arc<dyn ClusterLock>>;

    /// Retract the local entry. Never fails; problems are logged.
    async fn stop(&self);
}

/// Build the coordinator matching `config`.
///
/// Clustering requires a membership provider; without clustering any
/// provider given is ignored.
pub fn coordinator_for(
    config: &ClusterConfig,
    registry: Arc<WorkerRegistry>,
    provider: Option<Arc<dyn MembershipProvider>>,
) -> EngineResult<Arc<dyn ClusterCoordinator>> {
    match (config.enabled, provider) {
        (true, Some(provider)) => {
            info!(
                member_id = %provider.local_member_id(),
                "🌐 Cluster mode enabled"
            );
            Ok(Arc::new(ClusteredCoordinator::new(registry, provider)))
        }
        (true, None) => Err(EngineError::configuration(
            "cluster.enabled requires a membership provider",
        )),
        (false, provider) => {
            if provider.is_some() {
                debug!("Cluster mode disabled - membership provider ignored");
            }
            info!("🖥️ Running standalone");
            Ok(Arc::new(StandaloneCoordinator::new(registry)))
        }
    }
}
