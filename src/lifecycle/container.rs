//! # Engine Container
//!
//! The side effects behind each lifecycle transition. [`EngineLifecycle`]
//! only calls into the container once the transition guard has passed.
//!
//! [`EngineLifecycle`]: super::EngineLifecycle

use crate::cluster::ClusterCoordinator;
use crate::error::EngineResult;
use crate::processing::{CleanJob, ProcessingScheduler};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait EngineContainer: Send + Sync {
    /// Start task processing and publish cluster membership
    async fn start(&self) -> EngineResult<()>;

    /// Stop picking up new tasks, keeping every resource
    async fn stop_processing(&self) -> EngineResult<()>;

    /// Release everything, cluster membership included
    async fn stop(&self) -> EngineResult<()>;
}

pub struct ComputeEngineContainer {
    coordinator: Arc<dyn ClusterCoordinator>,
    scheduler: Arc<ProcessingScheduler>,
    clean_job: Option<Arc<CleanJob>>,
}

impl ComputeEngineContainer {
    /// `clean_job` is `None` when the maintenance job is disabled
    pub fn new(
        coordinator: Arc<dyn ClusterCoordinator>,
        scheduler: Arc<ProcessingScheduler>,
        clean_job: Option<Arc<CleanJob>>,
    ) -> Self {
        Self {
            coordinator,
            scheduler,
            clean_job,
        }
    }
}

#[async_trait]
impl EngineContainer for ComputeEngineContainer {
    async fn start(&self) -> EngineResult<()> {
        self.coordinator.broadcast_worker_uuids().await?;
        self.scheduler.start();

        if let Some(job) = &self.clean_job {
            job.start();
        }
        Ok(())
    }

    async fn stop_processing(&self) -> EngineResult<()> {
        self.scheduler.stop().await;
        Ok(())
    }

    async fn stop(&self) -> EngineResult<()> {
        self.scheduler.stop().await;
        // Waits out a round in flight so the clean job lock is released before leaving
        if let Some(job) = &self.clean_job {
            job.stop().await;
        }
        self.coordinator.stop().await;
        info!("Engine resources released");
        Ok(())
    }
}
