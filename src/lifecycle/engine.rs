//! # Compute Engine
//!
//! Wires the collaborators into one engine:
//!
//! ```text
//! ComputeEngine
//! ├── TaskQueue ──────────── QueueStore, ComponentDirectory
//! ├── WorkerRegistry
//! ├── ClusterCoordinator ─── MembershipProvider (clustered only)
//! ├── ProcessingScheduler ── TaskProcessor
//! ├── CleanJob
//! └── EngineLifecycle ────── ComputeEngineContainer
//! ```

use super::container::ComputeEngineContainer;
use super::engine_lifecycle::EngineLifecycle;
use super::state::EngineState;
use crate::cluster::{coordinator_for, ClusterCoordinator, MembershipProvider};
use crate::config::EngineConfig;
use crate::diagnostics::DiagnosticsSnapshot;
use crate::error::EngineResult;
use crate::processing::{CleanJob, LoggingTaskProcessor, ProcessingScheduler, TaskProcessor};
use crate::queue::{
    ComponentDirectory, InMemoryComponentDirectory, InMemoryQueueStore, QueueStore, TaskQueue,
};
use crate::registry::WorkerRegistry;
use std::sync::Arc;
use tracing::info;

pub struct ComputeEngine {
    config: EngineConfig,
    queue: Arc<TaskQueue>,
    registry: Arc<WorkerRegistry>,
    coordinator: Arc<dyn ClusterCoordinator>,
    scheduler: Arc<ProcessingScheduler>,
    clean_job: Arc<CleanJob>,
    lifecycle: EngineLifecycle,
}

impl std::fmt::Debug for ComputeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeEngine")
            .field("queue", &self.queue)
            .field("coordinator", &self.coordinator)
            .field("scheduler", &self.scheduler)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

impl ComputeEngine {
    pub fn builder() -> ComputeEngineBuilder {
        ComputeEngineBuilder::default()
    }

    pub async fn startup(&self) -> EngineResult<()> {
        self.lifecycle.startup().await
    }

    pub async fn stop_processing(&self) -> EngineResult<()> {
        self.lifecycle.stop_processing().await
    }

    pub async fn shutdown(&self) -> EngineResult<()> {
        self.lifecycle.shutdown().await
    }

    pub async fn state(&self) -> EngineState {
        self.lifecycle.state().await
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn queue(&self) -> &Arc<TaskQueue> {
        &self.queue
    }

    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    pub fn coordinator(&self) -> &Arc<dyn ClusterCoordinator> {
        &self.coordinator
    }

    pub fn scheduler(&self) -> &Arc<ProcessingScheduler> {
        &self.scheduler
    }

    /// The maintenance job, for running a round on demand
    pub fn clean_job(&self) -> &Arc<CleanJob> {
        &self.clean_job
    }

    pub async fn diagnostics(&self) -> EngineResult<DiagnosticsSnapshot> {
        DiagnosticsSnapshot::capture(
            self.state().await,
            &self.queue,
            &self.registry,
            self.coordinator.as_ref(),
        )
        .await
    }
}

#[derive(Default)]
pub struct ComputeEngineBuilder {
    config: Option<EngineConfig>,
    store: Option<Arc<dyn QueueStore>>,
    components: Option<Arc<dyn ComponentDirectory>>,
    processor: Option<Arc<dyn TaskProcessor>>,
    membership: Option<Arc<dyn MembershipProvider>>,
}

impl ComputeEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn store(mut self, store: Arc<dyn QueueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn component_directory(mut self, components: Arc<dyn ComponentDirectory>) -> Self {
        self.components = Some(components);
        self
    }

    pub fn processor(mut self, processor: Arc<dyn TaskProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Required when `cluster.enabled` is set
    pub fn membership_provider(mut self, provider: Arc<dyn MembershipProvider>) -> Self {
        self.membership = Some(provider);
        self
    }

    /// Validate the configuration and wire the engine; unset collaborators
    /// fall back to the in-memory implementations
    pub fn build(self) -> EngineResult<ComputeEngine> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryQueueStore::new()));
        let components = self
            .components
            .unwrap_or_else(|| Arc::new(InMemoryComponentDirectory::new()));
        let processor = self
            .processor
            .unwrap_or_else(|| Arc::new(LoggingTaskProcessor));

        let queue = Arc::new(TaskQueue::new(store, components, config.queue.clone()));
        let registry = Arc::new(WorkerRegistry::new(config.workers.count));
        let coordinator = coordinator_for(&config.cluster, Arc::clone(&registry), self.membership)?;

        let scheduler = Arc::new(ProcessingScheduler::new(
            config.scheduler.clone(),
            Arc::clone(&queue),
            Arc::clone(&registry),
            processor,
        ));
        let clean_job = Arc::new(CleanJob::new(
            Arc::clone(&queue),
            Arc::clone(&coordinator),
            config.clean_job.clone(),
        ));

        let container = ComputeEngineContainer::new(
            Arc::clone(&coordinator),
            Arc::clone(&scheduler),
            config.clean_job.enabled.then(|| Arc::clone(&clean_job)),
        );
        let lifecycle = EngineLifecycle::new(Arc::new(container));

        info!(
            workers = registry.len(),
            clustered = coordinator.is_clustered(),
            clean_job = config.clean_job.enabled,
            "🔧 Compute engine assembled"
        );

        Ok(ComputeEngine {
            config,
            queue,
            registry,
            coordinator,
            scheduler,
            clean_job,
            lifecycle,
        })
    }
}
