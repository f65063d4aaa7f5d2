//! Shared fixtures for the integration tests.

#![allow(dead_code)]

pub mod strategies;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use compute_engine::config::{EngineConfig, QueueConfig};
use compute_engine::models::{
    ActivityOutcome, ActivityRecord, Component, QueueRow, QueueStatus, Task, TaskSubmission,
};
use compute_engine::processing::{TaskFailure, TaskProcessor};
use compute_engine::queue::{
    ArchiveOutcome, ComponentDirectory, InMemoryComponentDirectory, InMemoryQueueStore,
    QueueStore, StoreError, StoreResult, SubmitOption, TaskQueue,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const ORGANIZATION: &str = "org-1";

/// A queue over fresh in-memory collaborators, with handles on both
pub struct QueueFixture {
    pub store: Arc<InMemoryQueueStore>,
    pub components: Arc<InMemoryComponentDirectory>,
    pub queue: Arc<TaskQueue>,
}

impl QueueFixture {
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    pub fn with_config(config: QueueConfig) -> Self {
        let store = Arc::new(InMemoryQueueStore::new());
        let components = Arc::new(InMemoryComponentDirectory::new());
        let queue = Arc::new(TaskQueue::new(store.clone(), components.clone(), config));
        Self {
            store,
            components,
            queue,
        }
    }

    /// Register a project component owned by [`ORGANIZATION`]
    pub fn add_project(&self, uuid: &str) -> Component {
        let component = Component::new(
            uuid,
            format!("key_{uuid}"),
            format!("Project {uuid}"),
            ORGANIZATION,
        );
        self.components.insert(component.clone());
        component
    }

    pub fn submission(&self, task_type: &str, component_uuid: Option<&str>) -> TaskSubmission {
        self.queue
            .prepare_submit()
            .task_type(task_type)
            .component_uuid(component_uuid)
            .submitter_login(Some("admin"))
            .build()
            .expect("valid submission")
    }

    pub async fn submit(&self, task_type: &str, component_uuid: Option<&str>) -> Task {
        self.queue
            .submit(self.submission(task_type, component_uuid))
            .await
            .expect("submit")
    }
}

/// Engine configuration with short delays so loops react quickly in tests
pub fn fast_config(workers: usize) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.workers.count = workers;
    config.scheduler.poll_delay_ms = 10;
    config.scheduler.disabled_delay_ms = 10;
    config.clean_job.enabled = false;
    config
}

/// Processor recording every task it sees; tasks of `failing_type` fail
#[derive(Default)]
pub struct RecordingProcessor {
    pub processed: Mutex<Vec<String>>,
    pub failing_type: Option<String>,
    pub delay: Option<Duration>,
}

impl RecordingProcessor {
    pub fn failing(task_type: &str) -> Self {
        Self {
            failing_type: Some(task_type.to_string()),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn processed(&self) -> Vec<String> {
        self.processed.lock().clone()
    }
}

#[async_trait]
impl TaskProcessor for RecordingProcessor {
    async fn process(&self, task: &Task) -> Result<(), TaskFailure> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.processed.lock().push(task.uuid().to_string());

        match &self.failing_type {
            Some(failing) if failing == task.task_type() => {
                Err(TaskFailure::new(format!("{} is not supported", task.task_type())))
            }
            _ => Ok(()),
        }
    }
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn eventually<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition().await
}

/// In-memory store whose orphan reset takes `delay`, flagging when one starts
pub struct SlowResetStore {
    inner: InMemoryQueueStore,
    delay: Duration,
    pub reset_started: AtomicBool,
}

impl SlowResetStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryQueueStore::new(),
            delay,
            reset_started: AtomicBool::new(false),
        }
    }

    pub fn reset_started(&self) -> bool {
        self.reset_started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueStore for SlowResetStore {
    async fn insert(&self, rows: Vec<QueueRow>) -> StoreResult<()> {
        self.inner.insert(rows).await
    }

    async fn insert_unique(
        &self,
        rows: Vec<QueueRow>,
        option: SubmitOption,
    ) -> StoreResult<HashSet<String>> {
        self.inner.insert_unique(rows, option).await
    }

    async fn select_by_uuid(&self, uuid: &str) -> StoreResult<Option<QueueRow>> {
        self.inner.select_by_uuid(uuid).await
    }

    async fn select_by_status(&self, status: QueueStatus) -> StoreResult<Vec<QueueRow>> {
        self.inner.select_by_status(status).await
    }

    async fn count_by_status(&self, status: QueueStatus) -> StoreResult<usize> {
        self.inner.count_by_status(status).await
    }

    async fn count_pending_by_component(
        &self,
        component_uuids: &[String],
    ) -> StoreResult<HashMap<String, usize>> {
        self.inner.count_pending_by_component(component_uuids).await
    }

    async fn claim(
        &self,
        worker_uuid: &str,
        max_execution_count: u32,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<QueueRow>> {
        self.inner.claim(worker_uuid, max_execution_count, now).await
    }

    async fn archive(
        &self,
        uuid: &str,
        required_status: Option<QueueStatus>,
        outcome: ActivityOutcome,
    ) -> StoreResult<ArchiveOutcome> {
        self.inner.archive(uuid, required_status, outcome).await
    }

    async fn select_activity(&self, uuid: &str) -> StoreResult<Option<ActivityRecord>> {
        self.inner.select_activity(uuid).await
    }

    async fn reset_in_progress_except(
        &self,
        known_worker_uuids: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> StoreResult<usize> {
        self.reset_started.store(true, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.inner.reset_in_progress_except(known_worker_uuids, now).await
    }
}

/// Component directory that starts failing every lookup once [`fail`](Self::fail) is called
#[derive(Default)]
pub struct FlakyDirectory {
    inner: InMemoryComponentDirectory,
    failing: AtomicBool,
}

impl FlakyDirectory {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ComponentDirectory for FlakyDirectory {
    async fn find_by_uuids(&self, uuids: &[String]) -> StoreResult<HashMap<String, Component>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("component directory offline"));
        }
        self.inner.find_by_uuids(uuids).await
    }
}
