//! # Task Queue
//!
//! Submission, claiming, cancellation and pause control over the durable
//! queue held by a [`QueueStore`].
//!
//! ## Row lifecycle
//!
//! ```text
//! submit ──> PENDING ──peek──> IN_PROGRESS ──remove──> SUCCESS | FAILED
//!               │                   │
//!               │                   └──fail──> FAILED
//!               └──cancel──> CANCELED   (in-progress rows can't be canceled)
//! ```
//!
//! Every activity record written here carries `queue.node_name` when set.
//!
//! Two independent process-wide switches gate the queue: `submit_paused`
//! makes `submit`/`mass_submit` fail, `workers_paused` tells the local
//! workers to stop claiming. Both are atomics, read and written from any
//! thread.

use super::directory::ComponentDirectory;
use super::store::{ArchiveOutcome, QueueStore, SubmitOption};
use crate::config::QueueConfig;
use crate::error::{EngineError, EngineResult};
use crate::logging::log_queue_operation;
use crate::models::{
    ActivityOutcome, ActivityRecord, ActivityStatus, Component, QueueRow, QueueStatus, Task,
    TaskSubmission, TaskSubmissionBuilder,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkersPauseStatus {
    /// Workers claim tasks normally
    Resumed,
    /// Pause requested, some tasks still in progress
    Pausing,
    /// Pause requested and nothing in progress
    Paused,
}

pub struct TaskQueue {
    store: Arc<dyn QueueStore>,
    components: Arc<dyn ComponentDirectory>,
    config: QueueConfig,
    submit_paused: AtomicBool,
    workers_paused: AtomicBool,
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("config", &self.config)
            .field("submit_paused", &self.is_submit_paused())
            .field("workers_paused", &self.is_workers_paused())
            .finish()
    }
}

impl TaskQueue {
    pub fn new(
        store: Arc<dyn QueueStore>,
        components: Arc<dyn ComponentDirectory>,
        config: QueueConfig,
    ) -> Self {
        Self {
            store,
            components,
            config,
            submit_paused: AtomicBool::new(false),
            workers_paused: AtomicBool::new(false),
        }
    }

    pub fn max_execution_count(&self) -> u32 {
        self.config.max_execution_count
    }

    /// Start building a submission for a new task with a freshly generated uuid
    pub fn prepare_submit(&self) -> TaskSubmissionBuilder {
        TaskSubmission::builder(Uuid::new_v4().to_string())
    }

    /// Enqueue one task and return it
    pub async fn submit(&self, submission: TaskSubmission) -> EngineResult<Task> {
        let mut tasks = self.submit_batch(vec![submission], None).await?;
        tasks
            .pop()
            .ok_or_else(|| EngineError::invalid_state("submission produced no task"))
    }

    /// Enqueue one task unless `option` filters it out
    pub async fn submit_with(
        &self,
        submission: TaskSubmission,
        option: SubmitOption,
    ) -> EngineResult<Option<Task>> {
        let mut tasks = self.submit_batch(vec![submission], Some(option)).await?;
        Ok(tasks.pop())
    }

    /// Enqueue every submission as one batch, preserving input order
    pub async fn mass_submit(&self, submissions: Vec<TaskSubmission>) -> EngineResult<Vec<Task>> {
        self.submit_batch(submissions, None).await
    }

    /// Like [`mass_submit`](Self::mass_submit), returning only the tasks `option` let through
    pub async fn mass_submit_with(
        &self,
        submissions: Vec<TaskSubmission>,
        option: SubmitOption,
    ) -> EngineResult<Vec<Task>> {
        self.submit_batch(submissions, Some(option)).await
    }

    #[instrument(skip(self, submissions), fields(batch_size = submissions.len()))]
    async fn submit_batch(
        &self,
        submissions: Vec<TaskSubmission>,
        option: Option<SubmitOption>,
    ) -> EngineResult<Vec<Task>> {
        if self.is_submit_paused() {
            return Err(EngineError::invalid_state(
                "Engine does not currently accept new tasks",
            ));
        }

        let component_uuids: Vec<String> = submissions
            .iter()
            .filter_map(|s| s.component_uuid().map(str::to_string))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let components = self.components.find_by_uuids(&component_uuids).await?;
        let now = Utc::now();

        let mut rows = Vec::with_capacity(submissions.len());
        let mut tasks = Vec::with_capacity(submissions.len());
        for submission in &submissions {
            let component = submission
                .component_uuid()
                .and_then(|uuid| components.get(uuid));
            tasks.push(self.build_task(
                submission.uuid(),
                submission.task_type(),
                submission.component_uuid(),
                submission.submitter_login(),
                component,
            )?);

            let mut row = QueueRow::pending(submission.uuid(), submission.task_type(), now);
            row.component_uuid = submission.component_uuid().map(str::to_string);
            row.submitter_login = submission.submitter_login().map(str::to_string);
            rows.push(row);
        }

        let tasks = match option {
            None => {
                self.store.insert(rows).await?;
                tasks
            }
            Some(option) => {
                let inserted = self.store.insert_unique(rows, option).await?;
                let skipped = tasks.len() - inserted.len();
                if skipped > 0 {
                    debug!(skipped, ?option, "Submissions filtered out by submit option");
                }
                tasks
                    .into_iter()
                    .filter(|t| inserted.contains(t.uuid()))
                    .collect()
            }
        };

        for task in &tasks {
            log_queue_operation("submit", task.uuid(), "PENDING", Some(task.task_type()));
        }

        Ok(tasks)
    }

    fn build_task(
        &self,
        uuid: &str,
        task_type: &str,
        component_uuid: Option<&str>,
        submitter_login: Option<&str>,
        component: Option<&Component>,
    ) -> EngineResult<Task> {
        let organization_id = component
            .map(|c| c.organization_id.as_str())
            .unwrap_or(&self.config.default_organization_id);

        Task::builder()
            .organization_id(organization_id)
            .uuid(uuid)
            .task_type(task_type)
            .component_uuid(component_uuid)
            .component_key(component.map(|c| c.key.as_str()))
            .component_name(component.map(|c| c.name.as_str()))
            .submitter_login(submitter_login)
            .build()
    }

    /// Rebuild the [`Task`] for a claimed row, resolving its component again
    pub async fn task_for_row(&self, row: &QueueRow) -> EngineResult<Task> {
        let component = match &row.component_uuid {
            Some(uuid) => self.components.find_by_uuid(uuid).await?,
            None => None,
        };

        self.build_task(
            &row.uuid,
            &row.task_type,
            row.component_uuid.as_deref(),
            row.submitter_login.as_deref(),
            component.as_ref(),
        )
    }

    /// Claim at most one PENDING row for `worker_uuid`; claims nothing while workers are paused
    #[instrument(skip(self))]
    pub async fn peek(
        &self,
        worker_uuid: &str,
        max_execution_count: u32,
    ) -> EngineResult<Option<QueueRow>> {
        if worker_uuid.is_empty() {
            return Err(EngineError::validation("worker_uuid can't be null nor empty"));
        }
        if self.is_workers_paused() {
            return Ok(None);
        }

        let claimed = self
            .store
            .claim(worker_uuid, max_execution_count, Utc::now())
            .await?;

        if let Some(row) = &claimed {
            debug!(
                task_uuid = %row.uuid,
                execution_count = row.execution_count,
                "Task claimed"
            );
        }

        Ok(claimed)
    }

    /// Cancel a PENDING row; an IN_PROGRESS row is left untouched
    #[instrument(skip(self, row), fields(task_uuid = %row.uuid))]
    pub async fn cancel(&self, row: &QueueRow) -> EngineResult<ActivityRecord> {
        if row.is_in_progress() {
            return Err(Self::in_progress_error(&row.uuid));
        }

        let outcome = self.outcome(ActivityStatus::Canceled);
        match self
            .store
            .archive(&row.uuid, Some(QueueStatus::Pending), outcome)
            .await?
        {
            ArchiveOutcome::Archived(record) => {
                log_queue_operation("cancel", &row.uuid, "CANCELED", None);
                Ok(record)
            }
            ArchiveOutcome::StatusMismatch { .. } => Err(Self::in_progress_error(&row.uuid)),
            ArchiveOutcome::NotFound => Err(EngineError::invalid_state(format!(
                "Task does not exist anymore: {}",
                row.uuid
            ))),
        }
    }

    fn outcome(&self, status: ActivityStatus) -> ActivityOutcome {
        ActivityOutcome::new(status, Utc::now()).with_node_name(self.config.node_name.as_deref())
    }

    fn in_progress_error(uuid: &str) -> EngineError {
        EngineError::invalid_state(format!("task in progress cannot be canceled: {uuid}"))
    }

    /// Cancel every PENDING row, returning how many were canceled
    pub async fn cancel_all(&self) -> EngineResult<usize> {
        self.cancel_all_tasks(false).await
    }

    /// Cancel every PENDING row, and with `include_in_progress` every
    /// IN_PROGRESS row as well.
    ///
    /// A worker still running a canceled task finds it gone when it records
    /// the outcome.
    pub async fn cancel_all_tasks(&self, include_in_progress: bool) -> EngineResult<usize> {
        let mut canceled = self
            .cancel_rows(self.store.select_by_status(QueueStatus::Pending).await?)
            .await?;

        if include_in_progress {
            let in_progress = self.store.select_by_status(QueueStatus::InProgress).await?;
            for row in in_progress {
                if self.cancel_row(&row.uuid, QueueStatus::InProgress).await? {
                    canceled += 1;
                }
            }
        }

        info!(canceled, include_in_progress, "Canceled all tasks");
        Ok(canceled)
    }

    /// Cancel PENDING rows that already reached the execution limit and can never be claimed
    pub async fn cancel_worn_outs(&self) -> EngineResult<usize> {
        let max = self.config.max_execution_count;
        let worn_out: Vec<QueueRow> = self
            .store
            .select_by_status(QueueStatus::Pending)
            .await?
            .into_iter()
            .filter(|r| r.execution_count >= max)
            .collect();

        let canceled = self.cancel_rows(worn_out).await?;
        if canceled > 0 {
            info!(canceled, max_execution_count = max, "Canceled worn-out tasks");
        }
        Ok(canceled)
    }

    async fn cancel_rows(&self, rows: Vec<QueueRow>) -> EngineResult<usize> {
        let mut canceled = 0;
        for row in rows {
            // A row claimed since it was listed comes back as a mismatch and is skipped
            if self.cancel_row(&row.uuid, QueueStatus::Pending).await? {
                canceled += 1;
            }
        }
        Ok(canceled)
    }

    async fn cancel_row(&self, uuid: &str, expected: QueueStatus) -> EngineResult<bool> {
        let outcome = self.outcome(ActivityStatus::Canceled);
        match self.store.archive(uuid, Some(expected), outcome).await? {
            ArchiveOutcome::Archived(_) => {
                log_queue_operation("cancel", uuid, "CANCELED", None);
                Ok(true)
            }
            ArchiveOutcome::NotFound | ArchiveOutcome::StatusMismatch { .. } => Ok(false),
        }
    }

    /// Mark a claimed row as FAILED without going through a worker's `remove`
    #[instrument(skip(self, row, error_message), fields(task_uuid = %row.uuid))]
    pub async fn fail(
        &self,
        row: &QueueRow,
        error_type: Option<&str>,
        error_message: Option<&str>,
    ) -> EngineResult<ActivityRecord> {
        let not_in_progress = || {
            EngineError::invalid_state(format!(
                "Task is not in-progress and can't be marked as failed [uuid={}]",
                row.uuid
            ))
        };
        if !row.is_in_progress() {
            return Err(not_in_progress());
        }

        let mut outcome = self.outcome(ActivityStatus::Failed);
        if let Some(error_type) = error_type {
            outcome = outcome.with_error_type(error_type);
        }
        if let Some(message) = error_message {
            outcome = outcome.with_error(message);
        }

        match self
            .store
            .archive(&row.uuid, Some(QueueStatus::InProgress), outcome)
            .await?
        {
            ArchiveOutcome::Archived(record) => {
                log_queue_operation("fail", &row.uuid, "FAILED", record.error_type.as_deref());
                Ok(record)
            }
            ArchiveOutcome::StatusMismatch { .. } => Err(not_in_progress()),
            ArchiveOutcome::NotFound => Err(EngineError::invalid_state(format!(
                "Task does not exist anymore: {}",
                row.uuid
            ))),
        }
    }

    /// Record the terminal outcome of an executed task and drop it from the queue
    #[instrument(skip(self, task, error_message), fields(task_uuid = %task.uuid()))]
    pub async fn remove(
        &self,
        task: &Task,
        status: ActivityStatus,
        error_message: Option<String>,
    ) -> EngineResult<ActivityRecord> {
        let mut outcome = self.outcome(status);
        if let Some(message) = error_message {
            if status != ActivityStatus::Failed {
                return Err(EngineError::validation(
                    "Error can be provided only when status is FAILED",
                ));
            }
            outcome = outcome.with_error(message);
        }

        match self.store.archive(task.uuid(), None, outcome).await? {
            ArchiveOutcome::Archived(record) => {
                log_queue_operation(
                    "remove",
                    task.uuid(),
                    &status.to_string(),
                    record.error_message.as_deref(),
                );
                Ok(record)
            }
            ArchiveOutcome::NotFound | ArchiveOutcome::StatusMismatch { .. } => Err(
                EngineError::invalid_state(format!("Task does not exist anymore: {}", task.uuid())),
            ),
        }
    }

    /// Put back to PENDING every IN_PROGRESS row not owned by one of `known_worker_uuids`
    pub async fn reset_tasks_with_unknown_worker_uuids(
        &self,
        known_worker_uuids: &HashSet<String>,
    ) -> EngineResult<usize> {
        let reset = self
            .store
            .reset_in_progress_except(known_worker_uuids, Utc::now())
            .await?;

        if reset > 0 {
            warn!(
                reset,
                known_workers = known_worker_uuids.len(),
                "Reset in-progress tasks owned by unknown workers"
            );
        }
        Ok(reset)
    }

    pub fn pause_submit(&self) {
        self.submit_paused.store(true, Ordering::SeqCst);
        info!("⏸️ Task submission paused");
    }

    pub fn resume_submit(&self) {
        self.submit_paused.store(false, Ordering::SeqCst);
        info!("▶️ Task submission resumed");
    }

    pub fn is_submit_paused(&self) -> bool {
        self.submit_paused.load(Ordering::SeqCst)
    }

    pub fn pause_workers(&self) {
        self.workers_paused.store(true, Ordering::SeqCst);
        info!("⏸️ Workers paused");
    }

    pub fn resume_workers(&self) {
        self.workers_paused.store(false, Ordering::SeqCst);
        info!("▶️ Workers resumed");
    }

    pub fn is_workers_paused(&self) -> bool {
        self.workers_paused.load(Ordering::SeqCst)
    }

    pub async fn workers_pause_status(&self) -> EngineResult<WorkersPauseStatus> {
        if !self.is_workers_paused() {
            return Ok(WorkersPauseStatus::Resumed);
        }

        if self.in_progress_count().await? > 0 {
            Ok(WorkersPauseStatus::Pausing)
        } else {
            Ok(WorkersPauseStatus::Paused)
        }
    }

    pub async fn row(&self, uuid: &str) -> EngineResult<Option<QueueRow>> {
        Ok(self.store.select_by_uuid(uuid).await?)
    }

    pub async fn activity(&self, uuid: &str) -> EngineResult<Option<ActivityRecord>> {
        Ok(self.store.select_activity(uuid).await?)
    }

    pub async fn pending_count(&self) -> EngineResult<usize> {
        Ok(self.store.count_by_status(QueueStatus::Pending).await?)
    }

    pub async fn in_progress_count(&self) -> EngineResult<usize> {
        Ok(self.store.count_by_status(QueueStatus::InProgress).await?)
    }

    /// Pending rows per component, used by callers that want to show queue depth
    pub async fn pending_by_component(
        &self,
        component_uuids: &[String],
    ) -> EngineResult<HashMap<String, usize>> {
        Ok(self.store.count_pending_by_component(component_uuids).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{InMemoryComponentDirectory, InMemoryQueueStore};

    fn queue() -> TaskQueue {
        TaskQueue::new(
            Arc::new(InMemoryQueueStore::new()),
            Arc::new(InMemoryComponentDirectory::new()),
            QueueConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_pause_and_resume_submits() {
        let queue = queue();
        assert!(!queue.is_submit_paused());
        queue.pause_submit();
        assert!(queue.is_submit_paused());
        queue.resume_submit();
        assert!(!queue.is_submit_paused());
    }

    #[tokio::test]
    async fn test_peek_rejects_empty_worker_uuid() {
        let queue = queue();
        let err = queue.peek("", 1).await.unwrap_err();
        assert!(matches!(err, EngineError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_remove_rejects_error_unless_failed() {
        let queue = queue();
        let task = queue
            .submit(queue.prepare_submit().task_type("REPORT").build().unwrap())
            .await
            .unwrap();

        for status in [ActivityStatus::Success, ActivityStatus::Canceled] {
            let err = queue
                .remove(&task, status, Some("boom".to_string()))
                .await
                .unwrap_err();
            assert_eq!(
                err,
                EngineError::validation("Error can be provided only when status is FAILED")
            );
        }

        // Nothing was written by the rejected calls
        assert!(queue.row(task.uuid()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_workers_pause_status_transitions() {
        let queue = queue();
        queue
            .submit(queue.prepare_submit().task_type("REPORT").build().unwrap())
            .await
            .unwrap();

        assert_eq!(
            queue.workers_pause_status().await.unwrap(),
            WorkersPauseStatus::Resumed
        );

        queue.pause_workers();
        assert_eq!(
            queue.workers_pause_status().await.unwrap(),
            WorkersPauseStatus::Paused
        );
        assert!(queue.peek("w1", 1).await.unwrap().is_none());

        queue.resume_workers();
        queue.peek("w1", 1).await.unwrap().unwrap();
        queue.pause_workers();
        assert_eq!(
            queue.workers_pause_status().await.unwrap(),
            WorkersPauseStatus::Pausing
        );

        queue.resume_workers();
        assert_eq!(
            queue.workers_pause_status().await.unwrap(),
            WorkersPauseStatus::Resumed
        );
    }
}
