//! # Processing Scheduler
//!
//! One polling loop per registered worker. Each iteration claims at most one
//! task and reports a [`WorkerOutcome`] that decides how long the loop waits
//! before the next poll:
//!
//! | Outcome | Next poll |
//! |---|---|
//! | `TaskProcessed` | immediately |
//! | `NoTask` | after `poll_delay_ms` |
//! | `Disabled` (workers paused) | after `disabled_delay_ms` |
//! | iteration error | after `poll_delay_ms` |
//!
//! Stopping signals every loop through a `watch` channel. A loop finishes the
//! task it is executing before it exits.

use super::processor::{TaskFailure, TaskProcessor};
use crate::config::SchedulerConfig;
use crate::error::EngineResult;
use crate::models::ActivityStatus;
use crate::queue::TaskQueue;
use crate::registry::{Worker, WorkerRegistry};
use futures::FutureExt;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// `error_type` recorded when a claimed row can't be turned back into a task
pub const TASK_LOAD_ERROR_TYPE: &str = "TASK_LOAD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// A task was claimed and executed
    TaskProcessed,
    /// The queue had nothing claimable
    NoTask,
    /// Workers are paused; nothing was claimed
    Disabled,
}

/// A single worker's claim-execute-record cycle
pub struct WorkerLoop {
    worker: Worker,
    queue: Arc<TaskQueue>,
    registry: Arc<WorkerRegistry>,
    processor: Arc<dyn TaskProcessor>,
}

impl WorkerLoop {
    pub fn new(
        worker: Worker,
        queue: Arc<TaskQueue>,
        registry: Arc<WorkerRegistry>,
        processor: Arc<dyn TaskProcessor>,
    ) -> Self {
        Self {
            worker,
            queue,
            registry,
            processor,
        }
    }

    pub fn worker(&self) -> &Worker {
        &self.worker
    }

    pub async fn run_once(&self) -> EngineResult<WorkerOutcome> {
        if self.queue.is_workers_paused() {
            return Ok(WorkerOutcome::Disabled);
        }

        let worker_uuid = self.worker.uuid();
        let Some(row) = self
            .queue
            .peek(worker_uuid, self.queue.max_execution_count())
            .await?
        else {
            return Ok(WorkerOutcome::NoTask);
        };

        let task = match self.queue.task_for_row(&row).await {
            Ok(task) => task,
            Err(e) => {
                // The row is claimed; leaving it IN_PROGRESS would only get it reset then worn out
                error!(
                    task_uuid = %row.uuid,
                    worker_uuid = %worker_uuid,
                    error = %e,
                    "Failed to load claimed task"
                );
                let message = e.to_string();
                if let Err(fail_error) = self
                    .queue
                    .fail(&row, Some(TASK_LOAD_ERROR_TYPE), Some(message.as_str()))
                    .await
                {
                    warn!(
                        task_uuid = %row.uuid,
                        error = %fail_error,
                        "Could not mark task as failed"
                    );
                }
                return Err(e);
            }
        };
        self.registry.mark_in_progress(worker_uuid, task.clone());

        let result = AssertUnwindSafe(self.processor.process(&task))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(TaskFailure::new("task processor panicked")));

        self.registry.clear_in_progress(worker_uuid);

        match result {
            Ok(()) => {
                self.queue.remove(&task, ActivityStatus::Success, None).await?;
            }
            Err(failure) => {
                warn!(
                    task_uuid = %task.uuid(),
                    worker_uuid = %worker_uuid,
                    error = %failure,
                    "Task failed"
                );
                self.queue
                    .remove(&task, ActivityStatus::Failed, Some(failure.message))
                    .await?;
            }
        }

        Ok(WorkerOutcome::TaskProcessed)
    }
}

struct RunningLoops {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

pub struct ProcessingScheduler {
    config: SchedulerConfig,
    queue: Arc<TaskQueue>,
    registry: Arc<WorkerRegistry>,
    processor: Arc<dyn TaskProcessor>,
    running: Mutex<Option<RunningLoops>>,
}

impl std::fmt::Debug for ProcessingScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingScheduler")
            .field("config", &self.config)
            .field("worker_count", &self.registry.len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl ProcessingScheduler {
    pub fn new(
        config: SchedulerConfig,
        queue: Arc<TaskQueue>,
        registry: Arc<WorkerRegistry>,
        processor: Arc<dyn TaskProcessor>,
    ) -> Self {
        Self {
            config,
            queue,
            registry,
            processor,
            running: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Spawn one loop per worker; a second call while running does nothing
    pub fn start(&self) {
        let mut running = self.running.lock();
        if running.is_some() {
            warn!("Processing scheduler already running");
            return;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handles = self
            .registry
            .workers()
            .iter()
            .map(|worker| {
                let worker_loop = WorkerLoop::new(
                    worker.clone(),
                    Arc::clone(&self.queue),
                    Arc::clone(&self.registry),
                    Arc::clone(&self.processor),
                );
                tokio::spawn(poll_loop(
                    worker_loop,
                    self.config.clone(),
                    shutdown_rx.clone(),
                ))
            })
            .collect::<Vec<_>>();

        info!(
            worker_count = handles.len(),
            poll_delay_ms = self.config.poll_delay_ms,
            "🚀 Processing scheduler started"
        );
        *running = Some(RunningLoops { shutdown, handles });
    }

    /// Signal every loop and wait for them to finish their current task
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            debug!("Processing scheduler not running");
            return;
        };

        // Receivers may already be gone if every loop ended on its own
        let _ = running.shutdown.send(true);

        for handle in running.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker loop ended abnormally");
            }
        }

        info!("🛑 Processing scheduler stopped");
    }
}

async fn poll_loop(
    worker_loop: WorkerLoop,
    config: SchedulerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let worker_uuid = worker_loop.worker().uuid().to_string();
    debug!(worker_uuid = %worker_uuid, "Worker loop started");

    while !*shutdown.borrow() {
        let delay = match worker_loop.run_once().await {
            Ok(WorkerOutcome::TaskProcessed) => None,
            Ok(WorkerOutcome::NoTask) => Some(config.poll_delay()),
            Ok(WorkerOutcome::Disabled) => Some(config.disabled_delay()),
            Err(e) => {
                error!(worker_uuid = %worker_uuid, error = %e, "Worker iteration failed");
                Some(config.poll_delay())
            }
        };

        if !wait(delay, &mut shutdown).await {
            break;
        }
    }

    debug!(worker_uuid = %worker_uuid, "Worker loop exited");
}

/// Sleep for `delay` or until the shutdown flag changes.
///
/// Returns false once the scheduler is gone and no signal can arrive anymore.
async fn wait(delay: Option<Duration>, shutdown: &mut watch::Receiver<bool>) -> bool {
    let Some(delay) = delay else {
        tokio::task::yield_now().await;
        return true;
    };

    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        changed = shutdown.changed() => changed.is_ok(),
    }
}
