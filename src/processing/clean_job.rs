//! # Queue Cleaning Job
//!
//! Singleton maintenance routine, guarded by the cluster clean-job lock so
//! that one process at a time runs it:
//!
//! 1. put back to PENDING every IN_PROGRESS task whose worker is no longer
//!    visible in the cluster (its process died mid-task)
//! 2. cancel PENDING tasks that reached the execution limit
//!
//! A process that finds the lock taken skips the round.
//!
//! The periodic loop only checks its stop signal between rounds. A round
//! in flight always runs through to releasing the lock.

use crate::cluster::ClusterCoordinator;
use crate::config::CleanJobConfig;
use crate::error::EngineResult;
use crate::queue::TaskQueue;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CleanJobReport {
    /// Another process holds the lock
    Skipped,
    Cleaned {
        reset_tasks: usize,
        canceled_worn_outs: usize,
    },
}

struct RunningJob {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct CleanJob {
    queue: Arc<TaskQueue>,
    coordinator: Arc<dyn ClusterCoordinator>,
    config: CleanJobConfig,
    running: Mutex<Option<RunningJob>>,
}

impl std::fmt::Debug for CleanJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanJob")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}

impl CleanJob {
    pub fn new(
        queue: Arc<TaskQueue>,
        coordinator: Arc<dyn ClusterCoordinator>,
        config: CleanJobConfig,
    ) -> Self {
        Self {
            queue,
            coordinator,
            config,
            running: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    pub async fn run_once(&self) -> EngineResult<CleanJobReport> {
        let lock = self.coordinator.acquire_clean_job_lock().await?;
        if !lock.try_lock().await? {
            debug!(lock = %lock.name(), "Clean job lock held elsewhere - skipping");
            return Ok(CleanJobReport::Skipped);
        }

        let report = self.clean().await;

        if let Err(e) = lock.unlock().await {
            warn!(lock = %lock.name(), error = %e, "Failed to release clean job lock");
        }

        report
    }

    async fn clean(&self) -> EngineResult<CleanJobReport> {
        let known_workers = self.coordinator.worker_uuids().await?;
        let reset_tasks = self
            .queue
            .reset_tasks_with_unknown_worker_uuids(&known_workers)
            .await?;
        let canceled_worn_outs = self.queue.cancel_worn_outs().await?;

        Ok(CleanJobReport::Cleaned {
            reset_tasks,
            canceled_worn_outs,
        })
    }

    /// Run the job every `interval_ms` after `initial_delay_ms` until [`stop`](Self::stop)
    pub fn start(self: &Arc<Self>) {
        let mut running = self.running.lock();
        if running.is_some() {
            warn!("Queue clean job already running");
            return;
        }

        info!(
            initial_delay_ms = self.config.initial_delay_ms,
            interval_ms = self.config.interval_ms,
            "🧹 Starting queue clean job"
        );

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(Arc::clone(self).periodic(shutdown_rx));
        *running = Some(RunningJob { shutdown, handle });
    }

    /// Signal the loop and wait for the round in flight, if any, to finish
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            debug!("Queue clean job not running");
            return;
        };

        let _ = running.shutdown.send(true);
        if let Err(e) = running.handle.await {
            error!(error = %e, "Queue clean job ended abnormally");
        }
        info!("🛑 Queue clean job stopped");
    }

    async fn periodic(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tokio::select! {
            _ = tokio::time::sleep(self.config.initial_delay()) => {}
            _ = shutdown.changed() => return,
        }

        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => return,
            }
            if *shutdown.borrow() {
                return;
            }

            match self.run_once().await {
                Ok(CleanJobReport::Cleaned {
                    reset_tasks,
                    canceled_worn_outs,
                }) if reset_tasks + canceled_worn_outs > 0 => {
                    info!(reset_tasks, canceled_worn_outs, "Queue cleaned");
                }
                Ok(report) => debug!(?report, "Clean job round finished"),
                Err(e) => error!(error = %e, "Clean job round failed"),
            }
        }
    }
}
