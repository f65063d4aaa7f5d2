//! # Worker Registry
//!
//! The local execution slots of this process. Each [`Worker`] gets a v4 UUID
//! at construction; the set never changes for the lifetime of the process, so
//! the UUIDs published to the cluster stay valid until the process leaves.
//!
//! The registry also tracks which task each worker is currently executing,
//! for diagnostics.

use crate::models::Task;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// One execution slot: a stable identity used as `worker_uuid` when claiming rows
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Worker {
    uuid: String,
    ordinal: usize,
}

impl Worker {
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Position of the worker in the registry, starting at 0
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

#[derive(Debug)]
pub struct WorkerRegistry {
    workers: Vec<Worker>,
    in_progress: DashMap<String, Task>,
}

impl WorkerRegistry {
    pub fn new(count: usize) -> Self {
        let workers = (0..count)
            .map(|ordinal| Worker {
                uuid: Uuid::new_v4().to_string(),
                ordinal,
            })
            .collect::<Vec<_>>();

        debug!(worker_count = workers.len(), "Worker registry created");

        Self {
            workers,
            in_progress: DashMap::new(),
        }
    }

    /// Workers in ordinal order
    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn worker_uuids(&self) -> HashSet<String> {
        self.workers.iter().map(|w| w.uuid.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn contains(&self, worker_uuid: &str) -> bool {
        self.workers.iter().any(|w| w.uuid == worker_uuid)
    }

    pub(crate) fn mark_in_progress(&self, worker_uuid: &str, task: Task) {
        self.in_progress.insert(worker_uuid.to_string(), task);
    }

    pub(crate) fn clear_in_progress(&self, worker_uuid: &str) {
        self.in_progress.remove(worker_uuid);
    }

    /// The task `worker_uuid` is executing right now, if any
    pub fn task_in_progress(&self, worker_uuid: &str) -> Option<Task> {
        self.in_progress
            .get(worker_uuid)
            .map(|entry| entry.value().clone())
    }

    /// Number of workers currently executing a task
    pub fn busy_count(&self) -> usize {
        self.in_progress.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workers_have_distinct_stable_uuids() {
        let registry = WorkerRegistry::new(3);
        assert_eq!(registry.len(), 3);

        let uuids = registry.worker_uuids();
        assert_eq!(uuids.len(), 3);
        assert_eq!(uuids, registry.worker_uuids());

        let ordinals: Vec<usize> = registry.workers().iter().map(Worker::ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
        assert!(registry.workers().iter().all(|w| registry.contains(w.uuid())));
        assert!(!registry.contains("unknown"));
    }

    #[test]
    fn test_in_progress_tracking() {
        let registry = WorkerRegistry::new(1);
        let worker_uuid = registry.workers()[0].uuid().to_string();
        let task = Task::builder()
            .organization_id("org1")
            .uuid("t1")
            .task_type("REPORT")
            .build()
            .unwrap();

        assert!(registry.task_in_progress(&worker_uuid).is_none());
        registry.mark_in_progress(&worker_uuid, task.clone());
        assert_eq!(registry.task_in_progress(&worker_uuid), Some(task));
        assert_eq!(registry.busy_count(), 1);

        registry.clear_in_progress(&worker_uuid);
        assert_eq!(registry.busy_count(), 0);
    }
}
