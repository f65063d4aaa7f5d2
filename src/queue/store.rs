//! # Persistence Collaborator
//!
//! The durable queue table and its activity history sit behind
//! [`QueueStore`]. The engine relies on one property it does not implement
//! itself: [`QueueStore::claim`] hands a given PENDING row to at most one
//! caller, however many workers call it concurrently.

use crate::models::{ActivityOutcome, ActivityRecord, QueueRow, QueueStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Row already exists: {uuid}")]
    Conflict { uuid: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn conflict(uuid: impl Into<String>) -> Self {
        Self::Conflict { uuid: uuid.into() }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Optional constraints on submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitOption {
    /// Skip a submission whose component already has a PENDING task
    UniqueQueuePerComponent,
    /// Skip a submission when a task of the same type for the same component
    /// (or for no component) is already queued, pending or in progress
    UniqueQueuePerTaskType,
}

/// Result of moving a row from the queue to the activity history
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveOutcome {
    /// Row removed and the activity record written
    Archived(ActivityRecord),
    /// No row with that uuid is queued
    NotFound,
    /// Row exists but is not in the required status; nothing changed
    StatusMismatch { actual: QueueStatus },
}

#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Insert all rows as one batch; fails without writing anything on a duplicate uuid
    async fn insert(&self, rows: Vec<QueueRow>) -> StoreResult<()>;

    /// Insert the rows `option` lets through, checked against the rows queued
    /// before the call, and return the uuids written.
    ///
    /// The check and the write are one atomic step, so two concurrent calls
    /// can't both enqueue for the same key.
    async fn insert_unique(
        &self,
        rows: Vec<QueueRow>,
        option: SubmitOption,
    ) -> StoreResult<HashSet<String>>;

    async fn select_by_uuid(&self, uuid: &str) -> StoreResult<Option<QueueRow>>;

    /// Rows in the given status, oldest first
    async fn select_by_status(&self, status: QueueStatus) -> StoreResult<Vec<QueueRow>>;

    async fn count_by_status(&self, status: QueueStatus) -> StoreResult<usize>;

    /// Number of PENDING rows per component, for the given component uuids
    async fn count_pending_by_component(
        &self,
        component_uuids: &[String],
    ) -> StoreResult<HashMap<String, usize>>;

    /// Atomically claim the oldest claimable PENDING row for `worker_uuid`.
    ///
    /// Rows already IN_PROGRESS for that worker are first reset to PENDING,
    /// then the oldest PENDING row whose `execution_count` is below
    /// `max_execution_count` moves to IN_PROGRESS with the worker recorded
    /// and its execution count incremented.
    async fn claim(
        &self,
        worker_uuid: &str,
        max_execution_count: u32,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<QueueRow>>;

    /// Remove a row and write its single activity record.
    ///
    /// With `required_status` set, a row in any other status is left untouched.
    async fn archive(
        &self,
        uuid: &str,
        required_status: Option<QueueStatus>,
        outcome: ActivityOutcome,
    ) -> StoreResult<ArchiveOutcome>;

    async fn select_activity(&self, uuid: &str) -> StoreResult<Option<ActivityRecord>>;

    /// Reset to PENDING every IN_PROGRESS row whose worker is not in `known_worker_uuids`
    async fn reset_in_progress_except(
        &self,
        known_worker_uuids: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> StoreResult<usize>;
}
