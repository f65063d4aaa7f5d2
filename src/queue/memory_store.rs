//! In-process [`QueueStore`]. One mutex guards rows and history together, so
//! every operation (claims included) is atomic with respect to the others.

use super::store::{ArchiveOutcome, QueueStore, StoreError, StoreResult, SubmitOption};
use crate::models::{ActivityOutcome, ActivityRecord, QueueRow, QueueStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Default)]
struct StoreState {
    /// Kept in insertion order; ties on `created_at` resolve to the earliest insert
    rows: Vec<QueueRow>,
    activity: HashMap<String, ActivityRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryQueueStore {
    state: Mutex<StoreState>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every queued row, oldest first
    pub fn all_rows(&self) -> Vec<QueueRow> {
        let mut rows = self.state.lock().rows.clone();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        rows
    }

    fn check_conflicts(state: &StoreState, rows: &[QueueRow]) -> StoreResult<()> {
        let mut seen = HashSet::new();
        for row in rows {
            let queued = state.rows.iter().any(|r| r.uuid == row.uuid);
            if queued || state.activity.contains_key(&row.uuid) || !seen.insert(&row.uuid) {
                return Err(StoreError::conflict(row.uuid.clone()));
            }
        }
        Ok(())
    }

    fn blocks(queued: &QueueRow, candidate: &QueueRow, option: SubmitOption) -> bool {
        match option {
            SubmitOption::UniqueQueuePerComponent => {
                queued.is_pending()
                    && candidate.component_uuid.is_some()
                    && queued.component_uuid == candidate.component_uuid
            }
            SubmitOption::UniqueQueuePerTaskType => {
                queued.task_type == candidate.task_type
                    && queued.component_uuid == candidate.component_uuid
            }
        }
    }

    fn reset_row(row: &mut QueueRow, now: DateTime<Utc>) {
        row.status = QueueStatus::Pending;
        row.worker_uuid = None;
        row.started_at = None;
        row.updated_at = now;
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn insert(&self, rows: Vec<QueueRow>) -> StoreResult<()> {
        let mut state = self.state.lock();
        Self::check_conflicts(&state, &rows)?;
        state.rows.extend(rows);
        Ok(())
    }

    async fn insert_unique(
        &self,
        rows: Vec<QueueRow>,
        option: SubmitOption,
    ) -> StoreResult<HashSet<String>> {
        let mut state = self.state.lock();

        let accepted: Vec<QueueRow> = rows
            .into_iter()
            .filter(|candidate| {
                !state
                    .rows
                    .iter()
                    .any(|queued| Self::blocks(queued, candidate, option))
            })
            .collect();
        Self::check_conflicts(&state, &accepted)?;

        let inserted = accepted.iter().map(|r| r.uuid.clone()).collect();
        state.rows.extend(accepted);
        Ok(inserted)
    }

    async fn select_by_uuid(&self, uuid: &str) -> StoreResult<Option<QueueRow>> {
        Ok(self
            .state
            .lock()
            .rows
            .iter()
            .find(|r| r.uuid == uuid)
            .cloned())
    }

    async fn select_by_status(&self, status: QueueStatus) -> StoreResult<Vec<QueueRow>> {
        let mut rows: Vec<QueueRow> = self
            .state
            .lock()
            .rows
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn count_by_status(&self, status: QueueStatus) -> StoreResult<usize> {
        Ok(self
            .state
            .lock()
            .rows
            .iter()
            .filter(|r| r.status == status)
            .count())
    }

    async fn count_pending_by_component(
        &self,
        component_uuids: &[String],
    ) -> StoreResult<HashMap<String, usize>> {
        let state = self.state.lock();
        let mut counts = HashMap::new();

        for row in state.rows.iter().filter(|r| r.is_pending()) {
            if let Some(component_uuid) = &row.component_uuid {
                if component_uuids.contains(component_uuid) {
                    *counts.entry(component_uuid.clone()).or_insert(0) += 1;
                }
            }
        }

        Ok(counts)
    }

    async fn claim(
        &self,
        worker_uuid: &str,
        max_execution_count: u32,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<QueueRow>> {
        let mut state = self.state.lock();

        for row in state
            .rows
            .iter_mut()
            .filter(|r| r.is_in_progress() && r.worker_uuid.as_deref() == Some(worker_uuid))
        {
            debug!(
                task_uuid = %row.uuid,
                worker_uuid = %worker_uuid,
                "Resetting task left in progress by worker"
            );
            Self::reset_row(row, now);
        }

        let oldest = state
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_pending() && r.execution_count < max_execution_count)
            .min_by(|(_, a), (_, b)| a.created_at.cmp(&b.created_at))
            .map(|(index, _)| index);

        Ok(oldest.map(|index| {
            let row = &mut state.rows[index];
            row.status = QueueStatus::InProgress;
            row.worker_uuid = Some(worker_uuid.to_string());
            row.execution_count += 1;
            row.started_at = Some(now);
            row.updated_at = now;
            row.clone()
        }))
    }

    async fn archive(
        &self,
        uuid: &str,
        required_status: Option<QueueStatus>,
        outcome: ActivityOutcome,
    ) -> StoreResult<ArchiveOutcome> {
        let mut state = self.state.lock();

        let Some(index) = state.rows.iter().position(|r| r.uuid == uuid) else {
            return Ok(ArchiveOutcome::NotFound);
        };

        let actual = state.rows[index].status;
        if required_status.is_some_and(|required| required != actual) {
            return Ok(ArchiveOutcome::StatusMismatch { actual });
        }

        let row = state.rows.remove(index);
        let record = ActivityRecord::from_row(&row, outcome);
        state.activity.insert(record.uuid.clone(), record.clone());

        Ok(ArchiveOutcome::Archived(record))
    }

    async fn select_activity(&self, uuid: &str) -> StoreResult<Option<ActivityRecord>> {
        Ok(self.state.lock().activity.get(uuid).cloned())
    }

    async fn reset_in_progress_except(
        &self,
        known_worker_uuids: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> StoreResult<usize> {
        let mut state = self.state.lock();
        let mut reset = 0;

        for row in state.rows.iter_mut().filter(|r| r.is_in_progress()) {
            let known = row
                .worker_uuid
                .as_ref()
                .is_some_and(|w| known_worker_uuids.contains(w));
            if !known {
                Self::reset_row(row, now);
                reset += 1;
            }
        }

        Ok(reset)
    }
}
