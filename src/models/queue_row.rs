//! # Queue Row and Activity Models
//!
//! A [`QueueRow`] lives in the durable queue while its task is PENDING or
//! IN_PROGRESS. Reaching a terminal [`ActivityStatus`] removes the row and
//! writes exactly one [`ActivityRecord`] for the task uuid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    /// Waiting to be claimed by a worker
    Pending,
    /// Claimed by exactly one worker
    InProgress,
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
        }
    }
}

impl std::str::FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            _ => Err(format!("Invalid queue status: {s}")),
        }
    }
}

/// Terminal outcome recorded in the activity history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityStatus {
    Success,
    Failed,
    Canceled,
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
            Self::Canceled => write!(f, "CANCELED"),
        }
    }
}

impl std::str::FromStr for ActivityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "CANCELED" => Ok(Self::Canceled),
            _ => Err(format!("Invalid activity status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRow {
    pub uuid: String,
    pub task_type: String,
    pub component_uuid: Option<String>,
    pub submitter_login: Option<String>,
    pub status: QueueStatus,
    /// Worker that last claimed the row
    pub worker_uuid: Option<String>,
    /// Number of times the row has been claimed
    pub execution_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

impl QueueRow {
    /// A fresh PENDING row that has never been claimed
    pub fn pending(
        uuid: impl Into<String>,
        task_type: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            task_type: task_type.into(),
            component_uuid: None,
            submitter_login: None,
            status: QueueStatus::Pending,
            worker_uuid: None,
            execution_count: 0,
            created_at,
            updated_at: created_at,
            started_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == QueueStatus::Pending
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == QueueStatus::InProgress
    }
}

/// What a terminal transition should record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityOutcome {
    pub status: ActivityStatus,
    /// Short machine-readable failure class, e.g. `TIMEOUT`
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    /// Node that wrote the outcome, when the deployment names its nodes
    pub node_name: Option<String>,
    pub executed_at: DateTime<Utc>,
}

impl ActivityOutcome {
    pub fn new(status: ActivityStatus, executed_at: DateTime<Utc>) -> Self {
        Self {
            status,
            error_type: None,
            error_message: None,
            node_name: None,
            executed_at,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_node_name(mut self, node_name: Option<&str>) -> Self {
        self.node_name = node_name.map(str::to_string);
        self
    }
}

/// History entry written once per task uuid when its row leaves the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub uuid: String,
    pub task_type: String,
    pub component_uuid: Option<String>,
    pub submitter_login: Option<String>,
    pub status: ActivityStatus,
    pub worker_uuid: Option<String>,
    pub execution_count: u32,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub executed_at: DateTime<Utc>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub node_name: Option<String>,
}

impl ActivityRecord {
    pub fn from_row(row: &QueueRow, outcome: ActivityOutcome) -> Self {
        Self {
            uuid: row.uuid.clone(),
            task_type: row.task_type.clone(),
            component_uuid: row.component_uuid.clone(),
            submitter_login: row.submitter_login.clone(),
            status: outcome.status,
            worker_uuid: row.worker_uuid.clone(),
            execution_count: row.execution_count,
            submitted_at: row.created_at,
            started_at: row.started_at,
            executed_at: outcome.executed_at,
            error_type: outcome.error_type,
            error_message: outcome.error_message,
            node_name: outcome.node_name,
        }
    }
}
