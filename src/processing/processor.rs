//! Execution seam: what a worker does with a claimed task is up to the
//! embedding application.

use crate::models::Task;
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Failure reported by a [`TaskProcessor`]; the message lands in the activity record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Task execution failed: {message}")]
pub struct TaskFailure {
    pub message: String,
}

impl TaskFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait TaskProcessor: Send + Sync {
    async fn process(&self, task: &Task) -> Result<(), TaskFailure>;
}

/// Processor that only logs the task and reports success
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingTaskProcessor;

#[async_trait]
impl TaskProcessor for LoggingTaskProcessor {
    async fn process(&self, task: &Task) -> Result<(), TaskFailure> {
        info!(
            task_uuid = %task.uuid(),
            task_type = %task.task_type(),
            component_key = task.component_key(),
            organization_id = %task.organization_id(),
            "⚙️ Processing task"
        );
        Ok(())
    }
}
