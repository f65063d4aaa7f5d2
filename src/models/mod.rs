//! # Models
//!
//! Value types shared by the queue, the workers and the persistence
//! collaborator.
//!
//! - [`Task`] / [`TaskSubmission`] - immutable task and the request creating it
//! - [`QueueRow`] - durable queue entry (PENDING / IN_PROGRESS)
//! - [`ActivityRecord`] - terminal history entry (SUCCESS / FAILED / CANCELED)
//! - [`Component`] - component directory entry

pub mod component;
pub mod queue_row;
pub mod task;

pub use component::Component;
pub use queue_row::{ActivityOutcome, ActivityRecord, ActivityStatus, QueueRow, QueueStatus};
pub use task::{Task, TaskBuilder, TaskSubmission, TaskSubmissionBuilder};
