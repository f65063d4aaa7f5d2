//! # Task Queue
//!
//! Durable FIFO queue of background tasks.
//!
//! - [`TaskQueue`] - submission, claim, cancellation and pause control
//! - [`QueueStore`] - persistence collaborator with the atomic claim
//! - [`ComponentDirectory`] - resolves component uuids for new tasks
//!
//! In-memory implementations of both collaborators are provided for tests
//! and single-process deployments.

pub mod directory;
pub mod memory_store;
pub mod store;
pub mod task_queue;

pub use directory::{ComponentDirectory, InMemoryComponentDirectory};
pub use memory_store::InMemoryQueueStore;
pub use store::{ArchiveOutcome, QueueStore, StoreError, StoreResult, SubmitOption};
pub use task_queue::{TaskQueue, WorkersPauseStatus};
