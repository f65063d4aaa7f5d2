//! # Processing
//!
//! Everything that runs in the background once the engine is started:
//!
//! - [`ProcessingScheduler`] - one polling loop per local worker
//! - [`CleanJob`] - periodic queue maintenance under the cluster lock
//! - [`TaskProcessor`] - the execution logic supplied by the application

pub mod clean_job;
pub mod processor;
pub mod scheduler;

pub use clean_job::{CleanJob, CleanJobReport};
pub use processor::{LoggingTaskProcessor, TaskFailure, TaskProcessor};
pub use scheduler::{ProcessingScheduler, WorkerLoop, WorkerOutcome};
