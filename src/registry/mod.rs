//! # Registry
//!
//! Process-local [`WorkerRegistry`]: the execution slots whose UUIDs the
//! cluster coordinator publishes and whose loops the processing scheduler
//! drives.

pub mod worker_registry;

pub use worker_registry::{Worker, WorkerRegistry};
