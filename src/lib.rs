#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Compute Engine
//!
//! Durable background task queue with a local worker pool and cluster-wide
//! worker coordination.
//!
//! ## Overview
//!
//! Callers submit tasks to a [`TaskQueue`](queue::TaskQueue); local workers
//! claim them one at a time and record a terminal outcome. When several
//! processes cooperate as one logical engine, the
//! [`ClusterCoordinator`](cluster::ClusterCoordinator) keeps every process
//! aware of which worker identities exist cluster-wide, and provides the lock
//! that keeps the queue maintenance job a singleton.
//!
//! ## Module Organization
//!
//! - [`models`] - tasks, queue rows, activity records
//! - [`queue`] - submission, claim, cancellation and pause control
//! - [`registry`] - the local worker slots
//! - [`cluster`] - standalone and clustered coordinators, membership seam
//! - [`processing`] - worker loops and the clean job
//! - [`lifecycle`] - start/stop/shutdown state machine and engine wiring
//! - [`diagnostics`] - engine snapshot
//! - [`config`] / [`logging`] / [`error`] - ambient plumbing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use compute_engine::lifecycle::ComputeEngine;
//!
//! # async fn example() -> compute_engine::EngineResult<()> {
//! let engine = ComputeEngine::builder().build()?;
//! engine.startup().await?;
//!
//! let queue = engine.queue();
//! let submission = queue.prepare_submit().task_type("REPORT").build()?;
//! let task = queue.submit(submission).await?;
//! println!("queued {}", task.uuid());
//!
//! engine.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod processing;
pub mod queue;
pub mod registry;

pub use config::{ConfigLoader, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use lifecycle::{ComputeEngine, EngineState};
pub use models::{Task, TaskSubmission};
