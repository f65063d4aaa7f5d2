//! # Engine Configuration
//!
//! Typed configuration for one compute engine process. Every section has
//! defaults, so an empty file (or no file at all) yields a working
//! single-process engine.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use compute_engine::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::load(None)?;
//! println!("workers: {}", config.workers.count);
//! # Ok(())
//! # }
//! ```

pub mod loader;

use crate::constants::defaults;
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Local execution slots
    pub workers: WorkersConfig,

    /// Queue submission and claiming settings
    pub queue: QueueConfig,

    /// Worker polling cadence
    pub scheduler: SchedulerConfig,

    /// Deployment topology
    pub cluster: ClusterConfig,

    /// Queue cleaning maintenance job
    pub clean_job: CleanJobConfig,

    /// Log output
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Validate cross-field constraints the types can't express
    pub fn validate(&self) -> EngineResult<()> {
        if self.workers.count == 0 || self.workers.count > defaults::MAX_WORKER_COUNT {
            return Err(EngineError::configuration(format!(
                "workers.count must be between 1 and {}, got {}",
                defaults::MAX_WORKER_COUNT,
                self.workers.count
            )));
        }

        if self.queue.max_execution_count == 0 {
            return Err(EngineError::configuration(
                "queue.max_execution_count must be greater than 0",
            ));
        }

        if self.queue.default_organization_id.trim().is_empty() {
            return Err(EngineError::configuration(
                "queue.default_organization_id can't be empty",
            ));
        }

        if matches!(&self.queue.node_name, Some(name) if name.trim().is_empty()) {
            return Err(EngineError::configuration("queue.node_name can't be empty"));
        }

        if self.scheduler.poll_delay_ms == 0 || self.scheduler.disabled_delay_ms == 0 {
            return Err(EngineError::configuration(
                "scheduler delays must be greater than 0",
            ));
        }

        if self.clean_job.enabled && self.clean_job.interval_ms == 0 {
            return Err(EngineError::configuration(
                "clean_job.interval_ms must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Number of workers in this process
    pub count: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            count: defaults::WORKER_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Rows that already ran this many times are never peeked again
    pub max_execution_count: u32,

    /// Organization tasks are attributed to when their component is unknown
    pub default_organization_id: String,

    /// Recorded on every activity record this process writes
    pub node_name: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_execution_count: defaults::MAX_EXECUTION_COUNT,
            default_organization_id: defaults::DEFAULT_ORGANIZATION_ID.to_string(),
            node_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Delay after a poll that found nothing to do
    pub poll_delay_ms: u64,

    /// Delay while workers are paused
    pub disabled_delay_ms: u64,
}

impl SchedulerConfig {
    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.poll_delay_ms)
    }

    pub fn disabled_delay(&self) -> Duration {
        Duration::from_millis(self.disabled_delay_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_delay_ms: defaults::POLL_DELAY_MS,
            disabled_delay_ms: defaults::DISABLED_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Several processes share one logical engine
    pub enabled: bool,

    /// Explicit member identity; a random one is generated when empty
    pub member_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CleanJobConfig {
    pub enabled: bool,
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
}

impl CleanJobConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for CleanJobConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_ms: defaults::CLEAN_JOB_INITIAL_DELAY_MS,
            interval_ms: defaults::CLEAN_JOB_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json: false,
        }
    }
}
