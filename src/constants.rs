//! # System Constants
//!
//! Names shared by every process of one logical engine, plus the defaults
//! used when configuration leaves a value unset.

/// Names of shared objects in the membership/data-grid collaborator.
///
/// Every cooperating process must agree on these, so they are fixed here
/// rather than configurable.
pub mod cluster_objects {
    /// Replicated map: member identity -> worker UUIDs published by that member
    pub const WORKER_UUIDS: &str = "compute_engine.worker_uuids";
    /// Distributed lock guarding the queue cleaning maintenance job
    pub const CLEAN_JOB_LOCK: &str = "compute_engine.clean_job_lock";
}

/// Well-known task types
pub mod task_types {
    pub const REPORT: &str = "REPORT";
    pub const PROJECT_EXPORT: &str = "PROJECT_EXPORT";
    pub const VIEW_REFRESH: &str = "VIEW_REFRESH";
}

pub mod defaults {
    pub const WORKER_COUNT: usize = 1;
    pub const MAX_WORKER_COUNT: usize = 10;
    pub const MAX_EXECUTION_COUNT: u32 = 1;
    pub const DEFAULT_ORGANIZATION_ID: &str = "default-organization";
    pub const POLL_DELAY_MS: u64 = 2_000;
    pub const DISABLED_DELAY_MS: u64 = 10_000;
    pub const CLEAN_JOB_INITIAL_DELAY_MS: u64 = 0;
    pub const CLEAN_JOB_INTERVAL_MS: u64 = 60_000;
    pub const LOG_LEVEL: &str = "info";
    pub const ENV_PREFIX: &str = "ENGINE";
}
