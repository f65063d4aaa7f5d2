//! # Cluster Coordination
//!
//! Cluster-wide worker identity and cross-process mutual exclusion.
//!
//! ## Variants
//!
//! - **StandaloneCoordinator**: one process is the whole engine; no external
//!   service, locks never contend
//! - **ClusteredCoordinator**: several processes share one engine through a
//!   [`MembershipProvider`]; worker UUIDs live in a replicated map filtered
//!   by live membership
//!
//! Both implement [`ClusterCoordinator`], so the lifecycle and diagnostics
//! code never knows which topology it runs in.

pub mod clustered;
pub mod coordinator;
pub mod errors;
pub mod in_memory;
pub mod lock;
pub mod membership;
pub mod standalone;

pub use clustered::ClusteredCoordinator;
pub use coordinator::{coordinator_for, ClusterCoordinator};
pub use errors::{CoordinationError, CoordinationResult};
pub use in_memory::{GridLock, GridMember, InMemoryGrid};
pub use lock::{ClusterLock, StandaloneLock};
pub use membership::{MemberId, MembershipProvider, ReplicatedSetMap};
pub use standalone::StandaloneCoordinator;
