//! # Membership Provider
//!
//! The seam between the clustered coordinator and whatever data grid keeps
//! the processes of one engine together. The provider supplies four things:
//! the local identity, the live member set, named replicated maps and named
//! locks. Consistency of the replicated state is the provider's concern.

use super::errors::CoordinationResult;
use super::lock::ClusterLock;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Identity of one process in the cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub String);

impl MemberId {
    /// A fresh random identity
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MemberId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Replicated map from member identity to a set of strings
#[async_trait]
pub trait ReplicatedSetMap: Send + Sync {
    /// Replace the set stored under `key`
    async fn put(&self, key: &MemberId, values: HashSet<String>) -> CoordinationResult<()>;

    async fn get(&self, key: &MemberId) -> CoordinationResult<Option<HashSet<String>>>;

    /// Remove `key`, returning what it held
    async fn remove(&self, key: &MemberId) -> CoordinationResult<Option<HashSet<String>>>;

    /// Every entry physically present, including those of departed members
    async fn entries(&self) -> CoordinationResult<HashMap<MemberId, HashSet<String>>>;
}

#[async_trait]
pub trait MembershipProvider: Send + Sync {
    fn local_member_id(&self) -> &MemberId;

    /// Members currently connected, the local one included
    async fn live_member_ids(&self) -> CoordinationResult<HashSet<MemberId>>;

    fn replicated_set_map(&self, name: &str) -> CoordinationResult<Arc<dyn ReplicatedSetMap>>;

    fn lock(&self, name: &str) -> CoordinationResult<Arc<dyn ClusterLock>>;
}
