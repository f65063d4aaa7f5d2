//! # In-Memory Data Grid
//!
//! A process-local stand-in for a real membership/data-grid service. Several
//! members join one [`InMemoryGrid`]; each [`GridMember`] is a
//! [`MembershipProvider`] that sees the same live set, replicated maps and
//! locks as the others.
//!
//! Departure comes in two flavours:
//! - [`GridMember::leave`] drops the member from the live set and releases
//!   its locks, but its published map entries stay behind, as they would
//!   after a crash until the real grid expires them
//! - [`GridMember::shutdown`] does the same and then fails every further call
//!   with `ServiceInactive`

use super::errors::{CoordinationError, CoordinationResult};
use super::lock::ClusterLock;
use super::membership::{MemberId, MembershipProvider, ReplicatedSetMap};
use crate::logging::log_cluster_operation;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore, TryAcquireError};

type SetEntries = DashMap<MemberId, HashSet<String>>;

#[derive(Debug)]
struct Holder {
    member: MemberId,
    _permit: OwnedSemaphorePermit,
}

#[derive(Debug)]
struct LockState {
    semaphore: Arc<Semaphore>,
    holder: Mutex<Option<Holder>>,
    condition: Arc<Notify>,
}

impl LockState {
    fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            holder: Mutex::new(None),
            condition: Arc::new(Notify::new()),
        }
    }
}

#[derive(Debug, Default)]
struct GridState {
    live: Mutex<HashSet<MemberId>>,
    maps: DashMap<String, Arc<SetEntries>>,
    locks: DashMap<String, Arc<LockState>>,
    partitioned: AtomicBool,
}

impl GridState {
    fn release_locks_of(&self, member: &MemberId) {
        for entry in self.locks.iter() {
            let mut holder = entry.value().holder.lock();
            if holder.as_ref().is_some_and(|h| &h.member == member) {
                *holder = None;
            }
        }
    }
}

/// One member's view of the grid
#[derive(Debug, Clone)]
struct Connection {
    grid: Arc<GridState>,
    active: Arc<AtomicBool>,
}

impl Connection {
    fn check(&self, operation: &str) -> CoordinationResult<()> {
        if !self.active.load(Ordering::SeqCst) {
            return Err(CoordinationError::service_inactive(operation));
        }
        if self.grid.partitioned.load(Ordering::SeqCst) {
            return Err(CoordinationError::unreachable(format!(
                "grid partitioned during {operation}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryGrid {
    state: Arc<GridState>,
}

impl InMemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a member; joining again with a known identity reconnects it
    pub fn join(&self, member_id: impl Into<MemberId>) -> GridMember {
        let id = member_id.into();
        self.state.live.lock().insert(id.clone());
        log_cluster_operation("join", id.as_str(), None);

        GridMember {
            id,
            connection: Connection {
                grid: Arc::clone(&self.state),
                active: Arc::new(AtomicBool::new(true)),
            },
        }
    }

    pub fn live_members(&self) -> HashSet<MemberId> {
        self.state.live.lock().clone()
    }

    /// Make every call from every member fail with `Unreachable` until [`heal`](Self::heal)
    pub fn partition(&self) {
        self.state.partitioned.store(true, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.state.partitioned.store(false, Ordering::SeqCst);
    }

    /// Member currently holding the named lock
    pub fn lock_holder(&self, name: &str) -> Option<MemberId> {
        self.state
            .locks
            .get(name)
            .and_then(|lock| {
                let holder = lock.holder.lock();
                holder.as_ref().map(|h| h.member.clone())
            })
    }
}

#[derive(Debug)]
pub struct GridMember {
    id: MemberId,
    connection: Connection,
}

impl GridMember {
    /// Disconnect without cleaning up published entries
    pub fn leave(&self) {
        self.connection.grid.live.lock().remove(&self.id);
        self.connection.grid.release_locks_of(&self.id);
        log_cluster_operation("leave", self.id.as_str(), None);
    }

    /// Disconnect and refuse every later call
    pub fn shutdown(&self) {
        self.connection.active.store(false, Ordering::SeqCst);
        self.leave();
    }

    pub fn is_active(&self) -> bool {
        self.connection.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MembershipProvider for GridMember {
    fn local_member_id(&self) -> &MemberId {
        &self.id
    }

    async fn live_member_ids(&self) -> CoordinationResult<HashSet<MemberId>> {
        self.connection.check("live_member_ids")?;
        Ok(self.connection.grid.live.lock().clone())
    }

    fn replicated_set_map(&self, name: &str) -> CoordinationResult<Arc<dyn ReplicatedSetMap>> {
        self.connection.check("replicated_set_map")?;
        let entries = self
            .connection
            .grid
            .maps
            .entry(name.to_string())
            .or_default()
            .clone();

        Ok(Arc::new(GridSetMap {
            entries,
            connection: self.connection.clone(),
        }))
    }

    fn lock(&self, name: &str) -> CoordinationResult<Arc<dyn ClusterLock>> {
        self.connection.check("lock")?;
        let state = self
            .connection
            .grid
            .locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(LockState::new()))
            .clone();

        Ok(Arc::new(GridLock {
            name: name.to_string(),
            member: self.id.clone(),
            state,
            connection: self.connection.clone(),
        }))
    }
}

struct GridSetMap {
    entries: Arc<SetEntries>,
    connection: Connection,
}

#[async_trait]
impl ReplicatedSetMap for GridSetMap {
    async fn put(&self, key: &MemberId, values: HashSet<String>) -> CoordinationResult<()> {
        self.connection.check("put")?;
        self.entries.insert(key.clone(), values);
        Ok(())
    }

    async fn get(&self, key: &MemberId) -> CoordinationResult<Option<HashSet<String>>> {
        self.connection.check("get")?;
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn remove(&self, key: &MemberId) -> CoordinationResult<Option<HashSet<String>>> {
        self.connection.check("remove")?;
        Ok(self.entries.remove(key).map(|(_, values)| values))
    }

    async fn entries(&self) -> CoordinationResult<HashMap<MemberId, HashSet<String>>> {
        self.connection.check("entries")?;
        Ok(self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }
}

/// Named grid lock as seen by one member. Waiters are served in FIFO order.
#[derive(Debug)]
pub struct GridLock {
    name: String,
    member: MemberId,
    state: Arc<LockState>,
    connection: Connection,
}

impl GridLock {
    fn hold(&self, permit: OwnedSemaphorePermit) -> CoordinationResult<()> {
        // The member may have shut down while waiting; dropping the permit frees the lock
        self.connection.check("lock")?;
        *self.state.holder.lock() = Some(Holder {
            member: self.member.clone(),
            _permit: permit,
        });
        Ok(())
    }
}

#[async_trait]
impl ClusterLock for GridLock {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lock(&self) -> CoordinationResult<()> {
        self.connection.check("lock")?;
        let permit = Arc::clone(&self.state.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| CoordinationError::service_inactive("lock"))?;
        self.hold(permit)
    }

    async fn try_lock(&self) -> CoordinationResult<bool> {
        self.connection.check("try_lock")?;
        match Arc::clone(&self.state.semaphore).try_acquire_owned() {
            Ok(permit) => self.hold(permit).map(|_| true),
            Err(TryAcquireError::NoPermits) => Ok(false),
            Err(TryAcquireError::Closed) => Err(CoordinationError::service_inactive("try_lock")),
        }
    }

    async fn try_lock_for(&self, timeout: Duration) -> CoordinationResult<bool> {
        self.connection.check("try_lock_for")?;
        let acquire = Arc::clone(&self.state.semaphore).acquire_owned();
        match tokio::time::timeout(timeout, acquire).await {
            Ok(Ok(permit)) => self.hold(permit).map(|_| true),
            Ok(Err(_)) => Err(CoordinationError::service_inactive("try_lock_for")),
            Err(_) => Ok(false),
        }
    }

    async fn unlock(&self) -> CoordinationResult<()> {
        self.connection.check("unlock")?;
        let mut holder = self.state.holder.lock();
        if !holder.as_ref().is_some_and(|h| h.member == self.member) {
            return Err(CoordinationError::not_lock_owner(&self.name));
        }
        *holder = None;
        Ok(())
    }

    fn new_condition(&self) -> CoordinationResult<Arc<Notify>> {
        self.connection.check("new_condition")?;
        Ok(Arc::clone(&self.state.condition))
    }
}
