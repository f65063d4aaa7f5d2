//! # Cluster Locks
//!
//! [`ClusterLock`] is a plain mutual-exclusion primitive shared by every
//! process of the engine. It offers blocking, non-blocking, timed and
//! interruptible acquisition. Locks are not reentrant: a holder calling
//! [`lock`](ClusterLock::lock) again waits for itself.

use super::errors::{CoordinationError, CoordinationResult};
use async_trait::async_trait;
use futures::future::{AbortRegistration, Abortable};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[async_trait]
pub trait ClusterLock: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Wait until the lock is acquired
    async fn lock(&self) -> CoordinationResult<()>;

    /// Acquire the lock only if it is free right now
    async fn try_lock(&self) -> CoordinationResult<bool>;

    /// Wait at most `timeout` for the lock
    async fn try_lock_for(&self, timeout: Duration) -> CoordinationResult<bool>;

    /// Like [`lock`](Self::lock), giving up with `Interrupted` once the
    /// matching `AbortHandle` fires
    async fn lock_interruptibly(&self, registration: AbortRegistration) -> CoordinationResult<()> {
        Abortable::new(self.lock(), registration)
            .await
            .map_err(|_| CoordinationError::interrupted(self.name()))?
    }

    async fn unlock(&self) -> CoordinationResult<()>;

    /// Wait-condition bound to this lock, where the backend supports one
    fn new_condition(&self) -> CoordinationResult<Arc<Notify>>;
}

/// Lock handed out when a single process makes up the whole engine.
///
/// No other process can contend for it, so every acquisition succeeds
/// immediately.
#[derive(Debug, Clone)]
pub struct StandaloneLock {
    name: String,
}

impl StandaloneLock {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl ClusterLock for StandaloneLock {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lock(&self) -> CoordinationResult<()> {
        Ok(())
    }

    async fn try_lock(&self) -> CoordinationResult<bool> {
        Ok(true)
    }

    async fn try_lock_for(&self, _timeout: Duration) -> CoordinationResult<bool> {
        Ok(true)
    }

    async fn lock_interruptibly(&self, _registration: AbortRegistration) -> CoordinationResult<()> {
        Ok(())
    }

    async fn unlock(&self) -> CoordinationResult<()> {
        Ok(())
    }

    fn new_condition(&self) -> CoordinationResult<Arc<Notify>> {
        Err(CoordinationError::unsupported("new_condition"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::AbortHandle;

    #[tokio::test]
    async fn test_standalone_lock_never_blocks() {
        let lock = StandaloneLock::new("clean");

        for _ in 0..3 {
            lock.lock().await.unwrap();
            lock.lock().await.unwrap();
            assert!(lock.try_lock().await.unwrap());
            assert!(lock.try_lock_for(Duration::from_millis(1)).await.unwrap());
            lock.unlock().await.unwrap();
        }

        let (handle, registration) = AbortHandle::new_pair();
        handle.abort();
        lock.lock_interruptibly(registration).await.unwrap();
    }

    #[test]
    fn test_standalone_lock_rejects_conditions() {
        let lock = StandaloneLock::new("clean");
        for _ in 0..2 {
            assert_eq!(
                lock.new_condition().unwrap_err(),
                CoordinationError::unsupported("new_condition")
            );
        }
    }
}
