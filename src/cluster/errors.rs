//! # Coordination Error Types
//!
//! Failures reported by the membership/data-grid collaborator and by the
//! cluster locks built on it.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinationError {
    /// The local membership connection is already shut down
    #[error("Membership service inactive during {operation}")]
    ServiceInactive { operation: String },

    /// The data grid can't be reached right now
    #[error("Membership service unreachable: {message}")]
    Unreachable { message: String },

    #[error("{operation} not supported")]
    Unsupported { operation: String },

    #[error("Lock {lock_name} is not held by this member")]
    NotLockOwner { lock_name: String },

    #[error("Acquisition of lock {lock_name} was interrupted")]
    Interrupted { lock_name: String },
}

impl CoordinationError {
    pub fn service_inactive(operation: impl Into<String>) -> Self {
        Self::ServiceInactive {
            operation: operation.into(),
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    pub fn not_lock_owner(lock_name: impl Into<String>) -> Self {
        Self::NotLockOwner {
            lock_name: lock_name.into(),
        }
    }

    pub fn interrupted(lock_name: impl Into<String>) -> Self {
        Self::Interrupted {
            lock_name: lock_name.into(),
        }
    }

    /// True for outages that may clear up on their own
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceInactive { .. } | Self::Unreachable { .. })
    }

    pub fn is_service_inactive(&self) -> bool {
        matches!(self, Self::ServiceInactive { .. })
    }
}

pub type CoordinationResult<T> = Result<T, CoordinationError>;
