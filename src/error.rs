//! # Engine Error Types
//!
//! Structured error handling for the compute engine using thiserror.
//!
//! - **ValidationError**: malformed task or submission, rejected before any write
//! - **InvalidState**: operation not allowed in the current state (paused queue,
//!   in-progress cancel, lifecycle method out of order)
//! - **CoordinationError**: the membership/data-grid collaborator failed
//! - **PersistenceError**: the queue store or component directory failed
//! - **ConfigurationError**: invalid or unreadable configuration

use crate::cluster::CoordinationError;
use crate::queue::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Coordination error: {0}")]
    CoordinationError(#[from] CoordinationError),
    #[error("Persistence error: {0}")]
    PersistenceError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    /// True when the caller may retry after the coordination service recovers
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::CoordinationError(e) if e.is_transient())
    }
}

impl From<StoreError> for EngineError {
    fn from(error: StoreError) -> Self {
        EngineError::PersistenceError(error.to_string())
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(error: config::ConfigError) -> Self {
        EngineError::ConfigurationError(error.to_string())
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
