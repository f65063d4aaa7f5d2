//! # Engine State
//!
//! ```text
//! Created ──startup──> Started ──stop_processing──> Stopped
//!                         │                            │
//!                         └──────────shutdown──────────┴──> ShutDown
//! ```
//!
//! The lifecycle is one-shot: nothing leads back to `Started`.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineState {
    #[default]
    Created,
    Started,
    Stopped,
    /// Terminal
    ShutDown,
}

impl EngineState {
    /// State reached by `startup()` from this one
    pub fn on_startup(self) -> EngineResult<EngineState> {
        match self {
            Self::Created => Ok(Self::Started),
            _ => Err(EngineError::invalid_state(
                "startup() can not be called multiple times",
            )),
        }
    }

    /// State reached by `stop_processing()` from this one
    pub fn on_stop_processing(self) -> EngineResult<EngineState> {
        match self {
            Self::Started => Ok(Self::Stopped),
            Self::Created => Err(EngineError::invalid_state(
                "stop_processing() must not be called before startup()",
            )),
            Self::ShutDown => Err(EngineError::invalid_state(
                "stop_processing() can not be called after shutdown()",
            )),
            Self::Stopped => Err(EngineError::invalid_state(
                "stop_processing() can not be called multiple times",
            )),
        }
    }

    /// State reached by `shutdown()` from this one
    pub fn on_shutdown(self) -> EngineResult<EngineState> {
        match self {
            Self::Started | Self::Stopped => Ok(Self::ShutDown),
            Self::Created => Err(EngineError::invalid_state(
                "shutdown() must not be called before startup()",
            )),
            Self::ShutDown => Err(EngineError::invalid_state(
                "shutdown() can not be called multiple times",
            )),
        }
    }

    /// True while workers may pick up tasks
    pub fn is_processing(self) -> bool {
        self == Self::Started
    }

    pub fn is_terminal(self) -> bool {
        self == Self::ShutDown
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "CREATED",
            Self::Started => "STARTED",
            Self::Stopped => "STOPPED",
            Self::ShutDown => "SHUT_DOWN",
        };
        f.write_str(name)
    }
}
