//! # Engine Lifecycle
//!
//! Explicit start/stop/shutdown ordering for the whole engine.
//!
//! - [`EngineState`] - the states and their guarded transitions
//! - [`EngineLifecycle`] - applies transitions, delegating side effects
//! - [`EngineContainer`] - what each transition does to the running engine
//! - [`ComputeEngine`] - the assembled engine and its builder

pub mod container;
pub mod engine;
pub mod engine_lifecycle;
pub mod state;

pub use container::{ComputeEngineContainer, EngineContainer};
pub use engine::{ComputeEngine, ComputeEngineBuilder};
pub use engine_lifecycle::EngineLifecycle;
pub use state::EngineState;
