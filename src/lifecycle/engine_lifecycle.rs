//! Guarded start/stop/shutdown sequencing over an [`EngineContainer`].

use super::container::EngineContainer;
use super::state::EngineState;
use crate::error::EngineResult;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// The engine's state machine.
///
/// The state lock is held across the container call, so concurrent
/// transitions are serialized. A transition is committed only when the
/// container call succeeds; on failure the state is left unchanged.
pub struct EngineLifecycle {
    state: Mutex<EngineState>,
    container: Arc<dyn EngineContainer>,
}

impl std::fmt::Debug for EngineLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineLifecycle")
            .field("state", &self.state.try_lock().map(|s| *s).ok())
            .finish()
    }
}

impl EngineLifecycle {
    pub fn new(container: Arc<dyn EngineContainer>) -> Self {
        Self {
            state: Mutex::new(EngineState::Created),
            container,
        }
    }

    pub async fn state(&self) -> EngineState {
        *self.state.lock().await
    }

    pub async fn startup(&self) -> EngineResult<()> {
        let mut state = self.state.lock().await;
        let next = state.on_startup()?;

        info!("🚀 Starting compute engine");
        self.container.start().await?;
        *state = next;
        info!("✅ Compute engine started");
        Ok(())
    }

    pub async fn stop_processing(&self) -> EngineResult<()> {
        let mut state = self.state.lock().await;
        let next = state.on_stop_processing()?;

        info!("⏸️ Stopping task processing");
        self.container.stop_processing().await?;
        *state = next;
        Ok(())
    }

    pub async fn shutdown(&self) -> EngineResult<()> {
        let mut state = self.state.lock().await;
        let next = state.on_shutdown()?;

        info!(from = %*state, "🛑 Shutting down compute engine");
        self.container.stop().await?;
        *state = next;
        info!("✅ Compute engine shut down");
        Ok(())
    }
}
