use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

const ENABLE_LOGS: bool = true;

use crate::log_info;

use super::{loop_worker::suggestion_loop, CycleOrchestrator};

/// Owns the background suggestion loop.
#[derive(Default)]
pub struct AgentController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl AgentController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn the loop. `cancel_token` stops it; hand its children to
    /// anything inside the cycle that should abort with it.
    pub fn start(
        &mut self,
        orchestrator: CycleOrchestrator,
        interval: Duration,
        cycle_timeout: Duration,
        cancel_token: CancellationToken,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("suggestion loop already active");
        }

        log_info!("starting suggestion loop every {}s", interval.as_secs());
        let handle = tokio::spawn(suggestion_loop(
            orchestrator,
            interval,
            cycle_timeout,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("suggestion loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
