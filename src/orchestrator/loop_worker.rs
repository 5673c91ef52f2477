use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::CycleOrchestrator;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Run suggestion cycles every `interval` until `cancel_token` fires.
///
/// A cycle that fails or outlives `cycle_timeout` is logged and the loop
/// carries on. Cancellation is only observed between cycles.
pub async fn suggestion_loop(
    mut orchestrator: CycleOrchestrator,
    interval: Duration,
    cycle_timeout: Duration,
    cancel_token: CancellationToken,
) {
    match orchestrator.maintain().await {
        Ok(report) if report.replayed > 0 => {
            log_info!("startup recovery replayed {} snapshots", report.replayed)
        }
        Ok(_) => {}
        Err(err) => log_error!("startup recovery failed: {err:?}"),
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match tokio::time::timeout(cycle_timeout, orchestrator.run_cycle()).await {
                    Ok(Ok(_)) => {},
                    Ok(Err(err)) => log_error!("suggestion cycle failed: {err:?}"),
                    Err(_) => log_warn!(
                        "suggestion cycle timeout (> {}s), no suggestion issued this cycle",
                        cycle_timeout.as_secs()
                    ),
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("suggestion loop shutting down");
                break;
            }
        }
    }
}
