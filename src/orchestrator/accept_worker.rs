use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::actions::ActionExecutor;

use super::{accept_current, SuggestionSlot};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Accept the current suggestion once per trigger until the sender goes
/// away or `cancel_token` fires.
pub async fn accept_worker(
    slot: SuggestionSlot,
    executor: Arc<ActionExecutor>,
    mut triggers: mpsc::Receiver<()>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            trigger = triggers.recv() => {
                if trigger.is_none() {
                    log_info!("accept triggers closed");
                    break;
                }
                let (slot, executor) = (slot.clone(), Arc::clone(&executor));
                // Launching and project searches block.
                if let Err(err) =
                    tokio::task::spawn_blocking(move || accept_current(&slot, &executor)).await
                {
                    log_error!("accept task failed to join: {err:?}");
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("accept worker shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::Launcher;
    use anyhow::Result;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorded(Mutex<Vec<String>>);

    impl Launcher for Recorded {
        fn open_executable(&self, program: &str) -> Result<()> {
            self.0.lock().unwrap().push(program.to_string());
            Ok(())
        }

        fn open_script(&self, _interpreter: &[&str], script: &Path) -> Result<()> {
            self.0.lock().unwrap().push(script.display().to_string());
            Ok(())
        }

        fn open_url(&self, url: &str) -> Result<()> {
            self.0.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn each_trigger_accepts_the_published_suggestion() {
        let launcher = Arc::new(Recorded::default());
        let executor = Arc::new(ActionExecutor::new(launcher.clone(), None));
        let slot = SuggestionSlot::new();
        let (tx, rx) = mpsc::channel(4);
        let worker = tokio::spawn(accept_worker(slot.clone(), executor, rx, CancellationToken::new()));

        slot.publish("You often visit github.com after coding.");
        tx.send(()).await.unwrap();
        tx.send(()).await.unwrap();
        drop(tx);
        worker.await.unwrap();

        assert_eq!(*launcher.0.lock().unwrap(), vec!["https://github.com"]);
        assert_eq!(slot.current(), None);
    }

    #[tokio::test]
    async fn cancellation_stops_the_worker() {
        let executor = Arc::new(ActionExecutor::new(Arc::new(Recorded::default()), None));
        let (_tx, rx) = mpsc::channel(1);
        let token = CancellationToken::new();
        let worker = tokio::spawn(accept_worker(SuggestionSlot::new(), executor, rx, token.child_token()));

        token.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(2), worker)
            .await
            .expect("worker exits on cancel")
            .unwrap();
    }
}
