use std::time::{Duration, Instant};

use anyhow::Result;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub const NOTIFICATION_TITLE: &str = "Suggestion";

/// Somewhere a suggestion can be shown to the user.
pub trait NotificationSink: Send + Sync {
    fn show(&self, title: &str, message: &str) -> Result<()>;
}

/// Writes suggestions to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn show(&self, title: &str, message: &str) -> Result<()> {
        log_info!("{title}: {message}");
        Ok(())
    }
}

/// Rate-limits a [`NotificationSink`]: at most one notification per
/// cooldown, everything in between is dropped.
pub struct Notifier {
    sink: Box<dyn NotificationSink>,
    cooldown: Duration,
    last_shown: Option<Instant>,
}

impl Notifier {
    pub fn new(sink: Box<dyn NotificationSink>, cooldown: Duration) -> Self {
        Self {
            sink,
            cooldown,
            last_shown: None,
        }
    }

    /// Returns whether the message reached the sink.
    pub fn notify(&mut self, message: &str) -> bool {
        self.notify_at(message, Instant::now())
    }

    pub fn notify_at(&mut self, message: &str, now: Instant) -> bool {
        if let Some(last) = self.last_shown {
            if now.saturating_duration_since(last) < self.cooldown {
                log_debug!("notification suppressed by cooldown");
                return false;
            }
        }

        match self.sink.show(NOTIFICATION_TITLE, message) {
            Ok(()) => {
                self.last_shown = Some(now);
                true
            }
            Err(err) => {
                log_warn!("failed to show notification: {err:#}");
                false
            }
        }
    }
}
