use chrono::{DateTime, Duration, Local};
use uuid::Uuid;

use crate::normalize::{extract_app_name, extract_app_name_trailing};
use crate::orchestrator::PendingSuggestion;

use super::{match_apps, FeedbackStore, SuggestionRecord};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// Seconds after which an unresolved suggestion is dropped unlabeled.
pub const DEFAULT_FEEDBACK_WINDOW_SECS: i64 = 300;

pub struct FeedbackRecorder {
    store: FeedbackStore,
    window: Duration,
}

impl FeedbackRecorder {
    pub fn new(store: FeedbackStore) -> Self {
        Self {
            store,
            window: Duration::seconds(DEFAULT_FEEDBACK_WINDOW_SECS),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn store(&self) -> &FeedbackStore {
        &self.store
    }

    /// Resolve the outstanding suggestion against the window now in focus.
    ///
    /// The pending slot is always empty afterwards. Nothing is recorded when
    /// there was no suggestion or it is older than the feedback window. A
    /// record that cannot be persisted is still returned.
    pub fn record(
        &self,
        current_window: &str,
        pending: &mut Option<PendingSuggestion>,
        now: DateTime<Local>,
    ) -> Option<SuggestionRecord> {
        let suggestion = pending.take()?;

        let age = now.signed_duration_since(suggestion.issued_at);
        if age > self.window {
            log_debug!(
                "dropping suggestion issued {}s ago without feedback",
                age.num_seconds()
            );
            return None;
        }

        // Titles come as `document - App` and `App - document`; either side may
        // name the suggested application.
        let current_app = extract_app_name(current_window);
        let hosting_app = extract_app_name_trailing(current_window);
        let followed = match_apps(&current_app, &suggestion.extracted_app)
            || match_apps(&hosting_app, &suggestion.extracted_app);

        let record = SuggestionRecord {
            id: Uuid::new_v4(),
            timestamp: suggestion.issued_at,
            suggestion_text: suggestion.text,
            suggested_app: suggestion.extracted_app,
            followed,
            time_to_respond: age.num_milliseconds().max(0) as f64 / 1000.0,
            current_app,
        };

        if followed {
            log_info!("suggestion followed: {}", record.suggestion_text);
        } else {
            log_info!(
                "suggestion ignored: {} (used {} instead)",
                record.suggestion_text,
                record.current_app
            );
        }

        if let Err(err) = self.store.append(record.clone()) {
            log_error!("failed to persist feedback: {err:#}");
        }
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issued() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
    }

    fn pending(app: &str) -> Option<PendingSuggestion> {
        Some(PendingSuggestion {
            text: format!("Switch to {app}"),
            extracted_app: app.to_string(),
            issued_at: issued(),
        })
    }

    fn recorder() -> (tempfile::TempDir, FeedbackRecorder) {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FeedbackRecorder::new(FeedbackStore::new(dir.path().join("feedback.json")));
        (dir, recorder)
    }

    #[test]
    fn nothing_pending_records_nothing() {
        let (_dir, recorder) = recorder();
        let mut slot = None;
        assert!(recorder.record("Editor", &mut slot, issued()).is_none());
        assert_eq!(recorder.store().load().stats.total, 0);
    }

    #[test]
    fn stale_suggestions_are_dropped_unlabeled() {
        let (_dir, recorder) = recorder();
        let mut slot = pending("firefox");

        let late = issued() + Duration::seconds(301);
        assert!(recorder.record("Mozilla Firefox", &mut slot, late).is_none());
        assert!(slot.is_none());
        assert_eq!(recorder.store().load().stats.total, 0);
    }

    #[test]
    fn suggestion_at_the_window_edge_still_counts() {
        let (_dir, recorder) = recorder();
        let mut slot = pending("firefox");

        let edge = issued() + Duration::seconds(300);
        let record = recorder.record("firefox", &mut slot, edge).unwrap();
        assert!(record.followed);
        assert_eq!(record.time_to_respond, 300.0);
    }

    #[test]
    fn alias_of_suggested_app_is_followed() {
        let (_dir, recorder) = recorder();
        let mut slot = pending("visual studio code");

        let record = recorder
            .record("main.py - vscode", &mut slot, issued() + Duration::seconds(40))
            .unwrap();
        assert!(record.followed);
        assert_eq!(record.current_app, "main.py");
        assert!(slot.is_none());

        let stats = recorder.store().load().stats;
        assert_eq!((stats.total, stats.followed, stats.ignored), (1, 1, 0));
    }

    #[test]
    fn different_app_is_ignored() {
        let (_dir, recorder) = recorder();
        let mut slot = pending("chrome");

        let record = recorder
            .record("Firefox", &mut slot, issued() + Duration::seconds(10))
            .unwrap();
        assert!(!record.followed);
        assert_eq!(record.suggested_app, "chrome");
        assert!(slot.is_none());

        let stats = recorder.store().load().stats;
        assert_eq!((stats.total, stats.followed, stats.ignored), (1, 0, 1));
    }

    #[test]
    fn persistence_failure_still_returns_the_record() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the document should be makes every write fail.
        let blocked = dir.path().join("feedback.json");
        std::fs::create_dir_all(blocked.join("inner")).unwrap();
        let recorder = FeedbackRecorder::new(FeedbackStore::new(blocked));

        let mut slot = pending("firefox");
        let record = recorder.record("firefox", &mut slot, issued()).unwrap();
        assert!(record.followed);
        assert!(slot.is_none());
    }
}
