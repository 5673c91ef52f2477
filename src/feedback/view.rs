use std::collections::HashMap;

use crate::normalize::canonical_app_name;

use super::{FeedbackDocument, SuggestionRecord};

/// Ignores in a row after which an app stops being suggested until it is
/// followed again.
pub const SUPPRESS_AFTER_IGNORES: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppFeedback {
    pub followed: u64,
    pub ignored: u64,
    /// Ignores since the last time the app was followed.
    pub consecutive_ignored: u32,
}

/// Per-app outcome of past suggestions, keyed by canonical app name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackView {
    apps: HashMap<String, AppFeedback>,
}

impl FeedbackView {
    pub fn from_document(doc: &FeedbackDocument) -> Self {
        let mut view = Self::default();
        for record in &doc.suggestions {
            view.observe(record);
        }
        view
    }

    /// Fold one resolved suggestion in. Records must arrive oldest first.
    pub fn observe(&mut self, record: &SuggestionRecord) {
        let key = canonical_app_name(&record.suggested_app);
        if key.is_empty() {
            return;
        }
        let entry = self.apps.entry(key).or_default();
        if record.followed {
            entry.followed += 1;
            entry.consecutive_ignored = 0;
        } else {
            entry.ignored += 1;
            entry.consecutive_ignored = entry.consecutive_ignored.saturating_add(1);
        }
    }

    pub fn app(&self, app: &str) -> Option<&AppFeedback> {
        self.apps.get(&canonical_app_name(app))
    }

    pub fn is_suppressed(&self, app: &str) -> bool {
        self.app(app)
            .map_or(false, |feedback| feedback.consecutive_ignored >= SUPPRESS_AFTER_IGNORES)
    }
}
