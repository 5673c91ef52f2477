use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one suggestion, written once when the next cycle resolves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// When the suggestion was issued.
    pub timestamp: DateTime<Local>,
    pub suggestion_text: String,
    pub suggested_app: String,
    pub followed: bool,
    /// Seconds between issuing the suggestion and resolving it.
    pub time_to_respond: f64,
    pub current_app: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub total: u64,
    pub followed: u64,
    pub ignored: u64,
}

impl FeedbackStats {
    pub fn count(&mut self, followed: bool) {
        self.total += 1;
        if followed {
            self.followed += 1;
        } else {
            self.ignored += 1;
        }
    }

    /// Share of resolved suggestions that were followed, `None` before the
    /// first one.
    pub fn follow_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.followed as f64 / self.total as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackDocument {
    #[serde(default)]
    pub suggestions: Vec<SuggestionRecord>,
    #[serde(default)]
    pub stats: FeedbackStats,
}

impl FeedbackDocument {
    pub fn push(&mut self, record: SuggestionRecord) {
        self.stats.count(record.followed);
        self.suggestions.push(record);
    }
}
