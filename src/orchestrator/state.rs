use chrono::{DateTime, Local};
use serde::Serialize;

/// The one suggestion awaiting feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSuggestion {
    pub text: String,
    /// Application the suggestion points at.
    pub extracted_app: String,
    pub issued_at: DateTime<Local>,
}

/// What a cycle carries over to the next one.
#[derive(Debug, Default)]
pub struct CycleState {
    pub pending: Option<PendingSuggestion>,
    pub cycles: u64,
}
