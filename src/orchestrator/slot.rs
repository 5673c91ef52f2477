use std::sync::{Arc, PoisonError, RwLock};

use crate::actions::{extract, Action, ActionExecutor, ExecutionOutcome, ExecutionStatus};

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Latest published suggestion, shared with the accept callback.
///
/// The callback may read a suggestion the next cycle is about to replace;
/// acting on a stale one is acceptable.
#[derive(Debug, Clone, Default)]
pub struct SuggestionSlot(Arc<RwLock<Option<String>>>);

impl SuggestionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, text: impl Into<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(text.into());
    }

    pub fn current(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Empty the slot if it still holds `text`; a newer suggestion stays.
    pub fn retract(&self, text: &str) -> bool {
        let mut current = self.0.write().unwrap_or_else(PoisonError::into_inner);
        if current.as_deref() == Some(text) {
            *current = None;
            true
        } else {
            false
        }
    }
}

/// Act on whatever suggestion is current. A suggestion that was carried out
/// is retracted so a second accept does not repeat it.
pub fn accept_current(slot: &SuggestionSlot, executor: &ActionExecutor) -> ExecutionOutcome {
    let Some(text) = slot.current() else {
        return executor.execute(&Action::none());
    };
    let outcome = executor.execute(&extract(&text));
    log_info!("accepted suggestion: {:?} {}", outcome.status, outcome.message);
    if outcome.status == ExecutionStatus::Executed {
        slot.retract(&text);
    }
    outcome
}
