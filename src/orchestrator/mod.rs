//! One suggestion cycle, the loop that repeats it and the slot the accept
//! callback reads from.

mod accept_worker;
mod controller;
mod cycle;
mod loop_worker;
mod slot;
mod state;

pub use accept_worker::accept_worker;
pub use controller::AgentController;
pub use cycle::{CycleLimits, CycleOrchestrator, CycleReport, MaintenanceReport};
pub use loop_worker::suggestion_loop;
pub use slot::{accept_current, SuggestionSlot};
pub use state::{CycleState, PendingSuggestion};
