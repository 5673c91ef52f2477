//! Turning suggestion text back into something the desktop can do.

mod execute;
mod extract;

pub use execute::{ActionExecutor, ExecutionOutcome, ExecutionStatus};
pub use extract::{extract, Action, ActionKind};
