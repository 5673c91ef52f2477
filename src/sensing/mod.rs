//! Operating-system collaborators: what the user is doing, how to launch
//! things and how to tell the user about a suggestion.

mod context;
mod launcher;
mod notify;

pub use context::{ContextSource, SystemContextSource, UNKNOWN_WINDOW};
pub use launcher::{Launcher, SystemLauncher};
pub use notify::{LogSink, NotificationSink, Notifier};
