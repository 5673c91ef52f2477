//! Whether the previous suggestion was followed.

mod matching;
mod record;
mod recorder;
mod store;
mod view;

pub use matching::match_apps;
pub use record::{FeedbackDocument, FeedbackStats, SuggestionRecord};
pub use recorder::{FeedbackRecorder, DEFAULT_FEEDBACK_WINDOW_SECS};
pub use store::FeedbackStore;
pub use view::{AppFeedback, FeedbackView, SUPPRESS_AFTER_IGNORES};
