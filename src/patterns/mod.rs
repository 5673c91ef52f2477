//! Frequency and sequence statistics derived from the behaviour memory.

mod aggregate;
mod counter;
mod document;

pub use aggregate::{aggregate, DayPart, PatternSummary, Ranked, Scope};
pub use counter::OrderedCounter;
pub use document::{write_patterns_document, PatternsDocument};
