mod snapshot;
mod store;

pub use snapshot::ContextSnapshot;
pub use store::{CompactionReport, MemoryStore};
