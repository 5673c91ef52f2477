//! Append-only SQLite event log mirroring every stored snapshot.
//!
//! The JSON memory store is rewritten wholesale on each append; if the
//! process dies between observing and saving, the event log still has the
//! snapshot and [`crate::memory::MemoryStore::reconcile`] replays it.

mod connection;
mod helpers;
mod migrations;
mod snapshot_events;

pub use connection::EventLog;
