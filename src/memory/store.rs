use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use serde_json::Value;

use crate::utils::fs::write_json_atomic;

use super::ContextSnapshot;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Outcome of [`MemoryStore::compact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompactionReport {
    pub kept: usize,
    pub removed: usize,
}

/// Whole-file JSON store of context snapshots in chronological order.
///
/// Every mutation is a full load-modify-save cycle. A single writer process
/// is assumed.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
    max_entries: Option<usize>,
}

impl MemoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            max_entries: None,
        }
    }

    /// Keep at most `max_entries` snapshots; the oldest are dropped on save.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries).filter(|n| *n > 0);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all valid snapshots. Never fails: a missing file is an empty
    /// memory, a corrupt file is logged and treated as empty, and individual
    /// entries that don't parse or validate are skipped.
    pub fn load(&self) -> Vec<ContextSnapshot> {
        match self.read_entries() {
            Ok(Some(raw)) => {
                let total = raw.len();
                let valid = parse_valid(raw);
                if valid.len() < total {
                    log_warn!(
                        "skipped {} invalid memory entries in {}",
                        total - valid.len(),
                        self.path.display()
                    );
                }
                valid
            }
            Ok(None) => Vec::new(),
            Err(err) => {
                log_warn!("memory store unreadable, starting empty: {err:#}");
                Vec::new()
            }
        }
    }

    fn read_entries(&self) -> Result<Option<Vec<Value>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read memory from {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Some(Vec::new()));
        }
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("memory file {} is corrupted", self.path.display()))?;
        match value {
            Value::Array(entries) => Ok(Some(entries)),
            other => anyhow::bail!("memory file holds {} instead of a list", json_kind(&other)),
        }
    }

    /// Record an observation stamped now. Returns `false`, leaving the store
    /// untouched, when the observation is incomplete or cannot be persisted.
    pub fn append(&self, window: &str, recent_files: &[String], top_processes: &[String]) -> bool {
        let snapshot = ContextSnapshot::new(
            Local::now(),
            window,
            recent_files.to_vec(),
            top_processes.to_vec(),
        );
        self.append_snapshot(snapshot)
    }

    pub fn append_snapshot(&self, snapshot: ContextSnapshot) -> bool {
        if let Err(err) = snapshot.validate() {
            log_warn!("skipping memory entry: {err}");
            return false;
        }

        let mut entries = self.load();
        entries.push(snapshot);
        match self.save(&entries) {
            Ok(()) => true,
            Err(err) => {
                log_error!("failed to persist memory entry: {err:#}");
                false
            }
        }
    }

    /// Overwrite the store with `entries`, excluding invalid ones and
    /// applying the retention cap.
    pub fn save(&self, entries: &[ContextSnapshot]) -> Result<()> {
        let mut valid: Vec<&ContextSnapshot> = entries.iter().filter(|e| e.is_valid()).collect();
        if let Some(max) = self.max_entries {
            if valid.len() > max {
                let excess = valid.len() - max;
                valid.drain(..excess);
                log_debug!("memory retention dropped {excess} oldest entries");
            }
        }
        write_json_atomic(&self.path, &valid)
    }

    /// Rewrite the persisted store without its invalid entries.
    pub fn compact(&self) -> Result<CompactionReport> {
        let raw = self.read_entries()?.unwrap_or_default();
        let total = raw.len();
        let valid = parse_valid(raw);
        let report = CompactionReport {
            kept: valid.len(),
            removed: total - valid.len(),
        };
        self.save(&valid)?;
        log_info!(
            "memory compacted: {} valid entries (removed {} invalid entries)",
            report.kept,
            report.removed
        );
        Ok(report)
    }

    /// Titles of the last `n` snapshots, oldest first.
    pub fn recent_windows(&self, n: usize) -> Vec<String> {
        let entries = self.load();
        let start = entries.len().saturating_sub(n);
        entries[start..].iter().map(|e| e.window.clone()).collect()
    }

    /// Replay event-log snapshots that are newer than the newest stored one.
    /// Returns the number of snapshots added.
    pub fn reconcile(&self, events: &[ContextSnapshot]) -> Result<usize> {
        let mut entries = self.load();
        let newest = entries.last().map(|e| e.timestamp);

        let missing: Vec<ContextSnapshot> = events
            .iter()
            .filter(|e| e.is_valid())
            .filter(|e| newest.map_or(true, |ts| e.timestamp > ts))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Ok(0);
        }

        let replayed = missing.len();
        entries.extend(missing);
        self.save(&entries)?;
        log_info!("recovered {replayed} snapshots from the event log");
        Ok(replayed)
    }
}

fn parse_valid(raw: Vec<Value>) -> Vec<ContextSnapshot> {
    raw.into_iter()
        .filter_map(|value| serde_json::from_value::<ContextSnapshot>(value).ok())
        .filter(ContextSnapshot::is_valid)
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
