//! Context snapshot data model.
//!
//! One timestamped observation of the desktop: active window title, recently
//! touched files (most recent first) and the heaviest processes by memory.

use anyhow::{bail, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Timelike};
use serde::{Deserialize, Deserializer, Serialize};

/// Plain local timestamps written by older stores.
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Local>,
    pub window: String,
    pub recent_files: Vec<String>,
    pub top_processes: Vec<String>,
}

impl ContextSnapshot {
    /// Build a snapshot stamped at `timestamp`, truncated to whole seconds.
    pub fn new(
        timestamp: DateTime<Local>,
        window: impl Into<String>,
        recent_files: Vec<String>,
        top_processes: Vec<String>,
    ) -> Self {
        Self {
            timestamp: truncate_to_second(timestamp),
            window: window.into(),
            recent_files,
            top_processes,
        }
    }

    /// A snapshot is only usable when every part of the observation is present.
    pub fn validate(&self) -> Result<()> {
        if self.window.trim().is_empty() {
            bail!("window title is empty");
        }
        if self.recent_files.is_empty() {
            bail!("recent file list is empty");
        }
        if self.top_processes.is_empty() {
            bail!("process list is empty");
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Accept RFC 3339 as well as the legacy `YYYY-MM-DD HH:MM:SS` local format.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Local>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(raw, LEGACY_TIMESTAMP_FORMAT)
        .map_err(|err| anyhow::anyhow!("invalid timestamp '{raw}': {err}"))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| anyhow::anyhow!("timestamp '{raw}' does not exist in the local timezone"))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn truncate_to_second(timestamp: DateTime<Local>) -> DateTime<Local> {
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}
