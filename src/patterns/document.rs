use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::utils::fs::write_json_atomic;

use super::{PatternSummary, Ranked};

/// The persisted patterns file: exactly the three frequency lists, each a
/// list of `[value, count]` pairs. Downstream consumers read this file, so it
/// is rewritten wholesale on every aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternsDocument {
    pub frequent_windows: Vec<Ranked>,
    pub frequent_files: Vec<Ranked>,
    pub frequent_processes: Vec<Ranked>,
}

impl From<&PatternSummary> for PatternsDocument {
    fn from(summary: &PatternSummary) -> Self {
        Self {
            frequent_windows: summary.frequent_windows.clone(),
            frequent_files: summary.frequent_files.clone(),
            frequent_processes: summary.frequent_processes.clone(),
        }
    }
}

pub fn write_patterns_document(path: &Path, summary: &PatternSummary) -> Result<()> {
    write_json_atomic(path, &PatternsDocument::from(summary))
}
