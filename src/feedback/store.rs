use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::utils::fs::write_json_atomic;

use super::{FeedbackDocument, FeedbackView, SuggestionRecord};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// JSON document of every resolved suggestion plus running counters.
#[derive(Debug, Clone)]
pub struct FeedbackStore {
    path: PathBuf,
}

impl FeedbackStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable document is an empty one.
    pub fn load(&self) -> FeedbackDocument {
        match self.try_load() {
            Ok(doc) => doc,
            Err(err) => {
                log_warn!("feedback store unreadable, starting empty: {err:#}");
                FeedbackDocument::default()
            }
        }
    }

    fn try_load(&self) -> Result<FeedbackDocument> {
        if !self.path.exists() {
            return Ok(FeedbackDocument::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read feedback from {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(FeedbackDocument::default());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("feedback file {} is corrupted", self.path.display()))
    }

    pub fn append(&self, record: SuggestionRecord) -> Result<()> {
        let mut doc = self.load();
        doc.push(record);
        write_json_atomic(&self.path, &doc)
    }

    pub fn follow_rate(&self) -> Option<f64> {
        self.load().stats.follow_rate()
    }

    pub fn view(&self) -> FeedbackView {
        FeedbackView::from_document(&self.load())
    }
}
