use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use crate::utils::fs::write_json_atomic;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const DATA_DIR_ENV: &str = "NUDGE_DATA_DIR";
const APP_DIR_NAME: &str = "nudge";

pub const SETTINGS_FILE: &str = "settings.json";
pub const MEMORY_FILE: &str = "memory.json";
pub const PATTERNS_FILE: &str = "patterns.json";
pub const FEEDBACK_FILE: &str = "feedback.json";
pub const EVENT_LOG_FILE: &str = "events.sqlite3";
pub const MODELS_DIR: &str = "models";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmTransport {
    Http,
    Cli,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub enabled: bool,
    pub transport: LlmTransport,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            transport: LlmTransport::Http,
            endpoint: "http://localhost:11434".into(),
            model: "llama3".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub cycle_interval_secs: u64,
    pub recent_file_limit: usize,
    pub process_limit: usize,
    /// Window titles handed to the learned predictor.
    pub history_window: usize,
    pub llm: LlmSettings,
    pub notification_cooldown_secs: u64,
    pub feedback_window_secs: i64,
    pub patterns_every_cycles: u64,
    pub compact_every_cycles: u64,
    pub max_memory_entries: usize,
    /// Directories scanned for recently touched files. Empty means the
    /// user's documents and downloads folders.
    pub watch_dirs: Vec<PathBuf>,
    /// Where script targets of accepted suggestions are searched for.
    pub project_root: Option<PathBuf>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            cycle_interval_secs: 10,
            recent_file_limit: 5,
            process_limit: 5,
            history_window: 10,
            llm: LlmSettings::default(),
            notification_cooldown_secs: 30,
            feedback_window_secs: 300,
            patterns_every_cycles: 10,
            compact_every_cycles: 50,
            max_memory_entries: 5000,
            watch_dirs: Vec::new(),
            project_root: None,
        }
    }
}

impl AgentSettings {
    /// Apply one `key=value` assignment. Nested keys use dots
    /// (`llm.model=mistral`); a value that is not JSON is taken as a string.
    pub fn with_override(&self, assignment: &str) -> Result<Self> {
        let (key, raw) = assignment
            .split_once('=')
            .with_context(|| format!("expected KEY=VALUE, got {assignment:?}"))?;
        let value = serde_json::from_str(raw.trim())
            .unwrap_or_else(|_| serde_json::Value::String(raw.trim().to_string()));

        let mut tree = serde_json::to_value(self)?;
        let mut node = &mut tree;
        for part in key.trim().split('.') {
            node = match node.get_mut(part) {
                Some(child) => child,
                None => bail!("unknown setting {key:?}"),
            };
        }
        *node = value;

        serde_json::from_value(tree).with_context(|| format!("invalid value for {key:?}"))
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AgentSettings>,
}

impl SettingsStore {
    /// Load settings from `path`. A missing or malformed file yields the
    /// defaults; only an unreadable one is an error.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!("ignoring malformed settings in {}: {err}", path.display());
                AgentSettings::default()
            })
        } else {
            AgentSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn agent(&self) -> AgentSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_agent(&self, settings: AgentSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &AgentSettings) -> Result<()> {
        write_json_atomic(&self.path, data)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

/// Every file the agent reads or writes, under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    /// `explicit`, else `$NUDGE_DATA_DIR`, else the platform data directory.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        let root = explicit
            .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME)))
            .context("no data directory available; pass --data-dir")?;
        Ok(Self { root })
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create data directory {}", self.root.display()))
    }

    pub fn settings(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn memory(&self) -> PathBuf {
        self.root.join(MEMORY_FILE)
    }

    pub fn patterns(&self) -> PathBuf {
        self.root.join(PATTERNS_FILE)
    }

    pub fn feedback(&self) -> PathBuf {
        self.root.join(FEEDBACK_FILE)
    }

    pub fn event_log(&self) -> PathBuf {
        self.root.join(EVENT_LOG_FILE)
    }

    pub fn models(&self) -> PathBuf {
        self.root.join(MODELS_DIR)
    }
}
