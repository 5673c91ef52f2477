use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use serde::Serialize;
use walkdir::WalkDir;

use crate::sensing::Launcher;
use crate::utils::fs::base_name;

use super::{Action, ActionKind};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub const DEFAULT_SEARCH_DEPTH: usize = 6;

const NO_ACTION_MESSAGE: &str = "No actionable information found in suggestion";

/// Spoken names of common applications and the program that starts them.
const APP_PROGRAMS: [(&str, &str); 14] = [
    ("chrome", "chrome"),
    ("google chrome", "chrome"),
    ("firefox", "firefox"),
    ("edge", "msedge"),
    ("microsoft edge", "msedge"),
    ("word", "winword"),
    ("excel", "excel"),
    ("powerpoint", "powerpnt"),
    ("notepad", "notepad"),
    ("visual studio code", "code"),
    ("vscode", "code"),
    ("code", "code"),
    ("explorer", "explorer"),
    ("file explorer", "explorer"),
];

#[cfg(windows)]
const PYTHON: &[&str] = &["python"];
#[cfg(not(windows))]
const PYTHON: &[&str] = &["python3"];

/// Command line that runs a script with the given extension.
fn interpreter_for(extension: &str) -> Option<&'static [&'static str]> {
    match extension {
        "py" => Some(PYTHON),
        "sh" => Some(&["sh"]),
        "bat" => Some(&["cmd", "/C"]),
        "ps1" => Some(&["powershell", "-File"]),
        _ => None,
    }
}

/// Extensions opened with their default application.
const DOCUMENT_EXTENSIONS: [&str; 4] = ["json", "toml", "yaml", "yml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Executed,
    /// Nothing to run; the message is advice for the user.
    InfoOnly,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    pub message: String,
}

impl ExecutionOutcome {
    fn executed(message: String) -> Self {
        Self {
            status: ExecutionStatus::Executed,
            message,
        }
    }

    fn info(message: String) -> Self {
        Self {
            status: ExecutionStatus::InfoOnly,
            message,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            message: message.into(),
        }
    }
}

pub struct ActionExecutor {
    launcher: Arc<dyn Launcher>,
    project_root: Option<PathBuf>,
    max_depth: usize,
}

impl ActionExecutor {
    pub fn new(launcher: Arc<dyn Launcher>, project_root: Option<PathBuf>) -> Self {
        Self {
            launcher,
            project_root,
            max_depth: DEFAULT_SEARCH_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Carry out `action`. Failures are reported in the outcome, never
    /// returned.
    pub fn execute(&self, action: &Action) -> ExecutionOutcome {
        let target = action.target.as_deref().map(str::trim).unwrap_or_default();
        if action.kind == ActionKind::None || target.is_empty() {
            return ExecutionOutcome::failed(NO_ACTION_MESSAGE);
        }

        log_info!("executing {:?} -> {target}", action.kind);
        match action.kind {
            ActionKind::OpenApp => match self.open_app(target) {
                Ok(()) => ExecutionOutcome::executed(format!("Opened {target}")),
                Err(err) => {
                    log_warn!("could not open {target}: {err:#}");
                    ExecutionOutcome::failed(format!("Failed to open {target}"))
                }
            },
            ActionKind::OpenWebsite => {
                let url = with_scheme(target);
                match self.launcher.open_url(&url) {
                    Ok(()) => ExecutionOutcome::executed(format!("Opened website {url}")),
                    Err(err) => {
                        log_warn!("could not open {url}: {err:#}");
                        ExecutionOutcome::failed(format!("Failed to open website {url}"))
                    }
                }
            }
            ActionKind::KeyboardShortcut => {
                ExecutionOutcome::info(format!("Tip: Try using the keyboard shortcut {target}"))
            }
            ActionKind::ShowTip => ExecutionOutcome::info(format!("Tip: {target}")),
            ActionKind::None => ExecutionOutcome::failed(NO_ACTION_MESSAGE),
        }
    }

    fn open_app(&self, target: &str) -> Result<()> {
        let lower = target.to_lowercase();

        if let Some((_, program)) = APP_PROGRAMS.iter().find(|(name, _)| *name == lower) {
            return self.launcher.open_executable(&program_name(program));
        }

        let extension = extension_of(&lower);
        let interpreter = extension.and_then(interpreter_for);
        let is_document = extension.map_or(false, |ext| DOCUMENT_EXTENSIONS.contains(&ext));

        if interpreter.is_none() && !is_document {
            return self.launcher.open_executable(target);
        }

        let path = self
            .find_in_project(target)
            .with_context(|| format!("{target} not found under the project root"))?;
        match interpreter {
            Some(interpreter) => self.launcher.open_script(interpreter, &path),
            None => self.launcher.open_url(&path.to_string_lossy()),
        }
    }

    fn find_in_project(&self, file_name: &str) -> Option<PathBuf> {
        let root = self.project_root.as_deref()?;
        let wanted = base_name(file_name).to_lowercase();
        let found = WalkDir::new(root)
            .max_depth(self.max_depth)
            .into_iter()
            .filter_entry(|entry| !is_hidden_dir(entry.path(), entry.depth()))
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .find(|entry| entry.file_name().to_string_lossy().to_lowercase() == wanted)
            .map(|entry| entry.into_path());
        if let Some(path) = &found {
            log_debug!("resolved {file_name} to {}", path.display());
        }
        found
    }
}

fn is_hidden_dir(path: &Path, depth: usize) -> bool {
    depth > 0
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with('.'))
}

fn extension_of(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext).filter(|ext| !ext.is_empty())
}

fn program_name(program: &str) -> String {
    if cfg!(windows) {
        format!("{program}.exe")
    } else {
        program.to_string()
    }
}

fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
