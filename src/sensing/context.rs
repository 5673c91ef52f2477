use std::{
    path::PathBuf,
    process::Command,
    sync::Mutex,
    time::SystemTime,
};

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use walkdir::{DirEntry, WalkDir};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub const UNKNOWN_WINDOW: &str = "Unknown";

const RECENT_FILE_DEPTH: usize = 4;

/// Source of the observations that make up a snapshot.
pub trait ContextSource: Send + Sync {
    /// Title of the focused window, [`UNKNOWN_WINDOW`] when it cannot be read.
    fn active_window_title(&self) -> String;

    /// Most recently modified files, newest first.
    fn recent_files(&self, limit: usize) -> Vec<String>;

    /// Process names by resident memory, largest first.
    fn top_processes(&self, limit: usize) -> Vec<String>;
}

pub struct SystemContextSource {
    system: Mutex<System>,
    watch_dirs: Vec<PathBuf>,
}

impl SystemContextSource {
    /// Watch `watch_dirs` for recent files; the user's documents and
    /// downloads folders when empty.
    pub fn new(watch_dirs: Vec<PathBuf>) -> Self {
        let watch_dirs = if watch_dirs.is_empty() {
            [dirs::document_dir(), dirs::download_dir()]
                .into_iter()
                .flatten()
                .collect()
        } else {
            watch_dirs
        };

        Self {
            system: Mutex::new(System::new()),
            watch_dirs,
        }
    }
}

impl ContextSource for SystemContextSource {
    fn active_window_title(&self) -> String {
        match focused_window_title() {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => UNKNOWN_WINDOW.to_string(),
        }
    }

    fn recent_files(&self, limit: usize) -> Vec<String> {
        let mut files: Vec<(SystemTime, String)> = Vec::new();

        for dir in self.watch_dirs.iter().filter(|d| d.exists()) {
            let walker = WalkDir::new(dir)
                .max_depth(RECENT_FILE_DEPTH)
                .into_iter()
                .filter_entry(|entry| !is_hidden(entry));
            for entry in walker.filter_map(Result::ok) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) else {
                    continue;
                };
                files.push((modified, entry.path().to_string_lossy().into_owned()));
            }
        }

        files.sort_by(|a, b| b.0.cmp(&a.0));
        files.into_iter().take(limit).map(|(_, path)| path).collect()
    }

    fn top_processes(&self, limit: usize) -> Vec<String> {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            ProcessRefreshKind::new().with_memory(),
        );

        let mut processes: Vec<(u64, String)> = system
            .processes()
            .values()
            .map(|p| (p.memory(), p.name().to_string_lossy().into_owned()))
            .filter(|(_, name)| !name.is_empty())
            .collect();
        processes.sort_by(|a, b| b.0.cmp(&a.0));
        processes.into_iter().take(limit).map(|(_, name)| name).collect()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.starts_with('.'))
}

#[cfg(target_os = "linux")]
fn focused_window_command() -> Command {
    let mut cmd = Command::new("xdotool");
    cmd.args(["getactivewindow", "getwindowname"]);
    cmd
}

#[cfg(target_os = "macos")]
fn focused_window_command() -> Command {
    let mut cmd = Command::new("osascript");
    cmd.args([
        "-e",
        "tell application \"System Events\" to get name of first application process whose frontmost is true",
    ]);
    cmd
}

#[cfg(target_os = "windows")]
fn focused_window_command() -> Command {
    const SCRIPT: &str = r#"Add-Type -Name W -Namespace U -MemberDefinition '[DllImport("user32.dll")] public static extern System.IntPtr GetForegroundWindow(); [DllImport("user32.dll")] public static extern int GetWindowText(System.IntPtr h, System.Text.StringBuilder s, int n);'; $b = New-Object System.Text.StringBuilder 512; [void][U.W]::GetWindowText([U.W]::GetForegroundWindow(), $b, 512); $b.ToString()"#;
    let mut cmd = Command::new("powershell");
    cmd.args(["-NoProfile", "-Command", SCRIPT]);
    cmd
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn focused_window_command() -> Command {
    Command::new("false")
}

fn focused_window_title() -> Option<String> {
    let output = match focused_window_command().output() {
        Ok(output) => output,
        Err(err) => {
            log_warn!("cannot query the focused window: {err}");
            return None;
        }
    };
    if !output.status.success() {
        log_debug!("focused window query exited with {}", output.status);
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}
