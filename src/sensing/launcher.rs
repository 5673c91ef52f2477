use std::{
    path::Path,
    process::{Command, ExitStatus},
    thread::{self, JoinHandle},
};

use anyhow::{Context, Result};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Starts programs, scripts and URLs on behalf of an accepted suggestion.
pub trait Launcher: Send + Sync {
    /// Start `program`, resolved through `PATH` by the OS.
    fn open_executable(&self, program: &str) -> Result<()>;

    /// Run `script` with `interpreter`; leading interpreter flags go in
    /// `interpreter[1..]`.
    fn open_script(&self, interpreter: &[&str], script: &Path) -> Result<()>;

    fn open_url(&self, url: &str) -> Result<()>;
}

/// Spawns child processes; a background thread waits on each one so it is
/// reaped when it exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl SystemLauncher {
    fn spawn(cmd: Command) -> Result<()> {
        Self::spawn_reaped(cmd).map(|_| ())
    }

    /// The handle yields the exit status once the child is gone, `None`
    /// when there is no reaper thread.
    fn spawn_reaped(mut cmd: Command) -> Result<Option<JoinHandle<Option<ExitStatus>>>> {
        let description = format!("{cmd:?}");
        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to launch {description}"))?;
        log_debug!("launched {description}");

        let reaper = thread::Builder::new()
            .name("nudge-reaper".into())
            .spawn(move || match child.wait() {
                Ok(status) => {
                    log_debug!("{description} exited with {status}");
                    Some(status)
                }
                Err(err) => {
                    log_warn!("failed to wait on {description}: {err}");
                    None
                }
            });
        match reaper {
            Ok(handle) => Ok(Some(handle)),
            Err(err) => {
                log_warn!("no reaper thread for launched process: {err}");
                Ok(None)
            }
        }
    }
}

#[cfg(target_os = "windows")]
fn url_command(url: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", "", url]);
    cmd
}

#[cfg(target_os = "macos")]
fn url_command(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn url_command(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}

impl Launcher for SystemLauncher {
    fn open_executable(&self, program: &str) -> Result<()> {
        Self::spawn(Command::new(program))
    }

    fn open_script(&self, interpreter: &[&str], script: &Path) -> Result<()> {
        let (program, flags) = interpreter
            .split_first()
            .context("no interpreter given for script")?;
        let mut cmd = Command::new(program);
        cmd.args(flags).arg(script);
        if let Some(dir) = script.parent() {
            cmd.current_dir(dir);
        }
        Self::spawn(cmd)
    }

    fn open_url(&self, url: &str) -> Result<()> {
        Self::spawn(url_command(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_an_error() {
        let launcher = SystemLauncher;
        assert!(launcher
            .open_executable("nudge-definitely-not-a-real-program")
            .is_err());
    }

    #[cfg(unix)]
    #[test]
    fn launched_processes_are_waited_on() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exit 3"]);
        let status = SystemLauncher::spawn_reaped(cmd)
            .unwrap()
            .expect("reaper thread")
            .join()
            .unwrap()
            .expect("exit status");
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn script_needs_an_interpreter() {
        let err = SystemLauncher
            .open_script(&[], Path::new("run.sh"))
            .unwrap_err();
        assert!(err.to_string().contains("interpreter"));
    }
}
