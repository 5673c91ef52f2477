//! Local language-model tier. The model is reached through the
//! [`TextCompletion`] capability; HTTP and CLI transports are interchangeable.

use std::{process::Stdio, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{io::AsyncWriteExt, process::Command};
use tokio_util::sync::CancellationToken;

use crate::memory::ContextSnapshot;
use crate::normalize::extract_app_name_trailing;
use crate::patterns::PatternSummary;
use crate::utils::fs::base_name;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const MIN_REPLY_CHARS: usize = 10;
const REPLY_LABEL: &str = "Your specific, actionable suggestion:";
const DESCRIPTIVE_OPENERS: [&str; 4] = ["you are", "i am", "the user is", "this is"];
const PROMPT_FILES: usize = 5;

#[async_trait]
pub trait TextCompletion: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap check that the service is reachable before a full request.
    async fn is_available(&self) -> bool;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Ollama's `/api/generate` endpoint.
pub struct OllamaHttp {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaHttp {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextCompletion for OllamaHttp {
    fn name(&self) -> &str {
        "ollama-http"
    }

    async fn is_available(&self) -> bool {
        let probe = self
            .client
            .get(format!("{}/api/tags", self.endpoint))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        matches!(probe, Ok(response) if response.status().is_success())
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&request)
            .send()
            .await
            .context("failed to reach the language model")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("language model request failed with status {status}: {body}");
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .context("failed to parse language model reply")?;
        Ok(reply.response.trim().to_string())
    }
}

/// `ollama run <model>` with the prompt on stdin. The child is killed if the
/// request future is dropped, e.g. on timeout.
pub struct OllamaCli {
    program: String,
    model: String,
}

impl OllamaCli {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            program: "ollama".to_string(),
            model: model.into(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl TextCompletion for OllamaCli {
    fn name(&self) -> &str {
        "ollama-cli"
    }

    async fn is_available(&self) -> bool {
        let status = Command::new(&self.program)
            .arg("list")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();
        matches!(tokio::time::timeout(PROBE_TIMEOUT, status).await, Ok(Ok(s)) if s.success())
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(["run", &self.model])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start {}", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("{} stdin unavailable", self.program))?;
        stdin
            .write_all(prompt.as_bytes())
            .await
            .context("failed to send prompt")?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .context("failed to read language model output")?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Prompt describing the current context and the user's habits.
pub fn build_prompt(snapshot: &ContextSnapshot, patterns: &PatternSummary) -> String {
    let app = extract_app_name_trailing(&snapshot.window);
    let files = join_or_none(
        snapshot
            .recent_files
            .iter()
            .take(PROMPT_FILES)
            .map(|f| base_name(f)),
    );
    let processes = join_or_none(snapshot.top_processes.iter().map(String::as_str));

    let mut habits = String::new();
    let focus = &patterns.focus_app;
    if let Some((next, _)) = patterns.next_apps.first() {
        habits.push_str(&format!("- Often switches to {next} after using {focus}\n"));
    }
    if !patterns.frequent_files_with_app.is_empty() {
        let names = join_or_none(patterns.frequent_files_with_app.iter().take(2).map(|(f, _)| f.as_str()));
        habits.push_str(&format!("- Frequently works with {names} in {focus}\n"));
    }
    if let Some(minutes) = patterns.focus_dwell_minutes() {
        habits.push_str(&format!("- Usually spends {minutes:.1} minutes in {focus}\n"));
    }
    if habits.is_empty() {
        habits.push_str("- No established habits yet\n");
    }

    format!(
        "You suggest one next action to help someone work productively on their computer.\n\
         \n\
         Current activity:\n\
         - Active Window: {window}\n\
         - Application: {app}\n\
         - Recent Files: {files}\n\
         - Running Processes: {processes}\n\
         \n\
         Habits:\n\
         {habits}\n\
         Reply with ONE concrete, actionable suggestion for {app}, as a single sentence \
         starting with a verb (for example \"Use\", \"Open\" or \"Press\"). \
         Name a keyboard shortcut, feature or application when it helps. \
         Do not describe what the user is doing.\n\
         \n\
         {REPLY_LABEL}\n",
        window = snapshot.window,
    )
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "None".to_string()
    } else {
        joined
    }
}

/// Keep only replies that read like an actionable suggestion.
pub fn post_filter(raw: &str) -> Option<String> {
    let reply = raw.trim();
    if reply.is_empty() || reply.starts_with("Error:") || reply.chars().count() <= MIN_REPLY_CHARS {
        return None;
    }

    let reply = reply.replace(REPLY_LABEL, "");
    let reply = reply.trim();
    let lower = reply.to_lowercase();
    if DESCRIPTIVE_OPENERS.iter().any(|opener| lower.starts_with(opener)) {
        return None;
    }
    if reply.is_empty() {
        return None;
    }
    Some(reply.to_string())
}

pub struct LlmTier {
    service: Box<dyn TextCompletion>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl LlmTier {
    pub fn new(service: Box<dyn TextCompletion>, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight requests when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// `Ok(None)` when the service is unavailable or the reply is rejected;
    /// an error on timeout, cancellation or transport failure.
    pub async fn suggest(
        &self,
        snapshot: &ContextSnapshot,
        patterns: &PatternSummary,
    ) -> Result<Option<String>> {
        let prompt = build_prompt(snapshot, patterns);
        let request = async {
            if !self.service.is_available().await {
                log_debug!("{} is not available", self.service.name());
                return Ok(None);
            }
            let raw = self.service.complete(&prompt).await?;
            let accepted = post_filter(&raw);
            if accepted.is_none() {
                log_info!("discarded non-actionable reply from {}", self.service.name());
            }
            Ok(accepted)
        };

        tokio::select! {
            _ = self.cancel.cancelled() => bail!("language model request cancelled"),
            outcome = tokio::time::timeout(self.timeout, request) => match outcome {
                Ok(result) => result,
                Err(_) => bail!(
                    "{} did not answer within {}s",
                    self.service.name(),
                    self.timeout.as_secs_f64()
                ),
            },
        }
    }
}
