pub mod actions;
pub mod db;
pub mod feedback;
pub mod memory;
pub mod normalize;
pub mod orchestrator;
pub mod patterns;
pub mod sensing;
pub mod settings;
pub mod suggest;
pub mod training;
pub mod utils;

use std::io::BufRead;
use std::sync::Arc;
use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use actions::ActionExecutor;
use db::EventLog;
use feedback::{FeedbackRecorder, FeedbackStore};
use memory::MemoryStore;
use orchestrator::{accept_worker, AgentController, CycleLimits, CycleOrchestrator, SuggestionSlot};
use sensing::{LogSink, Notifier, SystemContextSource, SystemLauncher};
use settings::{AgentSettings, DataPaths, LlmTransport, SettingsStore};
use suggest::{ArtifactPredictor, LearnedTier, LlmTier, OllamaCli, OllamaHttp, PredictorChain, TextCompletion};

const ENABLE_LOGS: bool = true;

/// Slack on top of the language model timeout before a cycle is abandoned.
const CYCLE_TIMEOUT_SLACK_SECS: u64 = 30;
const ACCEPT_QUEUE: usize = 4;

/// Everything rooted in one data directory.
pub struct AppState {
    pub paths: DataPaths,
    pub settings: SettingsStore,
    pub memory: MemoryStore,
    pub feedback: FeedbackStore,
    pub slot: SuggestionSlot,
}

impl AppState {
    pub fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let paths = DataPaths::resolve(data_dir)?;
        paths.ensure()?;

        let settings = SettingsStore::new(paths.settings())?;
        let agent = settings.agent();
        let memory = MemoryStore::new(paths.memory()).with_max_entries(agent.max_memory_entries);
        let feedback = FeedbackStore::new(paths.feedback());

        Ok(Self {
            paths,
            settings,
            memory,
            feedback,
            slot: SuggestionSlot::new(),
        })
    }

    pub fn agent(&self) -> AgentSettings {
        self.settings.agent()
    }

    /// Learned tier from the trained artifacts, the language model when
    /// enabled, and the heuristic ranker.
    pub fn predictor_chain(&self, cancel: &CancellationToken) -> PredictorChain {
        let agent = self.agent();
        let learned = LearnedTier::new(Box::new(ArtifactPredictor::new(self.paths.models())));

        let llm = agent.llm.enabled.then(|| {
            let service: Box<dyn TextCompletion> = match agent.llm.transport {
                LlmTransport::Http => Box::new(OllamaHttp::new(&agent.llm.endpoint, &agent.llm.model)),
                LlmTransport::Cli => Box::new(OllamaCli::new(&agent.llm.model)),
            };
            LlmTier::new(service, Duration::from_secs(agent.llm.timeout_secs))
                .with_cancellation(cancel.child_token())
        });

        PredictorChain::new(Some(learned), llm).with_feedback(self.feedback.view())
    }

    pub fn orchestrator(&self, cancel: &CancellationToken) -> Result<CycleOrchestrator> {
        let agent = self.agent();
        let context = SystemContextSource::new(agent.watch_dirs.clone());
        let feedback = FeedbackRecorder::new(self.feedback.clone())
            .with_window(chrono::Duration::seconds(agent.feedback_window_secs));
        let notifier = Notifier::new(
            Box::new(LogSink),
            Duration::from_secs(agent.notification_cooldown_secs),
        );
        let event_log = EventLog::open(self.paths.event_log())?;

        Ok(CycleOrchestrator::new(
            Arc::new(context),
            self.memory.clone(),
            feedback,
            self.predictor_chain(cancel),
            notifier,
            self.slot.clone(),
        )
        .with_event_log(event_log)
        .with_patterns_path(self.paths.patterns())
        .with_limits(CycleLimits::from(&agent)))
    }

    pub fn executor(&self) -> ActionExecutor {
        ActionExecutor::new(Arc::new(SystemLauncher), self.agent().project_root)
    }
}

/// Send one trigger per line read from stdin.
///
/// A plain thread rather than a runtime task: a blocked stdin read cannot
/// be cancelled and must not hold up runtime shutdown.
fn forward_stdin_lines(triggers: mpsc::Sender<()>) -> Result<()> {
    std::thread::Builder::new()
        .name("nudge-accept-input".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if line.is_err() || triggers.blocking_send(()).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn the accept input thread")?;
    Ok(())
}

/// Run the suggestion loop until Ctrl-C. Each line on stdin accepts the
/// current suggestion.
pub async fn run(state: AppState) -> Result<()> {
    let agent = state.agent();
    let cancel_token = CancellationToken::new();
    let orchestrator = state.orchestrator(&cancel_token)?;

    log_info!("nudge starting up, data in {}", state.paths.root.display());

    let (accept_tx, accept_rx) = mpsc::channel(ACCEPT_QUEUE);
    let accept = tokio::spawn(accept_worker(
        state.slot.clone(),
        Arc::new(state.executor()),
        accept_rx,
        cancel_token.child_token(),
    ));
    forward_stdin_lines(accept_tx)?;
    log_info!("press Enter to act on the current suggestion");

    let mut controller = AgentController::new();
    controller.start(
        orchestrator,
        Duration::from_secs(agent.cycle_interval_secs.max(1)),
        Duration::from_secs(agent.llm.timeout_secs + CYCLE_TIMEOUT_SLACK_SECS),
        cancel_token,
    )?;

    tokio::signal::ctrl_c().await?;
    log_info!("shutdown requested");
    controller.stop().await?;
    accept.await.context("accept worker failed to join")
}
