use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::actions::{extract, Action};
use crate::db::EventLog;
use crate::feedback::{FeedbackRecorder, SuggestionRecord};
use crate::memory::{CompactionReport, ContextSnapshot, MemoryStore};
use crate::normalize::extract_app_name;
use crate::patterns::{aggregate, write_patterns_document, Scope};
use crate::sensing::{ContextSource, Notifier};
use crate::settings::AgentSettings;
use crate::suggest::{ChainSuggestion, PredictorChain};

use super::{CycleState, PendingSuggestion, SuggestionSlot};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Extra time the chain gets on top of the language model timeout.
const SUGGESTION_SLACK_SECS: u64 = 5;

/// Sizes and periods that shape a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleLimits {
    pub recent_file_limit: usize,
    pub process_limit: usize,
    pub history_window: usize,
    /// Rewrite the patterns document every this many cycles; 0 never.
    pub patterns_every_cycles: u64,
    /// Compact memory and drain the event log every this many cycles; 0 never.
    pub compact_every_cycles: u64,
    /// Longest wait for the predictor chain before the heuristic tier answers.
    pub suggestion_timeout: Duration,
}

impl Default for CycleLimits {
    fn default() -> Self {
        Self::from(&AgentSettings::default())
    }
}

impl From<&AgentSettings> for CycleLimits {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            recent_file_limit: settings.recent_file_limit,
            process_limit: settings.process_limit,
            history_window: settings.history_window,
            patterns_every_cycles: settings.patterns_every_cycles,
            compact_every_cycles: settings.compact_every_cycles,
            suggestion_timeout: Duration::from_secs(settings.llm.timeout_secs + SUGGESTION_SLACK_SECS),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub snapshot: ContextSnapshot,
    /// Whether the snapshot made it into memory.
    pub recorded: bool,
    /// Feedback on the previous cycle's suggestion.
    pub feedback: Option<SuggestionRecord>,
    pub suggestion: ChainSuggestion,
    pub action: Action,
    pub notified: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub compaction: Option<CompactionReport>,
    pub replayed: usize,
    pub pruned: usize,
}

pub struct CycleOrchestrator {
    context: Arc<dyn ContextSource>,
    memory: MemoryStore,
    event_log: Option<EventLog>,
    feedback: FeedbackRecorder,
    chain: PredictorChain,
    notifier: Notifier,
    slot: SuggestionSlot,
    patterns_path: Option<PathBuf>,
    limits: CycleLimits,
    state: CycleState,
    rng: StdRng,
}

impl CycleOrchestrator {
    pub fn new(
        context: Arc<dyn ContextSource>,
        memory: MemoryStore,
        feedback: FeedbackRecorder,
        chain: PredictorChain,
        notifier: Notifier,
        slot: SuggestionSlot,
    ) -> Self {
        Self {
            context,
            memory,
            event_log: None,
            feedback,
            chain,
            notifier,
            slot,
            patterns_path: None,
            limits: CycleLimits::default(),
            state: CycleState::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_event_log(mut self, event_log: EventLog) -> Self {
        self.event_log = Some(event_log);
        self
    }

    pub fn with_patterns_path(mut self, path: PathBuf) -> Self {
        self.patterns_path = Some(path);
        self
    }

    pub fn with_limits(mut self, limits: CycleLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    pub fn slot(&self) -> &SuggestionSlot {
        &self.slot
    }

    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let snapshot = self.observe().await?;
        let now = snapshot.timestamp;

        let feedback = self
            .feedback
            .record(&snapshot.window, &mut self.state.pending, now);
        if let Some(record) = &feedback {
            self.chain.observe_feedback(record);
        }

        let recorded = self.record_snapshot(&snapshot).await;

        let memory = self.memory.load();
        let current_app = extract_app_name(&snapshot.window);
        let patterns = aggregate(&memory, Scope::All, Some(&current_app));
        let history_start = memory.len().saturating_sub(self.limits.history_window);
        let recent_windows: Vec<String> = memory[history_start..]
            .iter()
            .map(|entry| entry.window.clone())
            .collect();

        // The previous suggestion is resolved by now, so a slow tier must not
        // leave this cycle without one.
        let suggestion = match tokio::time::timeout(
            self.limits.suggestion_timeout,
            self.chain
                .get_suggestion(&snapshot, &recent_windows, &patterns, now, &mut self.rng),
        )
        .await
        {
            Ok(suggestion) => suggestion,
            Err(_) => {
                log_warn!(
                    "predictor chain exceeded {}s, using the heuristic tier",
                    self.limits.suggestion_timeout.as_secs()
                );
                self.chain.heuristic(&snapshot, &patterns, now, &mut self.rng)
            }
        };
        log_info!("[{:?}] {}", suggestion.tier, suggestion.text);

        let action = extract(&suggestion.text);
        let target = suggestion
            .app
            .clone()
            .or_else(|| action.app().map(str::to_string))
            .unwrap_or_else(|| current_app.clone());
        self.state.pending = Some(PendingSuggestion {
            text: suggestion.text.clone(),
            extracted_app: target,
            issued_at: now,
        });

        self.slot.publish(suggestion.text.clone());
        let notified = self.notifier.notify(&suggestion.text);

        self.state.cycles += 1;
        let cycles = self.state.cycles;

        if every(self.limits.patterns_every_cycles, cycles) {
            if let Some(path) = &self.patterns_path {
                match write_patterns_document(path, &aggregate(&memory, Scope::All, None)) {
                    Ok(()) => log_debug!("patterns written to {}", path.display()),
                    Err(err) => log_error!("failed to write patterns: {err:#}"),
                }
            }
        }

        if every(self.limits.compact_every_cycles, cycles) {
            if let Err(err) = self.maintain().await {
                log_error!("memory maintenance failed: {err:#}");
            }
        }

        Ok(CycleReport {
            snapshot,
            recorded,
            feedback,
            suggestion,
            action,
            notified,
        })
    }

    async fn observe(&self) -> Result<ContextSnapshot> {
        let context = Arc::clone(&self.context);
        let (file_limit, process_limit) = (self.limits.recent_file_limit, self.limits.process_limit);

        let (window, files, processes) = tokio::task::spawn_blocking(move || {
            (
                context.active_window_title(),
                context.recent_files(file_limit),
                context.top_processes(process_limit),
            )
        })
        .await
        .context("context snapshot task failed to join")?;

        Ok(ContextSnapshot::new(Local::now(), window, files, processes))
    }

    /// Event log first, so a crash between the two writes can be replayed.
    async fn record_snapshot(&self, snapshot: &ContextSnapshot) -> bool {
        if let Err(err) = snapshot.validate() {
            log_warn!("not recording snapshot: {err}");
            return false;
        }

        if let Some(log) = &self.event_log {
            if let Err(err) = log.insert_snapshot(snapshot).await {
                log_error!("failed to log snapshot event: {err:#}");
            }
        }

        self.memory.append_snapshot(snapshot.clone())
    }

    /// Replay logged snapshots memory is missing, drop invalid entries and
    /// prune the event log up to what memory now holds.
    pub async fn maintain(&self) -> Result<MaintenanceReport> {
        let mut report = MaintenanceReport::default();

        if let Some(log) = &self.event_log {
            let events = log.snapshots_since(None).await?;
            report.replayed = self.memory.reconcile(&events)?;
        }

        report.compaction = Some(self.memory.compact()?);

        if let Some(log) = &self.event_log {
            if let Some(newest) = self.memory.load().last().map(|entry| entry.timestamp) {
                report.pruned = log.prune_through(newest).await?;
            }
        }

        log_info!(
            "maintenance: replayed {}, pruned {} events",
            report.replayed,
            report.pruned
        );
        Ok(report)
    }
}

fn every(period: u64, cycles: u64) -> bool {
    period > 0 && cycles % period == 0
}
