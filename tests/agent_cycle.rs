use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use chrono::{Local, TimeZone};
use rand::rngs::StdRng;
use rand::SeedableRng;

use nudge_lib::feedback::{FeedbackRecorder, FeedbackStore};
use nudge_lib::memory::{ContextSnapshot, MemoryStore};
use nudge_lib::orchestrator::{CycleOrchestrator, SuggestionSlot};
use nudge_lib::patterns::PatternsDocument;
use nudge_lib::sensing::{ContextSource, NotificationSink, Notifier};
use nudge_lib::suggest::{ArtifactPredictor, LearnedTier, PredictorChain, Tier};
use nudge_lib::training;

/// Replays a fixed list of window titles, one per cycle, repeating the last.
struct Desktop {
    windows: Mutex<Vec<String>>,
}

impl Desktop {
    fn new(windows: &[&str]) -> Self {
        Self {
            windows: Mutex::new(windows.iter().rev().map(|w| w.to_string()).collect()),
        }
    }
}

impl ContextSource for Desktop {
    fn active_window_title(&self) -> String {
        let mut windows = self.windows.lock().unwrap();
        if windows.len() > 1 {
            windows.pop().unwrap()
        } else {
            windows.last().cloned().unwrap_or_default()
        }
    }

    fn recent_files(&self, limit: usize) -> Vec<String> {
        ["/home/sam/thesis/chapter1.docx", "/home/sam/thesis/analysis.py"]
            .iter()
            .take(limit)
            .map(|f| f.to_string())
            .collect()
    }

    fn top_processes(&self, limit: usize) -> Vec<String> {
        ["code", "firefox", "slack"]
            .iter()
            .take(limit)
            .map(|p| p.to_string())
            .collect()
    }
}

#[derive(Clone, Default)]
struct Inbox(Arc<Mutex<Vec<String>>>);

impl NotificationSink for Inbox {
    fn show(&self, _title: &str, message: &str) -> Result<()> {
        self.0.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

fn orchestrator(
    dir: &tempfile::TempDir,
    desktop: Desktop,
    chain: PredictorChain,
    inbox: Inbox,
) -> CycleOrchestrator {
    CycleOrchestrator::new(
        Arc::new(desktop),
        MemoryStore::new(dir.path().join("memory.json")),
        FeedbackRecorder::new(FeedbackStore::new(dir.path().join("feedback.json"))),
        chain,
        Notifier::new(Box::new(inbox), Duration::from_secs(30)),
        SuggestionSlot::new(),
    )
    .with_patterns_path(dir.path().join("patterns.json"))
    .with_rng(StdRng::seed_from_u64(42))
}

#[tokio::test]
async fn every_cycle_but_the_first_resolves_feedback() {
    let dir = tempfile::tempdir().unwrap();
    let desktop = Desktop::new(&[
        "chapter1.docx - Word",
        "Inbox - Outlook",
        "analysis.py - Visual Studio Code",
        "chapter1.docx - Word",
        "Research - Google Chrome",
    ]);
    let inbox = Inbox::default();
    let mut orchestrator = orchestrator(&dir, desktop, PredictorChain::heuristic_only(), inbox.clone());

    let mut resolved = 0;
    for _ in 0..5 {
        let report = orchestrator.run_cycle().await.unwrap();
        assert!(report.recorded);
        assert_eq!(report.suggestion.tier, Tier::Heuristic);
        if report.feedback.is_some() {
            resolved += 1;
        }
    }
    assert_eq!(resolved, 4);

    let stats = FeedbackStore::new(dir.path().join("feedback.json")).load().stats;
    assert_eq!(stats.total, 4);
    assert_eq!(stats.followed + stats.ignored, 4);

    assert_eq!(MemoryStore::new(dir.path().join("memory.json")).load().len(), 5);
    // Cooldown lets only the first suggestion through.
    assert_eq!(inbox.0.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn patterns_document_has_the_three_lists() {
    let dir = tempfile::tempdir().unwrap();
    let desktop = Desktop::new(&["chapter1.docx - Word"]);
    let mut orchestrator = orchestrator(&dir, desktop, PredictorChain::heuristic_only(), Inbox::default());

    for _ in 0..10 {
        orchestrator.run_cycle().await.unwrap();
    }

    let raw = std::fs::read_to_string(dir.path().join("patterns.json")).unwrap();
    let doc: PatternsDocument = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc.frequent_windows, vec![("chapter1.docx - Word".to_string(), 10)]);
    assert_eq!(doc.frequent_processes[0], ("code".to_string(), 10));
    assert_eq!(doc.frequent_files.len(), 2);
}

#[tokio::test]
async fn trained_model_drives_the_learned_tier() {
    let dir = tempfile::tempdir().unwrap();
    let memory = MemoryStore::new(dir.path().join("memory.json"));
    let start = Local.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
    let history: Vec<ContextSnapshot> = (0..20)
        .map(|i| {
            let window = if i % 2 == 0 { "Editor - main.rs" } else { "Browser - docs" };
            ContextSnapshot::new(
                start + chrono::Duration::minutes(i),
                window,
                vec!["/home/sam/nudge/src/main.rs".into()],
                vec!["code".into()],
            )
        })
        .collect();
    memory.save(&history).unwrap();

    let models = dir.path().join("models");
    let report = training::train(&memory.load(), &models).unwrap();
    assert_eq!(report.apps, 2);

    let learned = LearnedTier::new(Box::new(ArtifactPredictor::new(models)));
    let chain = PredictorChain::new(Some(learned), None);
    let desktop = Desktop::new(&["Editor - lib.rs"]);
    let mut orchestrator = orchestrator(&dir, desktop, chain, Inbox::default());

    let report = orchestrator.run_cycle().await.unwrap();
    assert_eq!(report.suggestion.tier, Tier::Learned);
    assert_eq!(report.suggestion.app.as_deref(), Some("Browser"));
    assert!(report.suggestion.text.contains("Browser"));
    assert_eq!(
        orchestrator.state().pending.as_ref().unwrap().extracted_app,
        "Browser"
    );
}
