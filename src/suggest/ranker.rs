//! Weighted heuristic ranker: independent signal sources each propose
//! candidates at a fixed weight, and one of the heaviest is picked at random.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::feedback::FeedbackView;
use crate::memory::ContextSnapshot;
use crate::normalize::extract_app_name;
use crate::patterns::{DayPart, PatternSummary};

use super::category::context_category;
use super::tips;

pub const NO_SUGGESTION: &str = "No specific suggestions at this time.";

const WORKFLOW_MIN_OCCURRENCES: usize = 3;
const LONG_DWELL_MINUTES: f64 = 45.0;
/// Weight left on a candidate whose app keeps being ignored.
const SUPPRESSED_WEIGHT: u8 = 1;
const SOURCE_EXTENSIONS: [&str; 4] = [".py", ".js", ".html", ".css"];
const CODE_PROCESSES: [&str; 2] = ["code.exe", "code"];
const BROWSER_PROCESSES: [&str; 5] = ["chrome.exe", "msedge.exe", "firefox.exe", "chrome", "firefox"];
const USER_ROOTS: [&str; 2] = ["users", "home"];
const IGNORED_PATH_PARTS: [&str; 3] = ["desktop", "documents", "downloads"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Workflow,
    TimeOfDay,
    Project,
    FileExtension,
    Process,
    TaskCompletion,
    LongDwell,
    FrequentFile,
    Category,
}

impl CandidateSource {
    pub fn weight(self) -> u8 {
        match self {
            CandidateSource::Workflow => 5,
            CandidateSource::TimeOfDay | CandidateSource::Project => 4,
            CandidateSource::FileExtension
            | CandidateSource::Process
            | CandidateSource::TaskCompletion
            | CandidateSource::LongDwell => 3,
            CandidateSource::FrequentFile | CandidateSource::Category => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub text: String,
    pub weight: u8,
    pub source: CandidateSource,
    /// App the candidate points at, when it names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
}

impl Candidate {
    fn new(source: CandidateSource, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight: source.weight(),
            source,
            app: None,
        }
    }

    fn for_app(mut self, app: &str) -> Self {
        self.app = Some(app.to_string());
        self
    }

    fn with_weight(source: CandidateSource, weight: u8, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight,
            source,
            app: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RankedSuggestion {
    Chosen(Candidate),
    Nothing,
}

impl RankedSuggestion {
    pub fn text(&self) -> &str {
        match self {
            RankedSuggestion::Chosen(candidate) => &candidate.text,
            RankedSuggestion::Nothing => NO_SUGGESTION,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            RankedSuggestion::Chosen(candidate) => candidate.text,
            RankedSuggestion::Nothing => NO_SUGGESTION.to_string(),
        }
    }
}

/// All candidates the current context supports, in source order.
pub fn rank(snapshot: &ContextSnapshot, patterns: &PatternSummary, now: DateTime<Local>) -> Vec<Candidate> {
    let current_app = extract_app_name(&snapshot.window);
    let processes: Vec<String> = snapshot.top_processes.iter().map(|p| p.to_lowercase()).collect();
    let has_process = |names: &[&str]| processes.iter().any(|p| names.contains(&p.as_str()));

    let mut candidates = Vec::new();

    if let Some((next_app, count)) = patterns.next_apps.first() {
        if *count >= WORKFLOW_MIN_OCCURRENCES {
            candidates.extend(
                tips::workflow_templates(&current_app, next_app)
                    .into_iter()
                    .map(|text| Candidate::new(CandidateSource::Workflow, text).for_app(next_app)),
            );
        }
    }

    candidates.push(Candidate::new(
        CandidateSource::TimeOfDay,
        tips::day_part_tip(DayPart::of(&now)),
    ));

    if let Some(project) = project_context(&snapshot.recent_files) {
        candidates.push(Candidate::new(CandidateSource::Project, tips::project_tip(&project)));
    }

    for file in &snapshot.recent_files {
        if let Some(tip) = tips::extension_tip(file) {
            candidates.push(Candidate::new(CandidateSource::FileExtension, tip));
        }
    }

    for process in &snapshot.top_processes {
        if let Some(tip) = tips::process_tip(process) {
            candidates.push(Candidate::new(CandidateSource::Process, tip));
        }
    }

    let has_source_file = snapshot.recent_files.iter().any(|f| {
        let lower = f.to_lowercase();
        SOURCE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    });
    if has_process(&CODE_PROCESSES) && has_source_file {
        candidates.push(Candidate::new(CandidateSource::TaskCompletion, tips::TEST_REMINDER));
    }
    if has_process(&BROWSER_PROCESSES) {
        candidates.push(Candidate::with_weight(
            CandidateSource::TaskCompletion,
            2,
            tips::SAVE_RESEARCH,
        ));
    }

    if let Some(minutes) = patterns.avg_app_duration.get(&current_app) {
        if *minutes > LONG_DWELL_MINUTES {
            candidates.push(Candidate::new(
                CandidateSource::LongDwell,
                tips::long_dwell_tip(&current_app, *minutes),
            ));
        }
    }

    if patterns.focus_app == current_app {
        if let Some((file, _)) = patterns.frequent_files_with_app.first() {
            candidates.push(Candidate::new(
                CandidateSource::FrequentFile,
                tips::frequent_file_tip(file, &current_app),
            ));
        }
    }

    let category = context_category(&snapshot.window, &snapshot.top_processes);
    candidates.extend(
        tips::category_tips(category)
            .iter()
            .map(|tip| Candidate::new(CandidateSource::Category, *tip)),
    );

    candidates
}

/// Push candidates for apps the user keeps ignoring below every other source.
pub fn apply_feedback(candidates: &mut [Candidate], feedback: &FeedbackView) {
    for candidate in candidates.iter_mut() {
        if candidate
            .app
            .as_deref()
            .map_or(false, |app| feedback.is_suppressed(app))
        {
            candidate.weight = SUPPRESSED_WEIGHT;
        }
    }
}

/// Uniform random choice among the candidates carrying the highest weight.
pub fn select<R: Rng + ?Sized>(candidates: &[Candidate], rng: &mut R) -> RankedSuggestion {
    let Some(top) = candidates.iter().map(|c| c.weight).max() else {
        return RankedSuggestion::Nothing;
    };

    let best: Vec<&Candidate> = candidates.iter().filter(|c| c.weight == top).collect();
    best.choose(rng)
        .map(|candidate| RankedSuggestion::Chosen((*candidate).clone()))
        .unwrap_or(RankedSuggestion::Nothing)
}

/// Heuristic suggestion text for the snapshot; never empty.
pub fn suggest<R: Rng + ?Sized>(
    snapshot: &ContextSnapshot,
    patterns: &PatternSummary,
    feedback: &FeedbackView,
    now: DateTime<Local>,
    rng: &mut R,
) -> String {
    let mut candidates = rank(snapshot, patterns, now);
    apply_feedback(&mut candidates, feedback);
    if candidates.is_empty() {
        let category = context_category(&snapshot.window, &snapshot.top_processes);
        if let Some(tip) = tips::category_tips(category).choose(rng) {
            return tip.to_string();
        }
    }
    select(&candidates, rng).into_text()
}

/// Most common directory name across the recent file paths, ignoring
/// drive roots, account folders, hidden folders and generic user folders.
fn project_context(files: &[String]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for file in files {
        let parts: Vec<&str> = file.split(|c: char| c == '/' || c == '\\').collect();
        let Some((_, dirs)) = parts.split_last() else {
            continue;
        };
        let mut skip_next = false;
        for &part in dirs {
            let lower = part.to_lowercase();
            if skip_next {
                skip_next = false;
                continue;
            }
            if USER_ROOTS.contains(&lower.as_str()) {
                // The folder after a user root is the account name.
                skip_next = true;
                continue;
            }
            if part.is_empty()
                || part.starts_with('.')
                || part.ends_with(':')
                || IGNORED_PATH_PARTS.contains(&lower.as_str())
            {
                continue;
            }
            let count = counts.entry(part).or_insert(0);
            if *count == 0 {
                order.push(part);
            }
            *count += 1;
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for part in order {
        let count = counts[part];
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((part, count));
        }
    }
    best.map(|(part, _)| part.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap()
    }

    fn snapshot(window: &str, files: &[&str], procs: &[&str]) -> ContextSnapshot {
        ContextSnapshot::new(
            at(9),
            window,
            files.iter().map(|s| s.to_string()).collect(),
            procs.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn patterns_with_next(app: &str, count: usize) -> PatternSummary {
        PatternSummary {
            focus_app: "main.py".into(),
            next_apps: vec![(app.into(), count)],
            ..PatternSummary::default()
        }
    }

    #[test]
    fn workflow_wins_when_transition_is_established() {
        let snap = snapshot("main.py - Visual Studio Code", &["/work/nudge/main.py"], &["Code.exe"]);
        let patterns = patterns_with_next("Browser", 3);
        let mut rng = StdRng::seed_from_u64(7);

        let candidates = rank(&snap, &patterns, at(9));
        let chosen = select(&candidates, &mut rng);
        match chosen {
            RankedSuggestion::Chosen(c) => {
                assert_eq!(c.source, CandidateSource::Workflow);
                assert!(c.text.contains("Browser"));
            }
            RankedSuggestion::Nothing => panic!("expected a workflow suggestion"),
        }
    }

    #[test]
    fn ignored_workflow_app_loses_to_other_sources() {
        let snap = snapshot("main.py - Visual Studio Code", &["/work/nudge/main.py"], &["Code.exe"]);
        let patterns = patterns_with_next("Browser", 5);

        let mut feedback = FeedbackView::default();
        for _ in 0..3 {
            feedback.observe(&crate::feedback::SuggestionRecord {
                id: uuid::Uuid::new_v4(),
                timestamp: at(8),
                suggestion_text: "Open Browser".into(),
                suggested_app: "browser".into(),
                followed: false,
                time_to_respond: 12.0,
                current_app: "main.py".into(),
            });
        }

        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = suggest(&snap, &patterns, &feedback, at(9), &mut rng);
            assert!(!chosen.contains("Browser"), "{chosen}");
            let mut rng = StdRng::seed_from_u64(seed);
            let unfiltered = suggest(&snap, &patterns, &FeedbackView::default(), at(9), &mut rng);
            assert!(unfiltered.contains("Browser"), "{unfiltered}");
        }
    }

    #[test]
    fn workflow_suppressed_below_three_occurrences() {
        let snap = snapshot("main.py - Visual Studio Code", &["/work/nudge/main.py"], &["Code.exe"]);
        let candidates = rank(&snap, &patterns_with_next("Browser", 2), at(9));
        assert!(candidates.iter().all(|c| c.source != CandidateSource::Workflow));
        assert_eq!(candidates.iter().map(|c| c.weight).max(), Some(4));
    }

    #[test]
    fn sources_carry_their_weights() {
        let snap = snapshot(
            "main.py - Visual Studio Code",
            &["/home/sam/nudge/main.py", "/home/sam/nudge/notes.zip"],
            &["Code.exe", "chrome.exe", "slack.exe"],
        );
        let candidates = rank(&snap, &PatternSummary::default(), at(20));
        let weight_of = |source: CandidateSource| {
            candidates
                .iter()
                .filter(|c| c.source == source)
                .map(|c| c.weight)
                .collect::<Vec<_>>()
        };

        assert_eq!(weight_of(CandidateSource::TimeOfDay), vec![4]);
        assert_eq!(weight_of(CandidateSource::Project), vec![4]);
        assert_eq!(weight_of(CandidateSource::FileExtension), vec![3]);
        assert_eq!(weight_of(CandidateSource::Process), vec![3]);
        assert_eq!(weight_of(CandidateSource::TaskCompletion), vec![3, 2]);
        assert!(weight_of(CandidateSource::Category).iter().all(|w| *w == 2));
        assert!(candidates
            .iter()
            .any(|c| c.text == tips::project_tip("nudge")));
    }

    #[test]
    fn long_dwell_reminder_needs_more_than_45_minutes() {
        let snap = snapshot("Editor - a.txt", &["a.txt"], &["editor"]);
        let mut patterns = PatternSummary::default();
        patterns.avg_app_duration.insert("Editor".into(), 45.0);
        assert!(rank(&snap, &patterns, at(9))
            .iter()
            .all(|c| c.source != CandidateSource::LongDwell));

        patterns.avg_app_duration.insert("Editor".into(), 50.2);
        let reminder = rank(&snap, &patterns, at(9))
            .into_iter()
            .find(|c| c.source == CandidateSource::LongDwell)
            .unwrap();
        assert!(reminder.text.contains("50.2 minutes"));
    }

    #[test]
    fn select_breaks_ties_among_top_weight_only() {
        let candidates = vec![
            Candidate::with_weight(CandidateSource::Category, 2, "low"),
            Candidate::with_weight(CandidateSource::TimeOfDay, 4, "a"),
            Candidate::with_weight(CandidateSource::Project, 4, "b"),
        ];
        let mut seen = std::collections::HashSet::new();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..64 {
            seen.insert(select(&candidates, &mut rng).into_text());
        }
        assert!(seen.contains("a") && seen.contains("b"));
        assert!(!seen.contains("low"));
    }

    #[test]
    fn empty_candidates_yield_sentinel() {
        let mut rng = StdRng::seed_from_u64(0);
        let chosen = select(&[], &mut rng);
        assert_eq!(chosen, RankedSuggestion::Nothing);
        assert_eq!(chosen.text(), NO_SUGGESTION);
        assert!(!chosen.text().is_empty());
    }

    #[test]
    fn same_seed_gives_same_suggestion() {
        let snap = snapshot("Inbox - Outlook", &["/home/u/mail/draft.txt"], &["outlook.exe"]);
        let patterns = PatternSummary::default();
        let feedback = FeedbackView::default();
        let first = suggest(&snap, &patterns, &feedback, at(9), &mut StdRng::seed_from_u64(42));
        let second = suggest(&snap, &patterns, &feedback, at(9), &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn project_context_skips_generic_folders() {
        let files = vec![
            "C:\\Users\\sam\\Desktop\\thesis\\ch1.docx".to_string(),
            "C:\\Users\\sam\\Desktop\\thesis\\ch2.docx".to_string(),
            "/home/sam/.cache/x".to_string(),
        ];
        assert_eq!(project_context(&files), Some("thesis".to_string()));
        assert_eq!(project_context(&["a.py".to_string()]), None);
    }
}
