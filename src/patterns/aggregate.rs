use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};

use crate::memory::ContextSnapshot;
use crate::normalize::extract_app_name;
use crate::utils::fs::base_name;

use super::counter::OrderedCounter;

pub type Ranked = (String, usize);

const FREQUENT_LIMIT: usize = 5;
const SEQUENCE_LIMIT: usize = 3;
const FILES_WITH_APP_LIMIT: usize = 3;
const PROCESSES_WITH_APP_LIMIT: usize = 5;

/// Which part of the memory to aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    LastN(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPart {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPart {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => DayPart::Morning,
            12..=16 => DayPart::Afternoon,
            17..=21 => DayPart::Evening,
            _ => DayPart::Night,
        }
    }

    pub fn of(timestamp: &DateTime<Local>) -> Self {
        Self::from_hour(timestamp.hour())
    }

    pub const ALL: [DayPart; 4] = [
        DayPart::Morning,
        DayPart::Afternoon,
        DayPart::Evening,
        DayPart::Night,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DayPart::Morning => "morning",
            DayPart::Afternoon => "afternoon",
            DayPart::Evening => "evening",
            DayPart::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternSummary {
    pub frequent_windows: Vec<Ranked>,
    pub frequent_files: Vec<Ranked>,
    pub frequent_processes: Vec<Ranked>,
    /// App the sequence and co-occurrence statistics are conditioned on.
    pub focus_app: String,
    pub frequent_files_with_app: Vec<Ranked>,
    pub frequent_processes_with_app: Vec<Ranked>,
    /// Apps switched to from `focus_app`; consecutive entries of the same
    /// app never count.
    pub next_apps: Vec<Ranked>,
    /// Apps switched from into `focus_app`, self-transitions excluded.
    pub previous_apps: Vec<Ranked>,
    /// Average contiguous minutes per app, rounded to 0.1.
    pub avg_app_duration: BTreeMap<String, f64>,
    pub time_of_day: BTreeMap<DayPart, usize>,
}

impl PatternSummary {
    pub fn focus_dwell_minutes(&self) -> Option<f64> {
        self.avg_app_duration.get(&self.focus_app).copied()
    }
}

/// Compute pattern statistics over `memory` (chronological order).
///
/// Sequence and co-occurrence statistics are conditioned on `focus_app`, or
/// on the app of the newest snapshot in scope when none is given.
pub fn aggregate(memory: &[ContextSnapshot], scope: Scope, focus_app: Option<&str>) -> PatternSummary {
    let entries = match scope {
        Scope::All => memory,
        Scope::LastN(n) => &memory[memory.len().saturating_sub(n)..],
    };

    let apps: Vec<String> = entries.iter().map(|e| extract_app_name(&e.window)).collect();
    let focus_app = focus_app
        .map(str::to_string)
        .or_else(|| apps.last().cloned())
        .unwrap_or_default();

    let mut windows = OrderedCounter::new();
    let mut files = OrderedCounter::new();
    let mut processes = OrderedCounter::new();
    let mut files_with_app = OrderedCounter::new();
    let mut processes_with_app = OrderedCounter::new();
    let mut time_of_day = BTreeMap::new();

    for (entry, app) in entries.iter().zip(&apps) {
        windows.add(&entry.window);
        let file_keys: Vec<String> = entry
            .recent_files
            .iter()
            .filter(|f| !f.is_empty())
            .map(|f| file_key(f))
            .collect();
        files.extend(file_keys.iter().map(String::as_str));
        processes.extend(entry.top_processes.iter().map(String::as_str));

        if *app == focus_app {
            files_with_app.extend(file_keys.iter().map(String::as_str));
            processes_with_app.extend(
                entry
                    .top_processes
                    .iter()
                    .filter(|p| !p.is_empty())
                    .map(String::as_str),
            );
        }

        *time_of_day.entry(DayPart::of(&entry.timestamp)).or_insert(0) += 1;
    }

    let (next_apps, previous_apps) = transitions(&apps, &focus_app);

    PatternSummary {
        frequent_windows: windows.most_common(FREQUENT_LIMIT),
        frequent_files: files.most_common(FREQUENT_LIMIT),
        frequent_processes: processes.most_common(FREQUENT_LIMIT),
        frequent_files_with_app: files_with_app.most_common(FILES_WITH_APP_LIMIT),
        frequent_processes_with_app: processes_with_app.most_common(PROCESSES_WITH_APP_LIMIT),
        next_apps,
        previous_apps,
        avg_app_duration: average_dwell(entries, &apps),
        time_of_day,
        focus_app,
    }
}

/// Apps seen right after and right before `focus_app`. Staying in the same
/// app is not a transition.
fn transitions(apps: &[String], focus_app: &str) -> (Vec<Ranked>, Vec<Ranked>) {
    let mut next = OrderedCounter::new();
    let mut previous = OrderedCounter::new();

    for pair in apps.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if prev == curr {
            continue;
        }
        if curr == focus_app {
            previous.add(prev);
        }
        if prev == focus_app {
            next.add(curr);
        }
    }

    (next.most_common(SEQUENCE_LIMIT), previous.most_common(SEQUENCE_LIMIT))
}

/// Run-length walk over the app sequence; a run's length in minutes is
/// recorded when the app changes. Entries earlier than the current run start
/// are skipped.
fn average_dwell(entries: &[ContextSnapshot], apps: &[String]) -> BTreeMap<String, f64> {
    let mut durations: HashMap<&str, Vec<f64>> = HashMap::new();
    let mut run: Option<(&str, DateTime<Local>)> = None;

    for (entry, app) in entries.iter().zip(apps) {
        match run {
            Some((_, start)) if entry.timestamp < start => continue,
            Some((current, start)) if current != app.as_str() => {
                let minutes = (entry.timestamp - start).num_seconds() as f64 / 60.0;
                durations.entry(current).or_default().push(minutes);
                run = Some((app.as_str(), entry.timestamp));
            }
            Some(_) => {}
            None => run = Some((app.as_str(), entry.timestamp)),
        }
    }

    durations
        .into_iter()
        .map(|(app, spans)| {
            let avg = spans.iter().sum::<f64>() / spans.len() as f64;
            (app.to_string(), (avg * 10.0).round() / 10.0)
        })
        .collect()
}

/// File basename with its extension lowercased, so `Notes.TXT` and `notes.txt`
/// in different folders count together only when the stem matches exactly.
pub(crate) fn file_key(path: &str) -> String {
    let base = base_name(path);
    match base.rfind('.') {
        Some(dot) if dot > 0 => format!("{}{}", &base[..dot], base[dot..].to_lowercase()),
        _ => base.to_string(),
    }
}
