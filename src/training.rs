//! Offline trainer for the learned predictor tier.
//!
//! Builds the app encodings and the count-based sequence model from the
//! behaviour memory and writes both as JSON next to each other.

use std::{collections::BTreeMap, path::Path};

use anyhow::{bail, Result};
use chrono::Local;
use serde::Serialize;

use crate::memory::ContextSnapshot;
use crate::normalize::extract_app_name;
use crate::patterns::DayPart;
use crate::suggest::learned::{save_artifacts, AppEncodings, SequenceModel, SEQUENCE_LENGTH};

const ENABLE_LOGS: bool = true;

use crate::log_info;

pub const MIN_SEQUENCE_LENGTH: usize = 3;

/// Window titles produced while working on this tool itself. They would teach
/// the model the developer's habits rather than the user's.
const SELF_ARTIFACTS: [&str; 6] = [
    "nudge",
    "memory.json",
    "patterns.json",
    "feedback.json",
    "sequence_model",
    "app_encodings",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub entries: usize,
    pub filtered: usize,
    pub apps: usize,
    pub transitions: usize,
}

struct Observation {
    app: String,
    part: DayPart,
}

/// Chronological app sequence without the tool's own artifacts.
fn observations(memory: &[ContextSnapshot]) -> (Vec<Observation>, usize) {
    let mut sorted: Vec<&ContextSnapshot> = memory.iter().collect();
    sorted.sort_by_key(|entry| entry.timestamp);

    let all: Vec<Observation> = sorted
        .into_iter()
        .map(|entry| Observation {
            app: extract_app_name(&entry.window),
            part: DayPart::of(&entry.timestamp),
        })
        .filter(|obs| !obs.app.is_empty())
        .collect();

    let total = all.len();
    let kept: Vec<Observation> = all
        .into_iter()
        .filter(|obs| {
            let lower = obs.app.to_lowercase();
            !SELF_ARTIFACTS.iter().any(|artifact| lower.contains(artifact))
        })
        .collect();
    let filtered = total - kept.len();
    (kept, filtered)
}

pub fn fit(memory: &[ContextSnapshot]) -> Result<(AppEncodings, SequenceModel, TrainingReport)> {
    let (sequence, filtered) = observations(memory);
    if sequence.len() < MIN_SEQUENCE_LENGTH {
        bail!(
            "need at least {MIN_SEQUENCE_LENGTH} usable entries to train, found {}",
            sequence.len()
        );
    }

    let encodings = AppEncodings::from_apps(sequence.iter().map(|obs| obs.app.as_str()));
    let num_apps = encodings.len();
    let ids: Vec<usize> = sequence.iter().map(|obs| encodings.resolve(&obs.app)).collect();

    let mut transitions = vec![vec![0u32; num_apps]; num_apps];
    for pair in ids.windows(2) {
        transitions[pair[0]][pair[1]] += 1;
    }

    let mut day_part_usage: BTreeMap<DayPart, Vec<u32>> = BTreeMap::new();
    for (obs, id) in sequence.iter().zip(&ids) {
        day_part_usage
            .entry(obs.part)
            .or_insert_with(|| vec![0; num_apps])[*id] += 1;
    }

    let model = SequenceModel {
        sequence_length: SEQUENCE_LENGTH,
        num_apps,
        transitions,
        day_part_usage,
        examples: ids.len() - 1,
        trained_at: Local::now(),
    };
    let report = TrainingReport {
        entries: sequence.len(),
        filtered,
        apps: num_apps,
        transitions: ids.len() - 1,
    };
    Ok((encodings, model, report))
}

/// Fit on `memory` and write the artifacts into `models_dir`.
pub fn train(memory: &[ContextSnapshot], models_dir: &Path) -> Result<TrainingReport> {
    let (encodings, model, report) = fit(memory)?;
    save_artifacts(models_dir, &encodings, &model)?;
    log_info!(
        "trained on {} entries ({} filtered): {} apps, {} transitions",
        report.entries,
        report.filtered,
        report.apps,
        report.transitions
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::learned::{ArtifactPredictor, SequencePredictor};
    use chrono::{Duration, TimeZone};

    fn memory(titles: &[&str]) -> Vec<ContextSnapshot> {
        let start = Local.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                ContextSnapshot::new(
                    start + Duration::minutes(i as i64),
                    *title,
                    vec!["a".into()],
                    vec!["p".into()],
                )
            })
            .collect()
    }

    #[test]
    fn too_little_history_is_rejected() {
        assert!(fit(&memory(&["Editor - a", "Browser - b"])).is_err());
    }

    #[test]
    fn own_artifacts_are_filtered() {
        let (_, _, report) = fit(&memory(&[
            "Editor - a",
            "nudge - dev",
            "Browser - b",
            "memory.json - Visual Studio Code",
            "Editor - c",
        ]))
        .unwrap();
        assert_eq!(report.filtered, 2);
        assert_eq!(report.entries, 3);
        assert_eq!(report.apps, 2);
    }

    #[test]
    fn trained_artifacts_drive_the_predictor() {
        let titles: Vec<&str> = (0..12)
            .flat_map(|_| ["Editor - main.rs", "Browser - docs", "Mail - inbox"])
            .collect();
        let dir = tempfile::tempdir().unwrap();
        let report = train(&memory(&titles), dir.path()).unwrap();
        assert_eq!(report.apps, 3);

        let predictor = ArtifactPredictor::new(dir.path().to_path_buf());
        let now = Local.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
        let predictions = predictor
            .predict(&["Mail - inbox".to_string(), "Editor - main.rs".to_string()], now)
            .unwrap();
        assert_eq!(predictions[0].app_name, "Browser");
        assert!(predictions[0].confidence > 50.0);
    }
}
