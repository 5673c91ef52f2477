use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::SystemTime,
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Local, Timelike};

use crate::normalize::extract_app_name;

use super::artifacts::{
    artifacts_exist, cyclical, load_artifacts, model_path, AppEncodings, FeatureRow, SequenceModel,
    SEQUENCE_LENGTH,
};
use super::{AppPrediction, SequencePredictor, MIN_RANKED_CONFIDENCE};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

const TOP_PREDICTIONS: usize = 3;

struct Loaded {
    encodings: AppEncodings,
    model: SequenceModel,
    /// Model file mtime at load; `None` for artifacts handed in directly.
    modified: Option<SystemTime>,
}

/// Predictor backed by the trainer's JSON artifacts. Artifacts are loaded
/// on first use and reloaded whenever the model file's mtime changes, so a
/// model trained while the agent runs is picked up.
pub struct ArtifactPredictor {
    models_dir: PathBuf,
    loaded: Mutex<Option<Arc<Loaded>>>,
}

impl ArtifactPredictor {
    pub fn new(models_dir: PathBuf) -> Self {
        Self {
            models_dir,
            loaded: Mutex::new(None),
        }
    }

    pub fn from_parts(encodings: AppEncodings, model: SequenceModel) -> Self {
        Self {
            models_dir: PathBuf::new(),
            loaded: Mutex::new(Some(Arc::new(Loaded {
                encodings,
                model,
                modified: None,
            }))),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    fn artifacts(&self) -> Result<Option<Arc<Loaded>>> {
        let mut guard = self
            .loaded
            .lock()
            .map_err(|_| anyhow!("learned predictor state poisoned"))?;
        let cached = guard.as_ref().map(Arc::clone);
        if let Some(loaded) = &cached {
            if loaded.modified.is_none() {
                return Ok(cached);
            }
        }
        if !artifacts_exist(&self.models_dir) {
            log_debug!("no learned artifacts in {}", self.models_dir.display());
            *guard = None;
            return Ok(None);
        }

        let modified = fs::metadata(model_path(&self.models_dir))
            .and_then(|meta| meta.modified())
            .ok();
        if let Some(loaded) = &cached {
            if modified.is_some() && loaded.modified == modified {
                return Ok(cached);
            }
        }

        let (encodings, model) = match load_artifacts(&self.models_dir) {
            Ok(artifacts) => artifacts,
            // A retrain may be halfway through writing; keep the previous model.
            Err(err) if cached.is_some() => {
                log_warn!("keeping previous learned predictor: {err:#}");
                return Ok(cached);
            }
            Err(err) => return Err(err),
        };
        log_info!("loaded learned predictor for {} apps", encodings.len());
        let loaded = Arc::new(Loaded {
            encodings,
            model,
            modified,
        });
        *guard = Some(Arc::clone(&loaded));
        Ok(Some(loaded))
    }
}

/// Feature rows for the last [`SEQUENCE_LENGTH`] apps, left-padded with the
/// earliest app when the history is shorter.
pub fn encode_features(
    encodings: &AppEncodings,
    recent_windows: &[String],
    now: DateTime<Local>,
) -> Vec<FeatureRow> {
    let mut apps: Vec<String> = recent_windows.iter().map(|w| extract_app_name(w)).collect();
    let Some(first) = apps.first().cloned() else {
        return Vec::new();
    };
    if apps.len() < SEQUENCE_LENGTH {
        let mut padded = vec![first; SEQUENCE_LENGTH - apps.len()];
        padded.append(&mut apps);
        apps = padded;
    }
    let start = apps.len() - SEQUENCE_LENGTH;

    let (hour_sin, hour_cos) = cyclical(f64::from(now.hour()), 24.0);
    let (weekday_sin, weekday_cos) = cyclical(f64::from(now.weekday().num_days_from_monday()), 7.0);

    apps[start..]
        .iter()
        .map(|app| {
            [
                encodings.resolve(app) as f64,
                hour_sin,
                hour_cos,
                weekday_sin,
                weekday_cos,
            ]
        })
        .collect()
}

impl SequencePredictor for ArtifactPredictor {
    fn predict(&self, recent_windows: &[String], now: DateTime<Local>) -> Result<Vec<AppPrediction>> {
        let Some(loaded) = self.artifacts()? else {
            return Ok(Vec::new());
        };

        let features = encode_features(&loaded.encodings, recent_windows, now);
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let probabilities = loaded.model.predict(&features)?;
        let mut ranked: Vec<(usize, f64)> = probabilities.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(ranked
            .into_iter()
            .take(TOP_PREDICTIONS)
            .filter_map(|(id, p)| {
                let app_name = loaded.encodings.app(id)?.to_string();
                Some(AppPrediction {
                    app_name,
                    confidence: p * 100.0,
                })
            })
            .filter(|p| p.confidence > MIN_RANKED_CONFIDENCE)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::learned::save_artifacts;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn model_preferring(from: usize, to: usize, apps: usize) -> SequenceModel {
        let mut transitions = vec![vec![0; apps]; apps];
        transitions[from][to] = 40;
        SequenceModel {
            sequence_length: SEQUENCE_LENGTH,
            num_apps: apps,
            transitions,
            day_part_usage: BTreeMap::new(),
            examples: 40,
            trained_at: Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn windows(titles: &[&str]) -> Vec<String> {
        titles.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn features_are_left_padded_with_earliest_app() {
        let enc = AppEncodings::from_apps(["Browser", "Editor"]);
        let now = Local.with_ymd_and_hms(2024, 3, 4, 6, 0, 0).unwrap();
        let rows = encode_features(&enc, &windows(&["Editor - a", "Browser - b"]), now);

        assert_eq!(rows.len(), SEQUENCE_LENGTH);
        let ids: Vec<f64> = rows.iter().map(|r| r[0]).collect();
        assert_eq!(ids, vec![1.0, 1.0, 1.0, 1.0, 0.0]);
        // 06:00 on a Monday
        assert!((rows[0][1] - 1.0).abs() < 1e-9);
        assert!(rows[0][2].abs() < 1e-9);
        assert!(rows[0][3].abs() < 1e-9);
        assert!((rows[0][4] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn features_keep_last_five_apps() {
        let enc = AppEncodings::from_apps(["A", "B", "C"]);
        let now = Local.with_ymd_and_hms(2024, 3, 4, 6, 0, 0).unwrap();
        let history = windows(&["A - 1", "A - 2", "B - 1", "C - 1", "B - 2", "C - 2", "A - 3"]);
        let ids: Vec<f64> = encode_features(&enc, &history, now).iter().map(|r| r[0]).collect();
        assert_eq!(ids, vec![1.0, 2.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn predicts_most_likely_successor() {
        let enc = AppEncodings::from_apps(["Browser", "Editor", "Mail"]);
        let predictor = ArtifactPredictor::from_parts(enc, model_preferring(1, 0, 3));
        let now = Local.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();

        let predictions = predictor.predict(&windows(&["Editor - main.rs"]), now).unwrap();
        assert_eq!(predictions[0].app_name, "Browser");
        assert!(predictions[0].confidence > 90.0);
        assert!(predictions.iter().all(|p| p.confidence > MIN_RANKED_CONFIDENCE));
    }

    #[test]
    fn retrained_artifacts_replace_the_cached_model() {
        let dir = tempfile::tempdir().unwrap();
        let enc = AppEncodings::from_apps(["Browser", "Editor", "Mail"]);
        save_artifacts(dir.path(), &enc, &model_preferring(1, 0, 3)).unwrap();

        let predictor = ArtifactPredictor::new(dir.path().to_path_buf());
        let now = Local.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        let history = windows(&["Editor - main.rs"]);
        assert_eq!(predictor.predict(&history, now).unwrap()[0].app_name, "Browser");

        save_artifacts(dir.path(), &enc, &model_preferring(1, 2, 3)).unwrap();
        // Filesystems with coarse timestamps could otherwise hide the rewrite.
        fs::File::options()
            .write(true)
            .open(model_path(dir.path()))
            .unwrap()
            .set_modified(SystemTime::now() + std::time::Duration::from_secs(10))
            .unwrap();

        assert_eq!(predictor.predict(&history, now).unwrap()[0].app_name, "Mail");
    }

    #[test]
    fn missing_artifacts_predict_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = ArtifactPredictor::new(dir.path().to_path_buf());
        let now = Local::now();
        assert!(predictor.predict(&windows(&["Editor - a"]), now).unwrap().is_empty());
    }
}
