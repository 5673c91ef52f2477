//! On-disk artifacts shared by the offline trainer and the predictor.

use std::{
    collections::BTreeMap,
    f64::consts::PI,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::patterns::DayPart;
use crate::utils::fs::write_json_atomic;

pub const ENCODINGS_FILE: &str = "app_encodings.json";
pub const MODEL_FILE: &str = "sequence_model.json";

/// Number of past apps fed to the model.
pub const SEQUENCE_LENGTH: usize = 5;

/// `[app_id, hour_sin, hour_cos, weekday_sin, weekday_cos]`
pub type FeatureRow = [f64; 5];

/// Bidirectional app name to integer id mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppEncodings {
    pub app_to_id: BTreeMap<String, usize>,
    pub id_to_app: BTreeMap<usize, String>,
}

impl AppEncodings {
    /// Ids follow the sorted order of the distinct app names.
    pub fn from_apps<'a, I>(apps: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut names: Vec<&str> = apps.into_iter().collect();
        names.sort_unstable();
        names.dedup();

        let mut encodings = Self::default();
        for (id, name) in names.into_iter().enumerate() {
            encodings.app_to_id.insert(name.to_string(), id);
            encodings.id_to_app.insert(id, name.to_string());
        }
        encodings
    }

    pub fn len(&self) -> usize {
        self.app_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.app_to_id.is_empty()
    }

    /// Exact id, else the first known app related by substring in either
    /// direction (case-insensitive), else id 0.
    pub fn resolve(&self, app: &str) -> usize {
        if let Some(id) = self.app_to_id.get(app) {
            return *id;
        }
        let lower = app.to_lowercase();
        self.app_to_id
            .iter()
            .find(|(known, _)| {
                let known = known.to_lowercase();
                known.contains(&lower) || lower.contains(&known)
            })
            .map(|(_, id)| *id)
            .unwrap_or(0)
    }

    pub fn app(&self, id: usize) -> Option<&str> {
        self.id_to_app.get(&id).map(String::as_str)
    }
}

/// Count-based next-app model: transitions from the last app, combined with
/// how often each app is used in the current part of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceModel {
    pub sequence_length: usize,
    pub num_apps: usize,
    /// `transitions[from][to]`
    pub transitions: Vec<Vec<u32>>,
    pub day_part_usage: BTreeMap<DayPart, Vec<u32>>,
    pub examples: usize,
    pub trained_at: DateTime<Local>,
}

impl SequenceModel {
    /// Probability for every app id given one encoded sequence.
    pub fn predict(&self, features: &[FeatureRow]) -> Result<Vec<f64>> {
        let Some(last) = features.last() else {
            bail!("empty feature sequence");
        };
        if self.num_apps == 0 {
            bail!("model has no apps");
        }

        let last_id = last[0].round() as usize;
        let Some(row) = self.transitions.get(last_id) else {
            bail!("app id {last_id} is outside the model's {} apps", self.num_apps);
        };
        let part = DayPart::from_hour(hour_from_cyclical(last[1], last[2]));
        let usage = self.day_part_usage.get(&part);

        // Add-one smoothing on both factors.
        let scores: Vec<f64> = (0..self.num_apps)
            .map(|to| {
                let transition = f64::from(row.get(to).copied().unwrap_or(0)) + 1.0;
                let prior = f64::from(usage.and_then(|u| u.get(to)).copied().unwrap_or(0)) + 1.0;
                transition * prior
            })
            .collect();

        let total: f64 = scores.iter().sum();
        Ok(scores.into_iter().map(|s| s / total).collect())
    }
}

pub fn cyclical(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

fn hour_from_cyclical(sin: f64, cos: f64) -> u32 {
    let hours = sin.atan2(cos) * 24.0 / (2.0 * PI);
    (hours.rem_euclid(24.0).round() as u32) % 24
}

pub fn encodings_path(dir: &Path) -> PathBuf {
    dir.join(ENCODINGS_FILE)
}

pub fn model_path(dir: &Path) -> PathBuf {
    dir.join(MODEL_FILE)
}

pub fn artifacts_exist(dir: &Path) -> bool {
    encodings_path(dir).exists() && model_path(dir).exists()
}

pub fn load_artifacts(dir: &Path) -> Result<(AppEncodings, SequenceModel)> {
    let encodings: AppEncodings = read_json(&encodings_path(dir))?;
    let model: SequenceModel = read_json(&model_path(dir))?;
    if encodings.len() != model.num_apps {
        bail!(
            "encodings list {} apps but the model was trained on {}",
            encodings.len(),
            model.num_apps
        );
    }
    Ok((encodings, model))
}

pub fn save_artifacts(dir: &Path, encodings: &AppEncodings, model: &SequenceModel) -> Result<()> {
    write_json_atomic(&encodings_path(dir), encodings)?;
    write_json_atomic(&model_path(dir), model)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodings_sort_and_resolve() {
        let enc = AppEncodings::from_apps(["Slack", "Firefox", "Slack", "Code"]);
        assert_eq!(enc.len(), 3);
        assert_eq!(enc.resolve("Code"), 0);
        assert_eq!(enc.resolve("Firefox"), 1);
        assert_eq!(enc.resolve("Mozilla Firefox"), 1);
        assert_eq!(enc.resolve("slack"), 2);
        assert_eq!(enc.resolve("Unheard Of"), 0);
        assert_eq!(enc.app(2), Some("Slack"));
    }

    #[test]
    fn cyclical_hour_round_trips() {
        for hour in 0..24 {
            let (sin, cos) = cyclical(f64::from(hour), 24.0);
            assert_eq!(hour_from_cyclical(sin, cos), hour);
        }
    }

    #[test]
    fn encodings_survive_json_with_integer_keys() {
        let enc = AppEncodings::from_apps(["b", "a"]);
        let raw = serde_json::to_string(&enc).unwrap();
        assert!(raw.contains(r#""0":"a""#));
        let back: AppEncodings = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, enc);
    }
}
