//! Learned next-app tier of the predictor chain.

mod artifacts;
mod predictor;

use std::collections::VecDeque;

use anyhow::Result;
use chrono::{DateTime, Local};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::feedback::{FeedbackView, SuggestionRecord};
use crate::normalize::extract_app_name;

pub use artifacts::{
    artifacts_exist, cyclical, load_artifacts, save_artifacts, AppEncodings, FeatureRow,
    SequenceModel, ENCODINGS_FILE, MODEL_FILE, SEQUENCE_LENGTH,
};
pub use predictor::{encode_features, ArtifactPredictor};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Predictions at or below this confidence are never ranked.
pub const MIN_RANKED_CONFIDENCE: f64 = 10.0;
/// Minimum confidence for turning a prediction into a suggestion.
pub const MIN_SUGGEST_CONFIDENCE: f64 = 20.0;
const HIGH_CONFIDENCE: f64 = 70.0;
const MEDIUM_CONFIDENCE: f64 = 50.0;
const DIVERSIFY_PROBABILITY: f64 = 0.2;
const REPETITION_WINDOW: usize = 3;
const CHOICE_HISTORY: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPrediction {
    pub app_name: String,
    /// Percentage in `[0, 100]`.
    pub confidence: f64,
}

/// A phrased suggestion for `app`.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnedSuggestion {
    pub text: String,
    pub app: String,
}

/// Ranked next-app predictions from the recent window titles (oldest first).
pub trait SequencePredictor: Send + Sync {
    fn predict(&self, recent_windows: &[String], now: DateTime<Local>) -> Result<Vec<AppPrediction>>;
}

/// Turns predictions into user-facing suggestions, avoiding repeating the
/// same app and occasionally preferring the runner-up.
pub struct LearnedTier {
    predictor: Box<dyn SequencePredictor>,
    recent_choices: VecDeque<String>,
    feedback: FeedbackView,
}

impl LearnedTier {
    pub fn new(predictor: Box<dyn SequencePredictor>) -> Self {
        Self {
            predictor,
            recent_choices: VecDeque::with_capacity(CHOICE_HISTORY),
            feedback: FeedbackView::default(),
        }
    }

    pub fn set_feedback(&mut self, feedback: FeedbackView) {
        self.feedback = feedback;
    }

    pub fn observe_feedback(&mut self, record: &SuggestionRecord) {
        self.feedback.observe(record);
    }

    pub fn recent_choices(&self) -> impl Iterator<Item = &str> {
        self.recent_choices.iter().map(String::as_str)
    }

    /// Apps the user keeps ignoring are dropped before any rule runs.
    /// Order of the rules: anti-repetition, then diversification (only when
    /// anti-repetition kept the top prediction), then the confidence gate.
    pub fn suggest<R: Rng + ?Sized>(
        &mut self,
        current_window: &str,
        recent_windows: &[String],
        now: DateTime<Local>,
        rng: &mut R,
    ) -> Result<Option<LearnedSuggestion>> {
        let predictions: Vec<AppPrediction> = self
            .predictor
            .predict(recent_windows, now)?
            .into_iter()
            .filter(|p| p.confidence > MIN_RANKED_CONFIDENCE)
            .filter(|p| {
                let suppressed = self.feedback.is_suppressed(&p.app_name);
                if suppressed {
                    log_debug!("skipping {}: ignored too often", p.app_name);
                }
                !suppressed
            })
            .collect();

        let Some(top) = predictions.first() else {
            return Ok(None);
        };

        let mut pick = 0;
        if self.chosen_recently(&top.app_name) {
            if predictions.len() < 2 {
                log_debug!("suppressing repeated prediction {}", top.app_name);
                return Ok(None);
            }
            pick = 1;
        }

        let roll: f64 = rng.gen();
        if pick == 0 && roll < DIVERSIFY_PROBABILITY && predictions.len() > 1 {
            pick = 1;
        }

        let chosen = &predictions[pick];
        if chosen.confidence < MIN_SUGGEST_CONFIDENCE {
            return Ok(None);
        }

        let current_app = extract_app_name(current_window);
        let templates = phrasing(&chosen.app_name, &current_app, chosen.confidence);
        let Some(text) = templates.choose(rng).cloned() else {
            return Ok(None);
        };

        self.remember(chosen.app_name.clone());
        Ok(Some(LearnedSuggestion {
            text,
            app: chosen.app_name.clone(),
        }))
    }

    fn chosen_recently(&self, app: &str) -> bool {
        self.recent_choices
            .iter()
            .rev()
            .take(REPETITION_WINDOW)
            .any(|choice| choice == app)
    }

    fn remember(&mut self, app: String) {
        if self.recent_choices.len() == CHOICE_HISTORY {
            self.recent_choices.pop_front();
        }
        self.recent_choices.push_back(app);
    }
}

fn phrasing(app: &str, current_app: &str, confidence: f64) -> Vec<String> {
    if confidence > HIGH_CONFIDENCE {
        vec![
            format!("You almost always use {app} after {current_app}. Would you like to switch to it now?"),
            format!("Based on your patterns, you'll very likely want {app} next. Open {app} now?"),
            format!("Your workflow typically continues with {app} ({confidence:.1}% confidence). Open it now?"),
        ]
    } else if confidence >= MEDIUM_CONFIDENCE {
        vec![
            format!("You often use {app} after {current_app}. Would you like to open it?"),
            format!("Based on your patterns, you might want to use {app} next. Need it open?"),
            format!("You frequently switch to {app} from here. Would that be helpful now?"),
        ]
    } else {
        vec![
            format!("You sometimes use {app} in this context. Would you like to open it?"),
            format!("Would you like to open {app}? You've used it in similar situations before."),
            format!("Based on your past activity, {app} might be useful now. Want to switch to it?"),
        ]
    }
}
