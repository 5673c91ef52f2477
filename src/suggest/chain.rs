use chrono::{DateTime, Local};
use rand::Rng;
use serde::Serialize;

use crate::feedback::{FeedbackView, SuggestionRecord};
use crate::memory::ContextSnapshot;
use crate::patterns::PatternSummary;

use super::learned::LearnedTier;
use super::llm::LlmTier;
use super::ranker;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Learned,
    Llm,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainSuggestion {
    pub text: String,
    pub tier: Tier,
    /// App the suggestion points at, when the tier knows it.
    pub app: Option<String>,
}

/// Learned predictor, then the language model, then the heuristic ranker.
/// A failing or silent tier falls through to the next one; the heuristic
/// tier always answers. Apps the user keeps ignoring are held back by the
/// learned and heuristic tiers.
#[derive(Default)]
pub struct PredictorChain {
    learned: Option<LearnedTier>,
    llm: Option<LlmTier>,
    feedback: FeedbackView,
}

impl PredictorChain {
    pub fn new(learned: Option<LearnedTier>, llm: Option<LlmTier>) -> Self {
        Self {
            learned,
            llm,
            feedback: FeedbackView::default(),
        }
    }

    pub fn with_feedback(mut self, feedback: FeedbackView) -> Self {
        if let Some(learned) = self.learned.as_mut() {
            learned.set_feedback(feedback.clone());
        }
        self.feedback = feedback;
        self
    }

    /// Fold a freshly resolved suggestion into every tier's view.
    pub fn observe_feedback(&mut self, record: &SuggestionRecord) {
        if let Some(learned) = self.learned.as_mut() {
            learned.observe_feedback(record);
        }
        self.feedback.observe(record);
    }

    pub fn heuristic_only() -> Self {
        Self::default()
    }

    pub async fn get_suggestion<R>(
        &mut self,
        snapshot: &ContextSnapshot,
        recent_windows: &[String],
        patterns: &PatternSummary,
        now: DateTime<Local>,
        rng: &mut R,
    ) -> ChainSuggestion
    where
        R: Rng + Send + ?Sized,
    {
        if let Some(learned) = self.learned.as_mut() {
            match learned.suggest(&snapshot.window, recent_windows, now, rng) {
                Ok(Some(suggestion)) if !suggestion.text.trim().is_empty() => {
                    return ChainSuggestion {
                        text: suggestion.text,
                        tier: Tier::Learned,
                        app: Some(suggestion.app),
                    };
                }
                Ok(_) => log_debug!("learned tier had no suggestion"),
                Err(err) => log_warn!("learned tier failed: {err:#}"),
            }
        }

        if let Some(llm) = self.llm.as_ref() {
            match llm.suggest(snapshot, patterns).await {
                Ok(Some(text)) => {
                    return ChainSuggestion {
                        text,
                        tier: Tier::Llm,
                        app: None,
                    }
                }
                Ok(None) => log_debug!("language model tier had no suggestion"),
                Err(err) => log_warn!("language model tier failed: {err:#}"),
            }
        }

        self.heuristic(snapshot, patterns, now, rng)
    }

    /// The last tier on its own; answers immediately.
    pub fn heuristic<R>(
        &self,
        snapshot: &ContextSnapshot,
        patterns: &PatternSummary,
        now: DateTime<Local>,
        rng: &mut R,
    ) -> ChainSuggestion
    where
        R: Rng + ?Sized,
    {
        ChainSuggestion {
            text: ranker::suggest(snapshot, patterns, &self.feedback, now, rng),
            tier: Tier::Heuristic,
            app: None,
        }
    }
}
