//! Suggestion generation: heuristic ranking, learned and language-model
//! tiers, and the chain that orders them.

pub mod category;
pub mod chain;
pub mod learned;
pub mod llm;
pub mod ranker;
pub mod tips;

pub use category::{context_category, ContextCategory};
pub use chain::{ChainSuggestion, PredictorChain, Tier};
pub use learned::{AppPrediction, ArtifactPredictor, LearnedSuggestion, LearnedTier, SequencePredictor};
pub use llm::{LlmTier, OllamaCli, OllamaHttp, TextCompletion};
pub use ranker::{
    apply_feedback, rank, select, suggest, Candidate, CandidateSource, RankedSuggestion,
    NO_SUGGESTION,
};
