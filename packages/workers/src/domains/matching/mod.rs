// Matching domain - candidate/job fit scoring

pub mod utils;

pub use utils::{
    FitExplanation, FitScore, KeywordOverlapScorer, ScoringInput, ScoringStrategy,
};
