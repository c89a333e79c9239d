/// Pure scoring functions for candidate/job fit
///
/// These functions contain NO side effects. They turn a candidate's resume
/// text and a job posting's requirements into a 0-100 fit score plus the
/// detail behind it.
///
/// The weights and the similarity normaliser are provisional placeholders for
/// a proper ranking model. They sit behind [`ScoringStrategy`] so that model
/// can replace [`KeywordOverlapScorer`] without touching the pipelines.
use serde::{Deserialize, Serialize};

/// Weight of the general skill hit ratio in the final score
pub const KEYWORD_WEIGHT: f64 = 0.5;
/// Weight of the description overlap ratio in the final score
pub const SIMILARITY_WEIGHT: f64 = 0.3;
/// Weight of the required skill hit ratio in the final score
pub const REQUIREMENT_WEIGHT: f64 = 0.2;
/// Number of overlapping description tokens that counts as full similarity
pub const SIMILARITY_NORMALIZER: f64 = 200.0;

/// Everything a strategy may look at
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub candidate_text: &'a str,
    pub job_description: &'a str,
    pub skills: &'a [String],
    pub required_skills: &'a [String],
}

/// Score detail persisted as `fit_explain_json` and in the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitExplanation {
    /// General skills found in the candidate text, original casing
    pub hit_skills: Vec<String>,
    /// Required skills found in the candidate text, original casing
    pub need_hits: Vec<String>,
    pub sim: i32,
    pub kw: i32,
    pub rule: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitScore {
    pub final_score: i32,
    pub explanation: FitExplanation,
}

/// Replaceable scoring policy
pub trait ScoringStrategy: Send + Sync {
    fn score(&self, input: &ScoringInput<'_>) -> FitScore;
}

/// Keyword and token overlap heuristic
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordOverlapScorer;

impl ScoringStrategy for KeywordOverlapScorer {
    fn score(&self, input: &ScoringInput<'_>) -> FitScore {
        let text = input.candidate_text.to_lowercase();
        let description = input.job_description.to_lowercase();

        let hit_skills = matched_skills(&text, input.skills);
        let need_hits = matched_skills(&text, input.required_skills);

        let overlap = description_tokens(&description)
            .filter(|token| text.contains(token))
            .count();

        let sim = percent(overlap as f64 / SIMILARITY_NORMALIZER);
        let kw = percent(hit_skills.len() as f64 / input.skills.len().max(1) as f64);
        let rule = percent(need_hits.len() as f64 / input.required_skills.len().max(1) as f64);

        let final_score = (KEYWORD_WEIGHT * kw as f64
            + SIMILARITY_WEIGHT * sim as f64
            + REQUIREMENT_WEIGHT * rule as f64)
            .round() as i32;

        FitScore {
            final_score,
            explanation: FitExplanation {
                hit_skills,
                need_hits,
                sim,
                kw,
                rule,
            },
        }
    }
}

/// Skills whose lower-cased name occurs anywhere in `text` (already lower-cased)
fn matched_skills(text: &str, skills: &[String]) -> Vec<String> {
    skills
        .iter()
        .filter(|skill| text.contains(&skill.to_lowercase()))
        .cloned()
        .collect()
}

/// Split on runs of non-word characters (anything but ASCII alphanumerics and
/// `_`), dropping empty pieces. Duplicates are kept.
fn description_tokens(description: &str) -> impl Iterator<Item = &str> {
    description
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
}

/// Scale a 0..=1 ratio to a rounded, capped percentage
fn percent(ratio: f64) -> i32 {
    ((ratio * 100.0).round() as i32).min(100)
}
