//! Converts the judges' marks for a single dive into a final score.

use itertools::Itertools;
use serde::Serialize;

use crate::competitions::scoring::{JudgeScore, ScoringError};

/// Panels of this size discard the highest and the lowest mark.
pub const TRIMMED_PANEL_SIZE: i64 = 5;

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 4.5;
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinalScore {
    /// Mean of the marks which count (after trimming).
    pub average: f64,
    /// `average * difficulty`, unrounded.
    pub final_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DiveResult {
    Complete(FinalScore),
    /// Not every judge has scored yet. This is an expected state during live
    /// scoring, not a fault.
    Incomplete { submitted: usize, needed: usize },
}

impl DiveResult {
    pub fn final_score(&self) -> Option<f64> {
        match self {
            DiveResult::Complete(score) => Some(score.final_score),
            DiveResult::Incomplete { .. } => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, DiveResult::Complete(_))
    }
}

/// Computes the final score of a dive from the submitted marks.
///
/// With a panel of five the sorted marks lose their first and last element
/// (one instance of each extreme, even when the extreme value is repeated).
/// Any other panel size is averaged without trimming. The result is kept at
/// full precision; use [`display_score`] when showing it.
pub fn compute_final_score(
    scores: &[f64],
    difficulty: f64,
    num_judges: i64,
) -> Result<DiveResult, ScoringError> {
    if num_judges < 1 {
        return Err(ScoringError::Integrity(format!(
            "unusable judge count {num_judges}"
        )));
    }

    if !difficulty.is_finite()
        || !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty)
    {
        return Err(ScoringError::Validation(format!(
            "difficulty {difficulty} is outside {MIN_DIFFICULTY}..={MAX_DIFFICULTY}"
        )));
    }

    if let Some(bad) = scores
        .iter()
        .find(|s| !s.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(*s))
    {
        return Err(ScoringError::Validation(format!(
            "score {bad} is outside {MIN_SCORE}..={MAX_SCORE}"
        )));
    }

    let panel = num_judges as usize;

    if scores.len() < panel {
        return Ok(DiveResult::Incomplete {
            submitted: scores.len(),
            needed: panel - scores.len(),
        });
    }

    if scores.len() > panel {
        tracing::warn!(
            submitted = scores.len(),
            num_judges,
            "more scores than judges for a single dive"
        );
        return Err(ScoringError::Integrity(format!(
            "{} scores submitted for a panel of {num_judges} judges",
            scores.len()
        )));
    }

    let sorted = scores
        .iter()
        .copied()
        .sorted_by(|a, b| a.total_cmp(b))
        .collect_vec();

    let counting = if num_judges == TRIMMED_PANEL_SIZE {
        &sorted[1..sorted.len() - 1]
    } else {
        &sorted[..]
    };

    let average = counting.iter().sum::<f64>() / counting.len() as f64;

    Ok(DiveResult::Complete(FinalScore {
        average,
        final_score: average * difficulty,
    }))
}

/// Like [`compute_final_score`], but starting from the stored per-judge
/// records of one dive. Judge numbers must be distinct and lie in
/// `1..=num_judges`.
pub fn compute_entry_result(
    scores: &[JudgeScore],
    difficulty: f64,
    num_judges: i64,
) -> Result<DiveResult, ScoringError> {
    if let Some(out_of_range) = scores
        .iter()
        .find(|s| s.judge_number < 1 || s.judge_number > num_judges)
    {
        return Err(ScoringError::Integrity(format!(
            "judge number {} does not exist on a panel of {num_judges}",
            out_of_range.judge_number
        )));
    }

    if let Some(dup) = scores.iter().map(|s| s.judge_number).duplicates().next()
    {
        return Err(ScoringError::Integrity(format!(
            "judge {dup} has more than one score for the same dive"
        )));
    }

    let values = scores.iter().map(|s| s.value).collect_vec();
    compute_final_score(&values, difficulty, num_judges)
}

/// Indices (into `scores`) of the marks discarded by the trimming rule, i.e.
/// the positions of the first and last element after a stable sort. Empty
/// unless the panel has five judges and all five have scored.
pub fn trimmed_positions(scores: &[f64], num_judges: i64) -> Vec<usize> {
    if num_judges != TRIMMED_PANEL_SIZE || scores.len() != panel_len(num_judges)
    {
        return vec![];
    }

    let order = (0..scores.len())
        .sorted_by(|a, b| scores[*a].total_cmp(&scores[*b]))
        .collect_vec();

    vec![order[0], order[order.len() - 1]]
}

fn panel_len(num_judges: i64) -> usize {
    num_judges.max(0) as usize
}

/// Scores are shown to two decimal places; they are never rounded before this.
pub fn display_score(score: f64) -> String {
    format!("{score:.2}")
}
