//! Pure scoring logic. Nothing in here touches the database; callers load
//! the rows they need and pass them in.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::competitions::scores::Score;

pub mod calc;
pub mod leaderboard;
pub mod next_dive;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// The input could never have come from a valid submission.
    #[error("invalid scoring input: {0}")]
    Validation(String),
    /// The stored data contradicts itself (e.g. more marks than judges).
    #[error("inconsistent scoring data: {0}")]
    Integrity(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JudgeScore {
    pub judge_number: i64,
    pub value: f64,
}

impl From<&Score> for JudgeScore {
    fn from(score: &Score) -> Self {
        JudgeScore {
            judge_number: score.judge_number,
            value: score.value,
        }
    }
}

/// Submitted marks, keyed by dive entry id.
pub type ScoresByEntry = HashMap<String, Vec<JudgeScore>>;

pub fn group_scores(scores: &[Score]) -> ScoresByEntry {
    let mut map: ScoresByEntry = HashMap::new();
    for score in scores {
        map.entry(score.entry_id.clone())
            .or_default()
            .push(JudgeScore::from(score));
    }
    map
}

/// A dive is complete once every judge on the panel has submitted a mark.
/// Stray marks from judge numbers outside the panel are not counted.
pub fn is_complete(scores: &[JudgeScore], num_judges: i64) -> bool {
    if num_judges < 1 {
        return false;
    }

    let distinct = scores
        .iter()
        .filter(|s| (1..=num_judges).contains(&s.judge_number))
        .map(|s| s.judge_number)
        .collect::<HashSet<_>>();

    distinct.len() as i64 == num_judges
}

/// Judge numbers with a mark that lie outside `1..=num_judges`.
pub fn stray_judges(scores: &[JudgeScore], num_judges: i64) -> Vec<i64> {
    scores
        .iter()
        .map(|s| s.judge_number)
        .filter(|judge| !(1..=num_judges).contains(judge))
        .collect()
}

pub fn entry_is_complete(
    entry_id: &str,
    scores_by_entry: &ScoresByEntry,
    num_judges: i64,
) -> bool {
    let Some(scores) = scores_by_entry.get(entry_id) else {
        return false;
    };

    let stray = stray_judges(scores, num_judges);
    if !stray.is_empty() {
        // the result of this dive will be reported as a fault
        warn!(
            entry = %entry_id,
            ?stray,
            num_judges,
            "ignoring marks from judges outside the panel"
        );
    }

    is_complete(scores, num_judges)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDateTime;

    use super::JudgeScore;
    use crate::competitions::{competitors::Competitor, dives::DiveEntry};

    pub fn competitor(id: &str, last_name: &str) -> Competitor {
        Competitor {
            id: id.to_string(),
            event_id: "event".to_string(),
            first_name: "Test".to_string(),
            last_name: last_name.to_string(),
            club: None,
            age_group: None,
            created_at: NaiveDateTime::default(),
        }
    }

    pub fn entry(
        id: &str,
        competitor_id: &str,
        dive_number: i64,
        difficulty: f64,
    ) -> DiveEntry {
        DiveEntry {
            id: id.to_string(),
            competitor_id: competitor_id.to_string(),
            dive_number,
            fina_code: "105B".to_string(),
            board_height: "3m".to_string(),
            difficulty,
            description: None,
            created_at: NaiveDateTime::default(),
        }
    }

    /// One mark per judge, judges numbered from 1.
    pub fn marks(values: &[f64]) -> Vec<JudgeScore> {
        values
            .iter()
            .enumerate()
            .map(|(i, value)| JudgeScore {
                judge_number: i as i64 + 1,
                value: *value,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks(judges: &[i64]) -> Vec<JudgeScore> {
        judges
            .iter()
            .map(|judge_number| JudgeScore {
                judge_number: *judge_number,
                value: 7.0,
            })
            .collect()
    }

    #[test]
    fn completion_counts_distinct_judges() {
        assert!(is_complete(&marks(&[1, 2, 3]), 3));
        assert!(!is_complete(&marks(&[1, 2]), 3));
        assert!(!is_complete(&marks(&[1, 1, 2]), 3));
        assert!(!is_complete(&marks(&[1, 2, 4]), 3));
        assert!(!is_complete(&[], 0));
    }

    #[test]
    fn marks_outside_the_panel_are_reported() {
        assert_eq!(stray_judges(&marks(&[1, 2, 3]), 3), Vec::<i64>::new());
        assert_eq!(stray_judges(&marks(&[0, 2, 4]), 3), vec![0, 4]);

        let mut scores_by_entry = ScoresByEntry::new();
        scores_by_entry.insert("e".to_string(), marks(&[1, 2, 3, 4]));
        // complete for the selector, but the result itself is a fault
        assert!(entry_is_complete("e", &scores_by_entry, 3));
        assert!(matches!(
            calc::compute_entry_result(&marks(&[1, 2, 3, 4]), 2.0, 3),
            Err(ScoringError::Integrity(_))
        ));
    }

    #[test]
    fn unscored_entries_are_incomplete() {
        let scores_by_entry = ScoresByEntry::new();
        assert!(!entry_is_complete("missing", &scores_by_entry, 5));
    }
}
