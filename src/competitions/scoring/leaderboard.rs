//! Ranks the competitors of an event by the sum of their completed dives.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::competitions::{
    competitors::Competitor,
    dives::DiveEntry,
    scoring::{
        ScoresByEntry, ScoringError,
        calc::{DiveResult, compute_entry_result},
    },
};

#[derive(Serialize, Debug, Clone)]
pub struct Standing {
    /// 1-indexed. Tied competitors still get distinct positions.
    pub position: usize,
    pub competitor: Competitor,
    /// Unrounded sum of the final scores of completed dives.
    pub total_score: f64,
    pub completed_dives: usize,
    /// Why this competitor's total was zeroed, if it was.
    pub fault: Option<String>,
}

struct Tally {
    total_score: f64,
    completed_dives: usize,
}

fn tally(
    entries: &[DiveEntry],
    scores_by_entry: &ScoresByEntry,
    num_judges: i64,
) -> Result<Tally, ScoringError> {
    let mut tally = Tally {
        total_score: 0.0,
        completed_dives: 0,
    };

    for entry in entries {
        let scores = scores_by_entry
            .get(&entry.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        match compute_entry_result(scores, entry.difficulty, num_judges)? {
            DiveResult::Complete(score) => {
                tally.total_score += score.final_score;
                tally.completed_dives += 1;
            }
            // partially judged dives count for nothing
            DiveResult::Incomplete { .. } => {}
        }
    }

    Ok(tally)
}

/// Builds the ranked standings of an event.
///
/// `competitors` should be in a stable order (the store hands them out by
/// last name, first name, then id); tied totals keep that order. A
/// competitor whose scores cannot be evaluated is listed with a total of
/// zero and a `fault`, and the rest of the leaderboard is still computed.
pub fn compute_leaderboard(
    competitors: &[Competitor],
    entries_by_competitor: &HashMap<String, Vec<DiveEntry>>,
    scores_by_entry: &ScoresByEntry,
    num_judges: i64,
) -> Vec<Standing> {
    let mut standings = competitors
        .iter()
        .map(|competitor| {
            let entries = entries_by_competitor
                .get(&competitor.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            match tally(entries, scores_by_entry, num_judges) {
                Ok(tally) => Standing {
                    position: 0,
                    competitor: competitor.clone(),
                    total_score: tally.total_score,
                    completed_dives: tally.completed_dives,
                    fault: None,
                },
                Err(e) => {
                    warn!(
                        competitor = %competitor.id,
                        "leaving competitor out of the totals: {e}"
                    );
                    Standing {
                        position: 0,
                        competitor: competitor.clone(),
                        total_score: 0.0,
                        completed_dives: 0,
                        fault: Some(e.to_string()),
                    }
                }
            }
        })
        .collect::<Vec<_>>();

    // stable, so ties keep the input order
    standings.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));

    for (idx, standing) in standings.iter_mut().enumerate() {
        standing.position = idx + 1;
    }

    standings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::competitions::scoring::{
        JudgeScore,
        calc::display_score,
        fixtures::{competitor, entry, marks},
    };

    #[test]
    fn incomplete_dives_add_nothing() {
        let competitors = vec![competitor("a", "Alpha")];
        let entries = HashMap::from([(
            "a".to_string(),
            vec![entry("d1", "a", 1, 2.0), entry("d2", "a", 2, 2.5), entry("d3", "a", 3, 3.0)],
        )]);
        let scores = ScoresByEntry::from([
            ("d1".to_string(), marks(&[7.0, 7.0, 7.0, 9.0, 9.0])),
            ("d2".to_string(), marks(&[8.0, 8.5, 8.5, 8.5, 9.0])),
            ("d3".to_string(), marks(&[9.0, 9.0])),
        ]);

        let board = compute_leaderboard(&competitors, &entries, &scores, 5);

        // 15.333... + 21.25, summed before rounding
        assert_eq!(board[0].completed_dives, 2);
        assert_eq!(display_score(board[0].total_score), "36.58");
        assert!(board[0].fault.is_none());
    }

    #[test]
    fn ordered_by_total_with_ties_in_input_order() {
        let competitors = vec![
            competitor("a", "Alpha"),
            competitor("b", "Bravo"),
            competitor("c", "Charlie"),
        ];
        let entries = HashMap::from([
            ("a".to_string(), vec![entry("da", "a", 1, 2.0)]),
            ("b".to_string(), vec![entry("db", "b", 1, 3.0)]),
            ("c".to_string(), vec![entry("dc", "c", 1, 2.0)]),
        ]);
        let scores = ScoresByEntry::from([
            ("da".to_string(), marks(&[6.0, 6.0, 6.0])),
            ("db".to_string(), marks(&[6.0, 6.0, 6.0])),
            ("dc".to_string(), marks(&[6.0, 6.0, 6.0])),
        ]);

        let board = compute_leaderboard(&competitors, &entries, &scores, 3);

        let order = board
            .iter()
            .map(|s| (s.position, s.competitor.id.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![(1, "b"), (2, "a"), (3, "c")]);
    }

    #[test]
    fn a_faulty_competitor_does_not_sink_the_board() {
        let competitors = vec![competitor("a", "Alpha"), competitor("b", "Bravo")];
        let entries = HashMap::from([
            ("a".to_string(), vec![entry("da", "a", 1, 2.0)]),
            ("b".to_string(), vec![entry("db", "b", 1, 2.0)]),
        ]);
        let mut too_many = marks(&[6.0, 6.0, 6.0]);
        too_many.push(JudgeScore {
            judge_number: 3,
            value: 9.0,
        });
        let scores = ScoresByEntry::from([
            ("da".to_string(), too_many),
            ("db".to_string(), marks(&[5.0, 5.0, 5.0])),
        ]);

        let board = compute_leaderboard(&competitors, &entries, &scores, 3);

        assert_eq!(board[0].competitor.id, "b");
        assert_eq!(board[0].total_score, 10.0);
        assert_eq!(board[1].competitor.id, "a");
        assert_eq!(board[1].total_score, 0.0);
        assert!(board[1].fault.is_some());
    }

    #[test]
    fn competitors_without_entries_are_listed_at_zero() {
        let competitors = vec![competitor("a", "Alpha")];
        let board = compute_leaderboard(
            &competitors,
            &HashMap::new(),
            &ScoresByEntry::new(),
            5,
        );
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].position, 1);
        assert_eq!(board[0].total_score, 0.0);
        assert!(board[0].fault.is_none());
    }
}
