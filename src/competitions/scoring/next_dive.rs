//! Works out which dive is "on deck": the first one still waiting for marks.
//!
//! Nothing is remembered between calls. The live pages poll, and every poll
//! recomputes the answer from the entries and scores as they stand.

use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;

use crate::competitions::{
    dives::{DiveEntry, EventEntry},
    run_order::RunOrderSlot,
    scoring::{ScoresByEntry, entry_is_complete},
};

impl AsRef<DiveEntry> for DiveEntry {
    fn as_ref(&self) -> &DiveEntry {
        self
    }
}

impl AsRef<DiveEntry> for EventEntry {
    fn as_ref(&self) -> &DiveEntry {
        &self.entry
    }
}

/// Returns the first entry, in the order given, which is not complete.
///
/// `None` covers both "every dive has been judged" and "there are no
/// entries"; callers tell the two apart by checking `entries.is_empty()`.
/// The live order (last name, first name, dive number) is the caller's
/// responsibility, see [`DiveEntry::entries_for_event`].
pub fn select_next_dive<'a, T: AsRef<DiveEntry>>(
    entries: &'a [T],
    scores_by_entry: &ScoresByEntry,
    num_judges: i64,
) -> Option<&'a T> {
    entries.iter().find(|entry| {
        !entry_is_complete(&entry.as_ref().id, scores_by_entry, num_judges)
    })
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunOrderNext {
    Next { round: i64, entry: DiveEntry },
    /// The competitor is up, but has no dive entered for this round.
    SheetMissing { round: i64, competitor_id: String },
}

/// Round-major traversal: every competitor dives round 1 (in run order
/// position) before anybody dives round 2. A competitor with no entry for
/// the current round holds the event up until one is entered.
pub fn select_next_dive_in_run_order(
    run_order: &[RunOrderSlot],
    entries_by_competitor: &HashMap<String, Vec<DiveEntry>>,
    scores_by_entry: &ScoresByEntry,
    num_judges: i64,
    num_dives: i64,
) -> Option<RunOrderNext> {
    let slots = run_order
        .iter()
        .sorted_by_key(|slot| slot.run_position)
        .collect_vec();

    for round in 1..=num_dives {
        for slot in &slots {
            let entry = entries_by_competitor
                .get(&slot.competitor_id)
                .and_then(|entries| {
                    entries.iter().find(|entry| entry.dive_number == round)
                });

            match entry {
                None => {
                    return Some(RunOrderNext::SheetMissing {
                        round,
                        competitor_id: slot.competitor_id.clone(),
                    });
                }
                Some(entry)
                    if !entry_is_complete(
                        &entry.id,
                        scores_by_entry,
                        num_judges,
                    ) =>
                {
                    return Some(RunOrderNext::Next {
                        round,
                        entry: entry.clone(),
                    });
                }
                Some(_) => {}
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::competitions::scoring::fixtures::{entry, marks};

    fn slot(competitor_id: &str, run_position: i64) -> RunOrderSlot {
        RunOrderSlot {
            id: format!("slot-{competitor_id}"),
            event_id: "event".to_string(),
            competitor_id: competitor_id.to_string(),
            run_position,
        }
    }

    fn judged(ids: &[&str]) -> ScoresByEntry {
        ids.iter()
            .map(|id| (id.to_string(), marks(&[7.0, 7.0, 7.0])))
            .collect()
    }

    #[test]
    fn first_incomplete_entry_is_next() {
        let entries = vec![
            entry("a", "x", 1, 2.0),
            entry("b", "x", 2, 2.0),
            entry("c", "x", 3, 2.0),
        ];
        let scores = judged(&["a", "c"]);

        let next = select_next_dive(&entries, &scores, 3).unwrap();
        assert_eq!(next.id, "b");
        // no hidden state: asking again gives the same answer
        assert_eq!(select_next_dive(&entries, &scores, 3).unwrap().id, "b");
    }

    #[test]
    fn partially_judged_entries_are_not_complete() {
        let entries = vec![entry("a", "x", 1, 2.0)];
        let scores = ScoresByEntry::from([("a".to_string(), marks(&[7.0, 7.0]))]);
        assert_eq!(select_next_dive(&entries, &scores, 3).unwrap().id, "a");
    }

    #[test]
    fn nothing_is_next_when_done_or_empty() {
        let entries = vec![entry("a", "x", 1, 2.0), entry("b", "x", 2, 2.0)];
        assert!(select_next_dive(&entries, &judged(&["a", "b"]), 3).is_none());

        let none: Vec<DiveEntry> = vec![];
        assert!(select_next_dive(&none, &ScoresByEntry::new(), 3).is_none());
    }

    #[test]
    fn run_order_finishes_a_round_before_starting_the_next() {
        let run_order = vec![slot("y", 2), slot("x", 1)];
        let entries = HashMap::from([
            (
                "x".to_string(),
                vec![entry("x1", "x", 1, 2.0), entry("x2", "x", 2, 2.0)],
            ),
            (
                "y".to_string(),
                vec![entry("y1", "y", 1, 2.0), entry("y2", "y", 2, 2.0)],
            ),
        ]);

        // x is first in the run order even though listed second
        let next = select_next_dive_in_run_order(
            &run_order,
            &entries,
            &ScoresByEntry::new(),
            3,
            2,
        );
        assert!(matches!(
            next,
            Some(RunOrderNext::Next { round: 1, ref entry }) if entry.id == "x1"
        ));

        // x has also dived round 2, but y's round 1 dive still comes first
        let next = select_next_dive_in_run_order(
            &run_order,
            &entries,
            &judged(&["x1", "x2"]),
            3,
            2,
        );
        assert!(matches!(
            next,
            Some(RunOrderNext::Next { round: 1, ref entry }) if entry.id == "y1"
        ));

        let next = select_next_dive_in_run_order(
            &run_order,
            &entries,
            &judged(&["x1", "y1"]),
            3,
            2,
        );
        assert!(matches!(
            next,
            Some(RunOrderNext::Next { round: 2, ref entry }) if entry.id == "x2"
        ));

        assert!(
            select_next_dive_in_run_order(
                &run_order,
                &entries,
                &judged(&["x1", "y1", "x2", "y2"]),
                3,
                2,
            )
            .is_none()
        );
    }

    #[test]
    fn missing_dive_blocks_the_round() {
        let run_order = vec![slot("x", 1), slot("y", 2)];
        let entries = HashMap::from([
            (
                "x".to_string(),
                vec![entry("x1", "x", 1, 2.0), entry("x2", "x", 2, 2.0)],
            ),
            ("y".to_string(), vec![entry("y1", "y", 1, 2.0)]),
        ]);

        let next = select_next_dive_in_run_order(
            &run_order,
            &entries,
            &judged(&["x1", "y1", "x2"]),
            3,
            2,
        );
        assert_eq!(
            next,
            Some(RunOrderNext::SheetMissing {
                round: 2,
                competitor_id: "y".to_string()
            })
        );
    }
}
