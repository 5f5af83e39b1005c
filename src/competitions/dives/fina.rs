//! Degree-of-difficulty table for the standard FINA dive codes.

use axum::extract::Path;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::{
    util_resp::{StandardResponse, err_not_found, json_ok},
    validation::{BOARD_HEIGHTS, normalize_fina_code},
};

pub struct FinaDive {
    pub code: &'static str,
    pub description: &'static str,
    /// Difficulty per board height, in the order of [`BOARD_HEIGHTS`].
    /// `None` means the dive is not performed from that height.
    heights: [Option<f64>; 5],
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DiveInfo {
    pub difficulty: f64,
    pub description: &'static str,
}

const fn dive(
    code: &'static str,
    description: &'static str,
    heights: [Option<f64>; 5],
) -> FinaDive {
    FinaDive {
        code,
        description,
        heights,
    }
}

#[rustfmt::skip]
const DIVES: &[FinaDive] = &[
    dive("101A", "Forward Dive Straight", [Some(1.2), Some(1.4), Some(1.6), Some(1.6), Some(1.6)]),
    dive("101B", "Forward Dive Pike", [Some(1.1), Some(1.3), Some(1.5), Some(1.5), Some(1.5)]),
    dive("101C", "Forward Dive Tuck", [Some(1.0), Some(1.2), Some(1.4), Some(1.4), Some(1.4)]),
    dive("102A", "Forward Somersault Straight", [Some(1.4), Some(1.6), Some(1.8), Some(1.8), Some(1.8)]),
    dive("102B", "Forward Somersault Pike", [Some(1.3), Some(1.5), Some(1.7), Some(1.7), Some(1.7)]),
    dive("102C", "Forward Somersault Tuck", [Some(1.2), Some(1.4), Some(1.6), Some(1.6), Some(1.6)]),
    dive("103A", "Forward 1½ Somersaults Straight", [Some(1.5), Some(1.7), Some(1.9), Some(1.9), Some(1.9)]),
    dive("103B", "Forward 1½ Somersaults Pike", [Some(1.4), Some(1.6), Some(1.8), Some(1.7), Some(1.7)]),
    dive("103C", "Forward 1½ Somersaults Tuck", [Some(1.3), Some(1.5), Some(1.7), Some(1.6), Some(1.6)]),
    dive("104A", "Forward 2 Somersaults Straight", [Some(2.2), Some(2.4), Some(2.6), Some(2.6), Some(2.6)]),
    dive("104B", "Forward 2 Somersaults Pike", [Some(2.1), Some(2.3), Some(2.5), Some(2.5), Some(2.5)]),
    dive("104C", "Forward 2 Somersaults Tuck", [Some(2.0), Some(2.2), Some(2.4), Some(2.4), Some(2.4)]),
    dive("105A", "Forward 2½ Somersaults Straight", [Some(2.4), Some(2.6), Some(2.8), Some(2.8), Some(2.8)]),
    dive("105B", "Forward 2½ Somersaults Pike", [Some(2.2), Some(2.4), Some(2.6), Some(2.6), Some(2.6)]),
    dive("105C", "Forward 2½ Somersaults Tuck", [Some(2.0), Some(2.2), Some(2.4), Some(2.4), Some(2.4)]),
    dive("106A", "Forward 3 Somersaults Straight", [Some(2.7), Some(2.9), Some(3.1), Some(3.2), Some(3.2)]),
    dive("106B", "Forward 3 Somersaults Pike", [Some(2.5), Some(2.7), Some(2.9), Some(3.0), Some(3.0)]),
    dive("106C", "Forward 3 Somersaults Tuck", [Some(2.3), Some(2.5), Some(2.7), Some(2.8), Some(2.8)]),
    dive("107A", "Forward 3½ Somersaults Straight", [None, Some(3.2), Some(3.4), Some(3.5), Some(3.5)]),
    dive("107B", "Forward 3½ Somersaults Pike", [None, Some(3.0), Some(3.2), Some(3.3), Some(3.3)]),
    dive("107C", "Forward 3½ Somersaults Tuck", [None, Some(2.7), Some(2.9), Some(3.0), Some(3.0)]),
    dive("108B", "Forward 4 Somersaults Pike", [None, None, Some(3.3), Some(3.5), Some(3.5)]),
    dive("108C", "Forward 4 Somersaults Tuck", [None, None, Some(2.9), Some(3.1), Some(3.1)]),
    dive("109C", "Forward 4½ Somersaults Tuck", [None, None, None, Some(3.4), Some(3.4)]),
    dive("201A", "Back Dive Straight", [Some(1.3), Some(1.5), Some(1.7), Some(1.7), Some(1.7)]),
    dive("201B", "Back Dive Pike", [Some(1.2), Some(1.4), Some(1.6), Some(1.6), Some(1.6)]),
    dive("201C", "Back Dive Tuck", [Some(1.1), Some(1.3), Some(1.5), Some(1.5), Some(1.5)]),
    dive("202A", "Back Somersault Straight", [Some(1.5), Some(1.7), Some(1.9), Some(1.9), Some(1.9)]),
    dive("202B", "Back Somersault Pike", [Some(1.4), Some(1.6), Some(1.8), Some(1.8), Some(1.8)]),
    dive("202C", "Back Somersault Tuck", [Some(1.3), Some(1.5), Some(1.7), Some(1.7), Some(1.7)]),
    dive("203A", "Back 1½ Somersaults Straight", [Some(1.8), Some(2.0), Some(2.2), Some(2.2), Some(2.2)]),
    dive("203B", "Back 1½ Somersaults Pike", [Some(1.6), Some(1.8), Some(2.0), Some(2.0), Some(2.0)]),
    dive("203C", "Back 1½ Somersaults Tuck", [Some(1.5), Some(1.7), Some(1.9), Some(1.8), Some(1.8)]),
    dive("204A", "Back 2 Somersaults Straight", [Some(2.3), Some(2.5), Some(2.7), Some(2.7), Some(2.7)]),
    dive("204B", "Back 2 Somersaults Pike", [Some(2.1), Some(2.3), Some(2.5), Some(2.5), Some(2.5)]),
    dive("204C", "Back 2 Somersaults Tuck", [Some(2.0), Some(2.2), Some(2.4), Some(2.3), Some(2.3)]),
    dive("205A", "Back 2½ Somersaults Straight", [Some(2.6), Some(2.8), Some(3.0), Some(3.0), Some(3.0)]),
    dive("205B", "Back 2½ Somersaults Pike", [Some(2.4), Some(2.6), Some(2.8), Some(2.8), Some(2.8)]),
    dive("205C", "Back 2½ Somersaults Tuck", [Some(2.2), Some(2.4), Some(2.6), Some(2.6), Some(2.6)]),
    dive("206A", "Back 3 Somersaults Straight", [Some(2.9), Some(3.1), Some(3.3), Some(3.3), Some(3.3)]),
    dive("206B", "Back 3 Somersaults Pike", [Some(2.7), Some(2.9), Some(3.1), Some(3.1), Some(3.1)]),
    dive("206C", "Back 3 Somersaults Tuck", [Some(2.5), Some(2.7), Some(2.9), Some(2.9), Some(2.9)]),
    dive("207A", "Back 3½ Somersaults Straight", [None, Some(3.4), Some(3.6), Some(3.6), Some(3.6)]),
    dive("207B", "Back 3½ Somersaults Pike", [None, Some(3.2), Some(3.4), Some(3.4), Some(3.4)]),
    dive("207C", "Back 3½ Somersaults Tuck", [None, Some(2.9), Some(3.1), Some(3.1), Some(3.1)]),
    dive("301A", "Reverse Dive Straight", [Some(1.4), Some(1.6), Some(1.8), Some(1.8), Some(1.8)]),
    dive("301B", "Reverse Dive Pike", [Some(1.3), Some(1.5), Some(1.7), Some(1.7), Some(1.7)]),
    dive("301C", "Reverse Dive Tuck", [Some(1.2), Some(1.4), Some(1.6), Some(1.6), Some(1.6)]),
    dive("302A", "Reverse Somersault Straight", [Some(1.6), Some(1.8), Some(2.0), Some(2.0), Some(2.0)]),
    dive("302B", "Reverse Somersault Pike", [Some(1.5), Some(1.7), Some(1.9), Some(1.9), Some(1.9)]),
    dive("302C", "Reverse Somersault Tuck", [Some(1.4), Some(1.6), Some(1.8), Some(1.8), Some(1.8)]),
    dive("303A", "Reverse 1½ Somersaults Straight", [Some(1.9), Some(2.1), Some(2.3), Some(2.3), Some(2.3)]),
    dive("303B", "Reverse 1½ Somersaults Pike", [Some(1.7), Some(1.9), Some(2.1), Some(2.1), Some(2.1)]),
    dive("303C", "Reverse 1½ Somersaults Tuck", [Some(1.6), Some(1.8), Some(2.0), Some(1.9), Some(1.9)]),
    dive("304A", "Reverse 2 Somersaults Straight", [Some(2.4), Some(2.6), Some(2.8), Some(2.8), Some(2.8)]),
    dive("304B", "Reverse 2 Somersaults Pike", [Some(2.2), Some(2.4), Some(2.6), Some(2.6), Some(2.6)]),
    dive("304C", "Reverse 2 Somersaults Tuck", [Some(2.1), Some(2.3), Some(2.5), Some(2.4), Some(2.4)]),
    dive("305A", "Reverse 2½ Somersaults Straight", [Some(2.7), Some(2.9), Some(3.1), Some(3.1), Some(3.1)]),
    dive("305B", "Reverse 2½ Somersaults Pike", [Some(2.5), Some(2.7), Some(2.9), Some(2.9), Some(2.9)]),
    dive("305C", "Reverse 2½ Somersaults Tuck", [Some(2.3), Some(2.5), Some(2.7), Some(2.7), Some(2.7)]),
    dive("306A", "Reverse 3 Somersaults Straight", [Some(3.0), Some(3.2), Some(3.4), Some(3.4), Some(3.4)]),
    dive("306B", "Reverse 3 Somersaults Pike", [Some(2.8), Some(3.0), Some(3.2), Some(3.2), Some(3.2)]),
    dive("306C", "Reverse 3 Somersaults Tuck", [Some(2.6), Some(2.8), Some(3.0), Some(3.0), Some(3.0)]),
    dive("307C", "Reverse 3½ Somersaults Tuck", [None, Some(3.0), Some(3.2), Some(3.2), Some(3.2)]),
    dive("401A", "Inward Dive Straight", [Some(1.2), Some(1.4), Some(1.6), Some(1.6), Some(1.6)]),
    dive("401B", "Inward Dive Pike", [Some(1.1), Some(1.3), Some(1.5), Some(1.5), Some(1.5)]),
    dive("401C", "Inward Dive Tuck", [Some(1.0), Some(1.2), Some(1.4), Some(1.4), Some(1.4)]),
    dive("402A", "Inward Somersault Straight", [Some(1.4), Some(1.6), Some(1.8), Some(1.8), Some(1.8)]),
    dive("402B", "Inward Somersault Pike", [Some(1.3), Some(1.5), Some(1.7), Some(1.7), Some(1.7)]),
    dive("402C", "Inward Somersault Tuck", [Some(1.2), Some(1.4), Some(1.6), Some(1.6), Some(1.6)]),
    dive("403A", "Inward 1½ Somersaults Straight", [Some(1.8), Some(2.0), Some(2.2), Some(2.2), Some(2.2)]),
    dive("403B", "Inward 1½ Somersaults Pike", [Some(1.6), Some(1.8), Some(2.0), Some(2.0), Some(2.0)]),
    dive("403C", "Inward 1½ Somersaults Tuck", [Some(1.5), Some(1.7), Some(1.9), Some(1.8), Some(1.8)]),
    dive("404A", "Inward 2 Somersaults Straight", [Some(2.3), Some(2.5), Some(2.7), Some(2.7), Some(2.7)]),
    dive("404B", "Inward 2 Somersaults Pike", [Some(2.1), Some(2.3), Some(2.5), Some(2.5), Some(2.5)]),
    dive("404C", "Inward 2 Somersaults Tuck", [Some(2.0), Some(2.2), Some(2.4), Some(2.3), Some(2.3)]),
    dive("405A", "Inward 2½ Somersaults Straight", [Some(2.6), Some(2.8), Some(3.0), Some(3.0), Some(3.0)]),
    dive("405B", "Inward 2½ Somersaults Pike", [Some(2.4), Some(2.6), Some(2.8), Some(2.8), Some(2.8)]),
    dive("405C", "Inward 2½ Somersaults Tuck", [Some(2.2), Some(2.4), Some(2.6), Some(2.6), Some(2.6)]),
    dive("406B", "Inward 3 Somersaults Pike", [Some(2.7), Some(2.9), Some(3.1), Some(3.1), Some(3.1)]),
    dive("406C", "Inward 3 Somersaults Tuck", [Some(2.5), Some(2.7), Some(2.9), Some(2.9), Some(2.9)]),
    dive("407C", "Inward 3½ Somersaults Tuck", [None, Some(2.9), Some(3.1), Some(3.1), Some(3.1)]),
    dive("5122B", "Forward Dive ½ Twist Pike", [Some(1.4), Some(1.6), None, None, None]),
    dive("5124D", "Forward Dive 1 Twist Free", [Some(1.8), Some(2.0), None, None, None]),
    dive("5132D", "Forward Somersault ½ Twist Free", [Some(1.8), Some(2.0), None, None, None]),
    dive("5134D", "Forward Somersault 1 Twist Free", [Some(2.0), Some(2.2), Some(2.4), Some(2.3), Some(2.3)]),
    dive("5136D", "Forward Somersault 1½ Twists Free", [Some(2.2), Some(2.4), Some(2.6), Some(2.5), Some(2.5)]),
    dive("5138D", "Forward Somersault 2 Twists Free", [Some(2.5), Some(2.7), Some(2.9), Some(2.8), Some(2.8)]),
    dive("5152B", "Forward 1½ Somersaults ½ Twist Pike", [Some(2.2), Some(2.4), Some(2.6), Some(2.6), Some(2.6)]),
    dive("5154B", "Forward 1½ Somersaults 1 Twist Pike", [Some(2.5), Some(2.7), Some(2.9), Some(2.9), Some(2.9)]),
    dive("5156B", "Forward 1½ Somersaults 1½ Twists Pike", [Some(2.8), Some(3.0), Some(3.2), Some(3.2), Some(3.2)]),
    dive("5233D", "Back Dive ½ Twist Free", [Some(2.0), Some(2.2), Some(2.4), Some(2.4), Some(2.4)]),
    dive("5235D", "Back Dive 1 Twist Free", [Some(2.3), Some(2.5), Some(2.7), Some(2.7), Some(2.7)]),
    dive("5237D", "Back Dive 1½ Twists Free", [Some(2.6), Some(2.8), Some(3.0), Some(3.0), Some(3.0)]),
    dive("5251B", "Back Somersault ½ Twist Pike", [Some(2.2), Some(2.4), Some(2.6), Some(2.6), Some(2.6)]),
    dive("5253B", "Back Somersault 1 Twist Pike", [Some(2.5), Some(2.7), Some(2.9), Some(2.9), Some(2.9)]),
    dive("5255B", "Back Somersault 1½ Twists Pike", [Some(2.8), Some(3.0), Some(3.2), Some(3.2), Some(3.2)]),
    dive("5333D", "Reverse Dive ½ Twist Free", [Some(2.1), Some(2.3), Some(2.5), Some(2.5), Some(2.5)]),
    dive("5335D", "Reverse Dive 1 Twist Free", [Some(2.4), Some(2.6), Some(2.8), Some(2.8), Some(2.8)]),
    dive("5337D", "Reverse Dive 1½ Twists Free", [Some(2.7), Some(2.9), Some(3.1), Some(3.1), Some(3.1)]),
    dive("5351B", "Reverse Somersault ½ Twist Pike", [Some(2.3), Some(2.5), Some(2.7), Some(2.7), Some(2.7)]),
    dive("5353B", "Reverse Somersault 1 Twist Pike", [Some(2.6), Some(2.8), Some(3.0), Some(3.0), Some(3.0)]),
    dive("601A", "Armstand Dive Straight", [None, None, None, Some(1.5), Some(1.5)]),
    dive("601B", "Armstand Dive Pike", [None, None, None, Some(1.4), Some(1.4)]),
    dive("601C", "Armstand Dive Tuck", [None, None, None, Some(1.3), Some(1.3)]),
    dive("602A", "Armstand Somersault Straight", [None, None, None, Some(1.7), Some(1.7)]),
    dive("602B", "Armstand Somersault Pike", [None, None, None, Some(1.6), Some(1.6)]),
    dive("602C", "Armstand Somersault Tuck", [None, None, None, Some(1.5), Some(1.5)]),
    dive("603A", "Armstand 1½ Somersaults Straight", [None, None, None, Some(2.0), Some(2.0)]),
    dive("603B", "Armstand 1½ Somersaults Pike", [None, None, None, Some(1.8), Some(1.8)]),
    dive("603C", "Armstand 1½ Somersaults Tuck", [None, None, None, Some(1.7), Some(1.7)]),
    dive("604B", "Armstand 2 Somersaults Pike", [None, None, None, Some(2.2), Some(2.2)]),
    dive("604C", "Armstand 2 Somersaults Tuck", [None, None, None, Some(2.1), Some(2.1)]),
    dive("605B", "Armstand 2½ Somersaults Pike", [None, None, None, Some(2.5), Some(2.5)]),
    dive("605C", "Armstand 2½ Somersaults Tuck", [None, None, None, Some(2.4), Some(2.4)]),
    dive("606B", "Armstand 3 Somersaults Pike", [None, None, None, Some(2.8), Some(2.8)]),
    dive("606C", "Armstand 3 Somersaults Tuck", [None, None, None, Some(2.6), Some(2.6)]),
];

static BY_CODE: Lazy<IndexMap<&'static str, &'static FinaDive>> =
    Lazy::new(|| DIVES.iter().map(|dive| (dive.code, dive)).collect());

impl FinaDive {
    pub fn difficulty_at(&self, board_height: &str) -> Option<f64> {
        let idx = BOARD_HEIGHTS.iter().position(|h| *h == board_height)?;
        self.heights[idx]
    }
}

/// Looks up the difficulty and name of a dive from a given board height.
/// Codes are matched case-insensitively.
pub fn lookup(code: &str, board_height: &str) -> Option<DiveInfo> {
    let code = normalize_fina_code(code).ok()?;
    let dive = BY_CODE.get(code.as_str())?;
    tracing::trace!(code = dive.code, board_height, "fina lookup");

    dive.difficulty_at(board_height).map(|difficulty| DiveInfo {
        difficulty,
        description: dive.description,
    })
}

/// Every dive which can be performed from `board_height`, in table order.
pub fn dives_from(board_height: &str) -> Vec<(&'static str, DiveInfo)> {
    BY_CODE
        .values()
        .filter_map(|dive| {
            dive.difficulty_at(board_height).map(|difficulty| {
                (
                    dive.code,
                    DiveInfo {
                        difficulty,
                        description: dive.description,
                    },
                )
            })
        })
        .collect()
}

pub async fn fina_lookup(
    Path((code, board_height)): Path<(String, String)>,
) -> StandardResponse {
    match lookup(&code, &board_height) {
        Some(info) => json_ok(info),
        None => err_not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_depend_on_height() {
        let info = lookup("105b", "3m").unwrap();
        assert_eq!(info.difficulty, 2.4);
        assert_eq!(info.description, "Forward 2½ Somersaults Pike");
        assert_eq!(lookup("105B", "10m").unwrap().difficulty, 2.6);
    }

    #[test]
    fn missing_heights_and_codes_give_nothing() {
        assert!(lookup("107B", "1m").is_none());
        assert!(lookup("601A", "3m").is_none());
        assert!(lookup("199Z", "3m").is_none());
        assert!(lookup("105B", "2m").is_none());
    }

    #[test]
    fn every_difficulty_is_in_range() {
        for dive in DIVES {
            assert!(normalize_fina_code(dive.code).is_ok(), "{}", dive.code);
            for height in BOARD_HEIGHTS {
                if let Some(dd) = dive.difficulty_at(height) {
                    assert!((1.0..=4.5).contains(&dd), "{} {height}", dive.code);
                }
            }
        }
        assert_eq!(BY_CODE.len(), DIVES.len());
    }

    #[test]
    fn armstands_are_platform_only() {
        let from_springboard = dives_from("3m");
        assert!(!from_springboard.is_empty());
        assert!(from_springboard.iter().all(|(code, _)| !code.starts_with('6')));
    }
}
