use once_cell::sync::Lazy;
use regex::Regex;

use crate::competitions::scoring::calc::{
    MAX_DIFFICULTY, MAX_SCORE, MIN_DIFFICULTY, MIN_SCORE,
};

pub const BOARD_HEIGHTS: [&str; 5] = ["1m", "3m", "5m", "7.5m", "10m"];

pub fn is_ascii_no_spaces(username: &str) -> Result<(), String> {
    match !username.is_empty()
        && username.chars().all(|c| c.is_ascii() && !c.is_whitespace())
    {
        true => Ok(()),
        false => Err("should be an ascii string without spaces".to_string()),
    }
}

pub fn is_valid_email(string: &str) -> Result<(), String> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$")
            .unwrap()
    });
    match RE.is_match(string) {
        true => Ok(()),
        false => Err("invalid email".to_string()),
    }
}

pub fn is_valid_password(password: &str) -> Result<(), String> {
    match password.len() >= 6 {
        true => Ok(()),
        false => Err("password should be at least 6 characters".to_string()),
    }
}

pub fn is_non_empty(field: &str, value: &str) -> Result<(), String> {
    match value.trim().is_empty() {
        false => Ok(()),
        true => Err(format!("{field} is required")),
    }
}

/// Judge marks go from 0 to 10 in half-point steps.
pub fn is_valid_score(score: f64) -> Result<(), String> {
    if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(format!(
            "score must be between {MIN_SCORE} and {MAX_SCORE}"
        ));
    }
    match (score * 2.0).fract() == 0.0 {
        true => Ok(()),
        false => Err("score must be a multiple of 0.5".to_string()),
    }
}

pub fn is_valid_difficulty(difficulty: f64) -> Result<(), String> {
    match difficulty.is_finite()
        && (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty)
    {
        true => Ok(()),
        false => Err(format!(
            "difficulty must be between {MIN_DIFFICULTY} and {MAX_DIFFICULTY}"
        )),
    }
}

/// Checks a FINA dive code and returns it in its stored (uppercase) form.
pub fn normalize_fina_code(code: &str) -> Result<String, String> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[1-6][0-9]{2,3}[A-D]$").unwrap());

    let upper = code.trim().to_ascii_uppercase();
    match RE.is_match(&upper) {
        true => Ok(upper),
        false => Err(format!(
            "'{code}' is not a valid FINA code (e.g. 105B or 5253B)"
        )),
    }
}

pub fn is_valid_board_height(height: &str) -> Result<(), String> {
    match BOARD_HEIGHTS.contains(&height) {
        true => Ok(()),
        false => Err(format!(
            "board height must be one of {}",
            BOARD_HEIGHTS.join(", ")
        )),
    }
}

pub fn is_valid_num_judges(num_judges: i64) -> Result<(), String> {
    match num_judges {
        3 | 5 => Ok(()),
        _ => Err("number of judges must be 3 or 5".to_string()),
    }
}

pub fn is_valid_num_dives(num_dives: i64) -> Result<(), String> {
    match num_dives >= 1 {
        true => Ok(()),
        false => Err("an event needs at least one dive".to_string()),
    }
}

#[cfg(test)]
#[test]
fn test_email() {
    assert!(is_valid_email("hello@example.com").is_ok());
    assert!(is_valid_email("hello").is_err());
}

#[cfg(test)]
#[test]
fn test_scores() {
    assert!(is_valid_score(0.0).is_ok());
    assert!(is_valid_score(7.5).is_ok());
    assert!(is_valid_score(10.0).is_ok());
    assert!(is_valid_score(7.3).is_err());
    assert!(is_valid_score(10.5).is_err());
    assert!(is_valid_score(-0.5).is_err());
    assert!(is_valid_score(f64::NAN).is_err());
}

#[cfg(test)]
#[test]
fn test_fina_codes() {
    assert_eq!(normalize_fina_code("105b").unwrap(), "105B");
    assert_eq!(normalize_fina_code("5253B").unwrap(), "5253B");
    assert!(normalize_fina_code("705B").is_err());
    assert!(normalize_fina_code("10B").is_err());
    assert!(normalize_fina_code("105E").is_err());
    // arabic-indic digits
    assert!(normalize_fina_code("1\u{0660}\u{0665}B").is_err());
}

#[cfg(test)]
#[test]
fn test_heights_and_counts() {
    assert!(is_valid_board_height("7.5m").is_ok());
    assert!(is_valid_board_height("2m").is_err());
    assert!(is_valid_difficulty(4.5).is_ok());
    assert!(is_valid_difficulty(0.9).is_err());
    assert!(is_valid_num_judges(5).is_ok());
    assert!(is_valid_num_judges(4).is_err());
    assert!(is_valid_num_dives(0).is_err());
}
