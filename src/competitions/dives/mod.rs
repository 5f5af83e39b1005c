use std::collections::HashMap;

use axum::{Json, extract::Path};
use chrono::{NaiveDateTime, Utc};
use diesel::{
    connection::LoadConnection, dsl::max, prelude::*, sqlite::Sqlite,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::User,
    competitions::{
        competitors::Competitor,
        dives::sheet::check_sheet_is_draft,
        events::Event,
    },
    permission::{Permission, require},
    schema::{competitors, dive_entries},
    state::Conn,
    util_resp::{
        FailureResponse, StandardResponse, bad_request_json, json_created,
        json_ok,
    },
    validation::{
        is_valid_board_height, is_valid_difficulty, normalize_fina_code,
    },
};

pub mod fina;
pub mod sheet;

#[derive(Serialize, Deserialize, Queryable, Clone, Debug, PartialEq)]
pub struct DiveEntry {
    pub id: String,
    pub competitor_id: String,
    pub dive_number: i64,
    pub fina_code: String,
    pub board_height: String,
    pub difficulty: f64,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A dive entry together with the competitor performing it.
#[derive(Serialize, Clone, Debug)]
pub struct EventEntry {
    pub entry: DiveEntry,
    pub competitor: Competitor,
}

impl DiveEntry {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        entry_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Self, FailureResponse> {
        dive_entries::table
            .filter(dive_entries::id.eq(entry_id))
            .first::<DiveEntry>(conn)
            .optional()?
            .ok_or(FailureResponse::NotFound(()))
    }

    pub fn of_competitor(
        competitor_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Vec<Self>, FailureResponse> {
        Ok(dive_entries::table
            .filter(dive_entries::competitor_id.eq(competitor_id))
            .order_by(dive_entries::dive_number.asc())
            .load::<DiveEntry>(conn)?)
    }

    /// Every entry of an event in live order: competitor last name, first
    /// name (then id, to separate namesakes), then dive number.
    pub fn entries_for_event(
        event_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Vec<EventEntry>, FailureResponse> {
        let rows = dive_entries::table
            .inner_join(competitors::table)
            .filter(competitors::event_id.eq(event_id))
            .order_by((
                competitors::last_name.asc(),
                competitors::first_name.asc(),
                competitors::id.asc(),
                dive_entries::dive_number.asc(),
            ))
            .select((dive_entries::all_columns, competitors::all_columns))
            .load::<(DiveEntry, Competitor)>(conn)?;

        Ok(rows
            .into_iter()
            .map(|(entry, competitor)| EventEntry { entry, competitor })
            .collect())
    }

    /// Entries of an event keyed by competitor id, each list sorted by dive
    /// number. Competitors without any entries are absent.
    pub fn by_competitor_for_event(
        event_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<HashMap<String, Vec<DiveEntry>>, FailureResponse> {
        let mut map: HashMap<String, Vec<DiveEntry>> = HashMap::new();
        for EventEntry { entry, .. } in Self::entries_for_event(event_id, conn)? {
            map.entry(entry.competitor_id.clone()).or_default().push(entry);
        }
        Ok(map)
    }

    pub fn highest_dive_number_in_event(
        event_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Option<i64>, FailureResponse> {
        Ok(dive_entries::table
            .inner_join(competitors::table)
            .filter(competitors::event_id.eq(event_id))
            .select(max(dive_entries::dive_number))
            .first::<Option<i64>>(conn)?)
    }
}

#[derive(Deserialize, Debug)]
pub struct EntryInput {
    pub dive_number: i64,
    pub fina_code: String,
    pub board_height: String,
    pub difficulty: Option<f64>,
    pub description: Option<String>,
}

/// An [`EntryInput`] which has passed validation, with the gaps filled in
/// from the FINA table.
#[derive(Debug, PartialEq)]
pub struct ResolvedEntry {
    pub dive_number: i64,
    pub fina_code: String,
    pub board_height: String,
    pub difficulty: f64,
    pub description: Option<String>,
}

impl EntryInput {
    pub fn resolve(&self, num_dives: i64) -> Result<ResolvedEntry, String> {
        if !(1..=num_dives).contains(&self.dive_number) {
            return Err(format!(
                "dive number must be between 1 and {num_dives}"
            ));
        }

        let fina_code = normalize_fina_code(&self.fina_code)?;
        is_valid_board_height(&self.board_height)?;

        let looked_up = fina::lookup(&fina_code, &self.board_height);

        let difficulty = match (self.difficulty, &looked_up) {
            (Some(difficulty), _) => difficulty,
            (None, Some(info)) => info.difficulty,
            (None, None) => {
                return Err(format!(
                    "no difficulty is on record for {fina_code} from {}; \
                     please enter one manually",
                    self.board_height
                ));
            }
        };
        is_valid_difficulty(difficulty)?;

        let description = self
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| looked_up.map(|info| info.description.to_string()));

        Ok(ResolvedEntry {
            dive_number: self.dive_number,
            fina_code,
            board_height: self.board_height.clone(),
            difficulty,
            description,
        })
    }
}

fn dive_number_taken(
    competitor_id: &str,
    dive_number: i64,
    except_entry: Option<&str>,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<bool, FailureResponse> {
    let holders = dive_entries::table
        .filter(dive_entries::competitor_id.eq(competitor_id))
        .filter(dive_entries::dive_number.eq(dive_number))
        .select(dive_entries::id)
        .load::<String>(conn)?;

    Ok(holders.iter().any(|id| Some(id.as_str()) != except_entry))
}

pub async fn list_entries(
    Path(competitor_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let competitor = Competitor::fetch(&competitor_id, &mut *conn)?;
    json_ok(DiveEntry::of_competitor(&competitor.id, &mut *conn)?)
}

pub async fn get_entry(
    Path(entry_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    json_ok(DiveEntry::fetch(&entry_id, &mut *conn)?)
}

pub async fn create_entry(
    Path(competitor_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
    Json(input): Json<EntryInput>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let competitor = Competitor::fetch(&competitor_id, &mut *conn)?;
    let event = Event::fetch(&competitor.event_id, &mut *conn)?;
    check_sheet_is_draft(&competitor.id, &mut *conn)?;

    let resolved = match input.resolve(event.num_dives) {
        Ok(resolved) => resolved,
        Err(e) => return bad_request_json(e),
    };

    let existing = DiveEntry::of_competitor(&competitor.id, &mut *conn)?;
    if existing.len() as i64 >= event.num_dives {
        return bad_request_json(format!(
            "this dive sheet already has all {} dives",
            event.num_dives
        ));
    }
    if dive_number_taken(&competitor.id, resolved.dive_number, None, &mut *conn)? {
        return bad_request_json(format!(
            "dive {} has already been entered",
            resolved.dive_number
        ));
    }

    let id = Uuid::now_v7().to_string();
    diesel::insert_into(dive_entries::table)
        .values((
            dive_entries::id.eq(&id),
            dive_entries::competitor_id.eq(&competitor.id),
            dive_entries::dive_number.eq(resolved.dive_number),
            dive_entries::fina_code.eq(&resolved.fina_code),
            dive_entries::board_height.eq(&resolved.board_height),
            dive_entries::difficulty.eq(resolved.difficulty),
            dive_entries::description.eq(&resolved.description),
            dive_entries::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut *conn)?;

    sheet::mark_updated(&competitor.id, &mut *conn)?;

    info!(
        entry = %id,
        competitor = %competitor.id,
        dive_number = resolved.dive_number,
        code = %resolved.fina_code,
        "added dive entry"
    );

    json_created(DiveEntry::fetch(&id, &mut *conn)?)
}

pub async fn update_entry(
    Path(entry_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
    Json(input): Json<EntryInput>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let entry = DiveEntry::fetch(&entry_id, &mut *conn)?;
    let competitor = Competitor::fetch(&entry.competitor_id, &mut *conn)?;
    let event = Event::fetch(&competitor.event_id, &mut *conn)?;
    check_sheet_is_draft(&competitor.id, &mut *conn)?;

    let resolved = match input.resolve(event.num_dives) {
        Ok(resolved) => resolved,
        Err(e) => return bad_request_json(e),
    };

    if dive_number_taken(
        &competitor.id,
        resolved.dive_number,
        Some(&entry.id),
        &mut *conn,
    )? {
        return bad_request_json(format!(
            "dive {} has already been entered",
            resolved.dive_number
        ));
    }

    diesel::update(dive_entries::table.filter(dive_entries::id.eq(&entry.id)))
        .set((
            dive_entries::dive_number.eq(resolved.dive_number),
            dive_entries::fina_code.eq(&resolved.fina_code),
            dive_entries::board_height.eq(&resolved.board_height),
            dive_entries::difficulty.eq(resolved.difficulty),
            dive_entries::description.eq(&resolved.description),
        ))
        .execute(&mut *conn)?;

    sheet::mark_updated(&competitor.id, &mut *conn)?;

    json_ok(DiveEntry::fetch(&entry.id, &mut *conn)?)
}

pub async fn delete_entry(
    Path(entry_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let entry = DiveEntry::fetch(&entry_id, &mut *conn)?;
    check_sheet_is_draft(&entry.competitor_id, &mut *conn)?;

    diesel::delete(dive_entries::table.filter(dive_entries::id.eq(&entry.id)))
        .execute(&mut *conn)?;

    info!(entry = %entry.id, "removed dive entry");

    json_ok(serde_json::json!({ "deleted": entry.id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(code: &str, height: &str, difficulty: Option<f64>) -> EntryInput {
        EntryInput {
            dive_number: 1,
            fina_code: code.to_string(),
            board_height: height.to_string(),
            difficulty,
            description: None,
        }
    }

    #[test]
    fn missing_difficulty_comes_from_the_table() {
        let resolved = input("105b", "3m", None).resolve(6).unwrap();
        assert_eq!(resolved.fina_code, "105B");
        assert_eq!(resolved.difficulty, 2.4);
        assert_eq!(
            resolved.description.as_deref(),
            Some("Forward 2½ Somersaults Pike")
        );
    }

    #[test]
    fn given_difficulty_wins_over_the_table() {
        let resolved = input("105B", "3m", Some(2.0)).resolve(6).unwrap();
        assert_eq!(resolved.difficulty, 2.0);
    }

    #[test]
    fn unknown_pairs_need_a_manual_difficulty() {
        let err = input("107B", "1m", None).resolve(6).unwrap_err();
        assert!(err.contains("manually"));
        assert_eq!(
            input("107B", "1m", Some(2.9)).resolve(6).unwrap().difficulty,
            2.9
        );
    }

    #[test]
    fn bad_fields_are_rejected() {
        assert!(input("105B", "3m", Some(5.0)).resolve(6).is_err());
        assert!(input("105B", "2m", Some(2.0)).resolve(6).is_err());
        assert!(input("XYZ", "3m", Some(2.0)).resolve(6).is_err());

        let mut late = input("105B", "3m", None);
        late.dive_number = 7;
        assert!(late.resolve(6).is_err());
    }
}
