//! Dive sheets: the list of dives a competitor has entered, and whether it is
//! still being edited (`draft`) or has been handed in (`submitted`).

use std::collections::HashMap;

use axum::extract::Path;
use chrono::{NaiveDateTime, Utc};
use diesel::{
    connection::LoadConnection, prelude::*, sqlite::Sqlite,
    upsert::excluded,
};
use serde::Serialize;
use tracing::info;

use crate::{
    auth::User,
    competitions::{competitors::Competitor, dives::DiveEntry},
    permission::{Permission, require},
    schema::{competitors, dive_sheets},
    state::Conn,
    util_resp::{FailureResponse, StandardResponse, json_ok},
};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SheetStatus {
    Draft,
    Submitted,
}

impl SheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetStatus::Draft => "draft",
            SheetStatus::Submitted => "submitted",
        }
    }

    fn from_column(value: &str) -> Self {
        match value {
            "submitted" => SheetStatus::Submitted,
            _ => SheetStatus::Draft,
        }
    }
}

#[derive(Queryable, Debug, Clone)]
struct SheetRow {
    competitor_id: String,
    status: String,
    submitted_at: Option<NaiveDateTime>,
    updated_at: NaiveDateTime,
}

#[derive(Serialize, Debug, Clone)]
pub struct DiveSheet {
    pub competitor_id: String,
    pub status: SheetStatus,
    pub submitted_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl DiveSheet {
    /// A competitor without a stored sheet has an empty draft.
    pub fn of_competitor(
        competitor_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Self, FailureResponse> {
        let row = dive_sheets::table
            .filter(dive_sheets::competitor_id.eq(competitor_id))
            .first::<SheetRow>(conn)
            .optional()?;

        Ok(match row {
            Some(row) => DiveSheet {
                status: SheetStatus::from_column(&row.status),
                competitor_id: row.competitor_id,
                submitted_at: row.submitted_at,
                updated_at: Some(row.updated_at),
            },
            None => DiveSheet {
                competitor_id: competitor_id.to_string(),
                status: SheetStatus::Draft,
                submitted_at: None,
                updated_at: None,
            },
        })
    }
}

/// Sheet status of every competitor in an event which has a stored sheet.
pub fn sheet_statuses(
    event_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<HashMap<String, SheetStatus>, FailureResponse> {
    let rows = dive_sheets::table
        .inner_join(competitors::table)
        .filter(competitors::event_id.eq(event_id))
        .select((dive_sheets::competitor_id, dive_sheets::status))
        .load::<(String, String)>(conn)?;

    Ok(rows
        .into_iter()
        .map(|(id, status)| (id, SheetStatus::from_column(&status)))
        .collect())
}

pub fn check_sheet_is_draft(
    competitor_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(), FailureResponse> {
    match DiveSheet::of_competitor(competitor_id, conn)?.status {
        SheetStatus::Draft => Ok(()),
        SheetStatus::Submitted => Err(FailureResponse::BadRequestJson(
            "this dive sheet has been submitted; reopen it before making \
             changes"
                .to_string(),
        )),
    }
}

pub fn set_status(
    competitor_id: &str,
    status: SheetStatus,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(), FailureResponse> {
    let now = Utc::now().naive_utc();
    let submitted_at = (status == SheetStatus::Submitted).then_some(now);

    diesel::insert_into(dive_sheets::table)
        .values((
            dive_sheets::competitor_id.eq(competitor_id),
            dive_sheets::status.eq(status.as_str()),
            dive_sheets::submitted_at.eq(submitted_at),
            dive_sheets::updated_at.eq(now),
        ))
        .on_conflict(dive_sheets::competitor_id)
        .do_update()
        .set((
            dive_sheets::status.eq(excluded(dive_sheets::status)),
            dive_sheets::submitted_at.eq(excluded(dive_sheets::submitted_at)),
            dive_sheets::updated_at.eq(excluded(dive_sheets::updated_at)),
        ))
        .execute(conn)?;

    Ok(())
}

/// Records that a draft sheet was edited, creating the row if needed.
pub fn mark_updated(
    competitor_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(), FailureResponse> {
    set_status(competitor_id, SheetStatus::Draft, conn)
}

#[derive(Serialize)]
struct SheetWithEntries {
    dive_sheet: DiveSheet,
    entries: Vec<DiveEntry>,
}

pub async fn get_dive_sheet(
    Path(competitor_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let competitor = Competitor::fetch(&competitor_id, &mut *conn)?;

    json_ok(SheetWithEntries {
        dive_sheet: DiveSheet::of_competitor(&competitor.id, &mut *conn)?,
        entries: DiveEntry::of_competitor(&competitor.id, &mut *conn)?,
    })
}

pub async fn submit_dive_sheet(
    Path(competitor_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let competitor = Competitor::fetch(&competitor_id, &mut *conn)?;
    set_status(&competitor.id, SheetStatus::Submitted, &mut *conn)?;

    info!(competitor = %competitor.id, "dive sheet submitted");

    json_ok(DiveSheet::of_competitor(&competitor.id, &mut *conn)?)
}

pub async fn reopen_dive_sheet(
    Path(competitor_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let competitor = Competitor::fetch(&competitor_id, &mut *conn)?;
    set_status(&competitor.id, SheetStatus::Draft, &mut *conn)?;

    info!(competitor = %competitor.id, "dive sheet reopened");

    json_ok(DiveSheet::of_competitor(&competitor.id, &mut *conn)?)
}
