use axum::{Json, extract::Path};
use chrono::{NaiveDateTime, Utc};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::User,
    competitions::{Competition, events::Event},
    permission::{Permission, require},
    schema::{competitors, events},
    state::Conn,
    util_resp::{
        FailureResponse, StandardResponse, bad_request_json, json_created,
        json_ok,
    },
    validation::is_non_empty,
};

#[derive(Serialize, Deserialize, Queryable, Clone, Debug, PartialEq)]
pub struct Competitor {
    pub id: String,
    pub event_id: String,
    pub first_name: String,
    pub last_name: String,
    pub club: Option<String>,
    pub age_group: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Competitor {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        competitor_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Self, FailureResponse> {
        competitors::table
            .filter(competitors::id.eq(competitor_id))
            .first::<Competitor>(conn)
            .optional()?
            .ok_or(FailureResponse::NotFound(()))
    }

    /// Competitors of an event by last name, then first name. The id breaks
    /// ties between namesakes so that the order never changes between polls.
    pub fn of_event(
        event_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Vec<Self>, FailureResponse> {
        Ok(competitors::table
            .filter(competitors::event_id.eq(event_id))
            .order_by((
                competitors::last_name.asc(),
                competitors::first_name.asc(),
                competitors::id.asc(),
            ))
            .load::<Competitor>(conn)?)
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Serialize, Debug)]
pub struct CompetitorWithEvent {
    #[serde(flatten)]
    pub competitor: Competitor,
    pub event_name: String,
}

#[derive(Deserialize, Debug)]
pub struct CompetitorInput {
    pub first_name: String,
    pub last_name: String,
    pub club: Option<String>,
    pub age_group: Option<String>,
}

impl CompetitorInput {
    fn validate(&self) -> Result<(), String> {
        is_non_empty("first name", &self.first_name)?;
        is_non_empty("last name", &self.last_name)
    }
}

pub async fn list_competitors(
    Path(event_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let event = Event::fetch(&event_id, &mut *conn)?;
    json_ok(Competitor::of_event(&event.id, &mut *conn)?)
}

pub async fn list_competition_competitors(
    Path(competition_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let competition = Competition::fetch(&competition_id, &mut *conn)?;

    let rows = competitors::table
        .inner_join(events::table)
        .filter(events::competition_id.eq(&competition.id))
        .order_by((
            events::name.asc(),
            competitors::last_name.asc(),
            competitors::first_name.asc(),
        ))
        .select((competitors::all_columns, events::name))
        .load::<(Competitor, String)>(&mut *conn)?;

    json_ok(
        rows.into_iter()
            .map(|(competitor, event_name)| CompetitorWithEvent {
                competitor,
                event_name,
            })
            .collect::<Vec<_>>(),
    )
}

pub async fn get_competitor(
    Path(competitor_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    json_ok(Competitor::fetch(&competitor_id, &mut *conn)?)
}

pub async fn create_competitor(
    Path(event_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
    Json(input): Json<CompetitorInput>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let event = Event::fetch(&event_id, &mut *conn)?;

    if let Err(e) = input.validate() {
        return bad_request_json(e);
    }

    let id = Uuid::now_v7().to_string();
    diesel::insert_into(competitors::table)
        .values((
            competitors::id.eq(&id),
            competitors::event_id.eq(&event.id),
            competitors::first_name.eq(input.first_name.trim()),
            competitors::last_name.eq(input.last_name.trim()),
            competitors::club.eq(&input.club),
            competitors::age_group.eq(&input.age_group),
            competitors::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut *conn)?;

    info!(competitor = %id, event = %event.id, "added competitor");

    json_created(Competitor::fetch(&id, &mut *conn)?)
}

pub async fn update_competitor(
    Path(competitor_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
    Json(input): Json<CompetitorInput>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let competitor = Competitor::fetch(&competitor_id, &mut *conn)?;

    if let Err(e) = input.validate() {
        return bad_request_json(e);
    }

    diesel::update(competitors::table.filter(competitors::id.eq(&competitor.id)))
        .set((
            competitors::first_name.eq(input.first_name.trim()),
            competitors::last_name.eq(input.last_name.trim()),
            competitors::club.eq(&input.club),
            competitors::age_group.eq(&input.age_group),
        ))
        .execute(&mut *conn)?;

    json_ok(Competitor::fetch(&competitor.id, &mut *conn)?)
}

pub async fn delete_competitor(
    Path(competitor_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let competitor = Competitor::fetch(&competitor_id, &mut *conn)?;
    diesel::delete(competitors::table.filter(competitors::id.eq(&competitor.id)))
        .execute(&mut *conn)?;

    info!(competitor = %competitor.id, "removed competitor");

    json_ok(serde_json::json!({ "deleted": competitor.id }))
}
