use axum::{Json, extract::Path};
use chrono::{NaiveDateTime, Utc};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::User,
    competitions::{
        Competition,
        competitors::Competitor,
        dives::{
            DiveEntry,
            sheet::{SheetStatus, sheet_statuses},
        },
    },
    permission::{Permission, require},
    schema::events,
    state::Conn,
    template::Page,
    util_resp::{
        FailureResponse, StandardResponse, bad_request_json, json_created,
        json_ok, success,
    },
    validation::{is_non_empty, is_valid_num_dives},
    widgets::{actions::Actions, alert::InfoAlert},
};

pub const DEFAULT_NUM_DIVES: i64 = 6;

#[derive(Serialize, Deserialize, Queryable, Clone, Debug)]
pub struct Event {
    pub id: String,
    pub competition_id: String,
    pub name: String,
    pub date: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub num_dives: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Event {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        event_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Self, FailureResponse> {
        events::table
            .filter(events::id.eq(event_id))
            .first::<Event>(conn)
            .optional()?
            .ok_or(FailureResponse::NotFound(()))
    }

    pub fn of_competition(
        competition_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Vec<Self>, FailureResponse> {
        Ok(events::table
            .filter(events::competition_id.eq(competition_id))
            .order_by((events::date.asc(), events::name.asc()))
            .load::<Event>(conn)?)
    }

    pub fn num_judges(
        &self,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<i64, FailureResponse> {
        Competition::num_judges_of(&self.competition_id, conn)
    }
}

#[derive(Deserialize, Debug)]
pub struct EventInput {
    pub name: String,
    pub date: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub num_dives: Option<i64>,
}

impl EventInput {
    fn validate(&self) -> Result<i64, String> {
        is_non_empty("name", &self.name)?;
        let num_dives = self.num_dives.unwrap_or(DEFAULT_NUM_DIVES);
        is_valid_num_dives(num_dives)?;
        Ok(num_dives)
    }
}

pub async fn list_events(
    Path(competition_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let competition = Competition::fetch(&competition_id, &mut *conn)?;
    json_ok(Event::of_competition(&competition.id, &mut *conn)?)
}

pub async fn get_event(
    Path(event_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    json_ok(Event::fetch(&event_id, &mut *conn)?)
}

pub async fn create_event(
    Path(competition_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
    Json(input): Json<EventInput>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let competition = Competition::fetch(&competition_id, &mut *conn)?;

    let num_dives = match input.validate() {
        Ok(n) => n,
        Err(e) => return bad_request_json(e),
    };

    let id = Uuid::now_v7().to_string();
    let now = Utc::now().naive_utc();
    diesel::insert_into(events::table)
        .values((
            events::id.eq(&id),
            events::competition_id.eq(&competition.id),
            events::name.eq(input.name.trim()),
            events::date.eq(&input.date),
            events::location.eq(&input.location),
            events::description.eq(&input.description),
            events::num_dives.eq(num_dives),
            events::created_at.eq(now),
            events::updated_at.eq(now),
        ))
        .execute(&mut *conn)?;

    info!(event = %id, competition = %competition.id, "created event");

    json_created(Event::fetch(&id, &mut *conn)?)
}

pub async fn update_event(
    Path(event_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
    Json(input): Json<EventInput>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let event = Event::fetch(&event_id, &mut *conn)?;

    let num_dives = match input.validate() {
        Ok(n) => n,
        Err(e) => return bad_request_json(e),
    };

    if num_dives < event.num_dives {
        let highest = DiveEntry::highest_dive_number_in_event(&event.id, &mut *conn)?;
        if highest.is_some_and(|highest| highest > num_dives) {
            return bad_request_json(format!(
                "some competitors already have more than {num_dives} dives \
                 entered"
            ));
        }
    }

    diesel::update(events::table.filter(events::id.eq(&event.id)))
        .set((
            events::name.eq(input.name.trim()),
            events::date.eq(&input.date),
            events::location.eq(&input.location),
            events::description.eq(&input.description),
            events::num_dives.eq(num_dives),
            events::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut *conn)?;

    json_ok(Event::fetch(&event.id, &mut *conn)?)
}

pub async fn delete_event(
    Path(event_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let event = Event::fetch(&event_id, &mut *conn)?;
    diesel::delete(events::table.filter(events::id.eq(&event.id)))
        .execute(&mut *conn)?;

    info!(event = %event.id, "deleted event");

    json_ok(serde_json::json!({ "deleted": event.id }))
}

pub async fn view_event_page(
    Path(event_id): Path<String>,
    user: Option<User>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let event = Event::fetch(&event_id, &mut *conn)?;
    let competition = Competition::fetch(&event.competition_id, &mut *conn)?;
    let competitors = Competitor::of_event(&event.id, &mut *conn)?;
    let entries = DiveEntry::by_competitor_for_event(&event.id, &mut *conn)?;
    let statuses = sheet_statuses(&event.id, &mut *conn)?;

    let actions = [
        (format!("/events/{}/live", event.id), "Live results"),
        (format!("/events/{}/run-order", event.id), "Run order"),
        (format!("/events/{}/judge", event.id), "Judge"),
        (format!("/events/{}/leaderboard.csv", event.id), "Download leaderboard"),
    ];

    success(
        Page::new()
            .user_opt(user)
            .title(event.name.clone())
            .competition(competition)
            .body(maud! {
                h1 { (event.name) }
                p class="text-muted" { (event.num_dives) " dives per competitor" }
                Actions options=(&actions);
                @if competitors.is_empty() {
                    InfoAlert msg = "No competitors have entered this event yet.";
                } @else {
                    table class="table" {
                        thead {
                            tr {
                                th { "Competitor" }
                                th { "Club" }
                                th { "Dives entered" }
                                th { "Dive sheet" }
                            }
                        }
                        tbody {
                            @for competitor in &competitors {
                                @let entered = entries.get(&competitor.id).map(|e| e.len()).unwrap_or(0);
                                @let status = statuses.get(&competitor.id).copied().unwrap_or(SheetStatus::Draft);
                                tr {
                                    td { (competitor.display_name()) }
                                    td { (competitor.club.clone().unwrap_or_default()) }
                                    td { (entered) " / " (event.num_dives) }
                                    td {
                                        @if status == SheetStatus::Submitted {
                                            span class="badge text-bg-success" { "submitted" }
                                        } @else {
                                            span class="badge text-bg-secondary" { "draft" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            })
            .render(),
    )
}
