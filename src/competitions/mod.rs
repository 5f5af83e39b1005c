use axum::{
    Json,
    extract::Path,
};
use chrono::{NaiveDateTime, Utc};
use diesel::{
    connection::LoadConnection, dsl::exists, prelude::*, select,
    sqlite::Sqlite,
};
use hypertext::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::User,
    competitions::events::Event,
    permission::{Permission, require},
    schema::{competitions, dive_entries},
    state::Conn,
    template::Page,
    util_resp::{
        FailureResponse, StandardResponse, bad_request_json, json_created,
        json_ok, success,
    },
    validation::{is_non_empty, is_valid_num_judges},
    widgets::alert::InfoAlert,
};

pub mod competitors;
pub mod dives;
pub mod events;
pub mod live;
pub mod run_order;
pub mod scores;
pub mod scoring;

pub const DEFAULT_NUM_JUDGES: i64 = 5;

#[derive(Serialize, Deserialize, Queryable, Clone, Debug)]
pub struct Competition {
    pub id: String,
    pub name: String,
    pub date: String,
    pub location: String,
    pub description: Option<String>,
    pub num_judges: i64,
    pub created_at: NaiveDateTime,
}

impl Competition {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        competition_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Self, FailureResponse> {
        competitions::table
            .filter(competitions::id.eq(competition_id))
            .first::<Competition>(conn)
            .optional()?
            .ok_or(FailureResponse::NotFound(()))
    }

    /// The size of the judging panel, which every dive of every event in this
    /// competition is scored against.
    pub fn num_judges_of(
        competition_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<i64, FailureResponse> {
        competitions::table
            .filter(competitions::id.eq(competition_id))
            .select(competitions::num_judges)
            .first::<i64>(conn)
            .optional()?
            .ok_or(FailureResponse::NotFound(()))
    }

    pub fn all(
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Vec<Self>, FailureResponse> {
        Ok(competitions::table
            .order_by((competitions::date.desc(), competitions::name.asc()))
            .load::<Competition>(conn)?)
    }

    fn has_scores_above_judge(
        &self,
        judge_number: i64,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<bool, FailureResponse> {
        use crate::schema::{competitors, events, scores};

        Ok(select(exists(
            scores::table
                .inner_join(
                    dive_entries::table
                        .inner_join(competitors::table.inner_join(events::table)),
                )
                .filter(events::competition_id.eq(&self.id))
                .filter(scores::judge_number.gt(judge_number)),
        ))
        .get_result::<bool>(conn)?)
    }
}

#[derive(Deserialize, Debug)]
pub struct CompetitionInput {
    pub name: String,
    pub date: String,
    pub location: String,
    pub description: Option<String>,
    pub num_judges: Option<i64>,
}

impl CompetitionInput {
    /// Returns the judge count to store.
    fn validate(&self) -> Result<i64, String> {
        is_non_empty("name", &self.name)?;
        is_non_empty("date", &self.date)?;
        is_non_empty("location", &self.location)?;
        let num_judges = self.num_judges.unwrap_or(DEFAULT_NUM_JUDGES);
        is_valid_num_judges(num_judges)?;
        Ok(num_judges)
    }
}

pub async fn list_competitions(mut conn: Conn<false>) -> StandardResponse {
    json_ok(Competition::all(&mut *conn)?)
}

pub async fn get_competition(
    Path(competition_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    json_ok(Competition::fetch(&competition_id, &mut *conn)?)
}

pub async fn create_competition(
    user: User,
    mut conn: Conn<true>,
    Json(input): Json<CompetitionInput>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let num_judges = match input.validate() {
        Ok(n) => n,
        Err(e) => return bad_request_json(e),
    };

    let id = Uuid::now_v7().to_string();
    diesel::insert_into(competitions::table)
        .values((
            competitions::id.eq(&id),
            competitions::name.eq(input.name.trim()),
            competitions::date.eq(&input.date),
            competitions::location.eq(&input.location),
            competitions::description.eq(&input.description),
            competitions::num_judges.eq(num_judges),
            competitions::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut *conn)?;

    info!(competition = %id, num_judges, "created competition");

    json_created(Competition::fetch(&id, &mut *conn)?)
}

pub async fn update_competition(
    Path(competition_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
    Json(input): Json<CompetitionInput>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let competition = Competition::fetch(&competition_id, &mut *conn)?;

    let num_judges = match input.validate() {
        Ok(n) => n,
        Err(e) => return bad_request_json(e),
    };

    if num_judges < competition.num_judges
        && competition.has_scores_above_judge(num_judges, &mut *conn)?
    {
        return bad_request_json(format!(
            "judges above number {num_judges} have already scored dives in \
             this competition"
        ));
    }

    diesel::update(competitions::table.filter(competitions::id.eq(&competition.id)))
        .set((
            competitions::name.eq(input.name.trim()),
            competitions::date.eq(&input.date),
            competitions::location.eq(&input.location),
            competitions::description.eq(&input.description),
            competitions::num_judges.eq(num_judges),
        ))
        .execute(&mut *conn)?;

    json_ok(Competition::fetch(&competition.id, &mut *conn)?)
}

pub async fn delete_competition(
    Path(competition_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let competition = Competition::fetch(&competition_id, &mut *conn)?;

    diesel::delete(competitions::table.filter(competitions::id.eq(&competition.id)))
        .execute(&mut *conn)?;

    info!(competition = %competition.id, "deleted competition");

    json_ok(serde_json::json!({ "deleted": competition.id }))
}

pub async fn view_competition_page(
    Path(competition_id): Path<String>,
    user: Option<User>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let competition = Competition::fetch(&competition_id, &mut *conn)?;
    let events = Event::of_competition(&competition.id, &mut *conn)?;

    let can_judge = user
        .as_ref()
        .map(|user| user.role().allows(Permission::SubmitScores))
        .unwrap_or(false);

    success(
        Page::new()
            .user_opt(user)
            .title(competition.name.clone())
            .competition(competition.clone())
            .body(maud! {
                h1 { (competition.name) }
                p class="text-muted" {
                    (competition.date) " · " (competition.location) " · "
                    (competition.num_judges) " judges"
                }
                @if let Some(description) = &competition.description {
                    p { (description) }
                }
                h2 class="mt-4" { "Events" }
                @if events.is_empty() {
                    InfoAlert msg = "No events have been added yet.";
                } @else {
                    table class="table" {
                        thead {
                            tr {
                                th { "Event" }
                                th { "Dives" }
                                th { "" }
                            }
                        }
                        tbody {
                            @for event in &events {
                                tr {
                                    td {
                                        a href=(format!("/events/{}", event.id)) { (event.name) }
                                    }
                                    td { (event.num_dives) }
                                    td {
                                        a class="btn btn-sm btn-outline-primary me-1" href=(format!("/events/{}/live", event.id)) { "Live" }
                                        a class="btn btn-sm btn-outline-primary me-1" href=(format!("/events/{}/run-order", event.id)) { "Run order" }
                                        @if can_judge {
                                            a class="btn btn-sm btn-outline-secondary" href=(format!("/events/{}/judge", event.id)) { "Judge" }
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

pub async fn home(user: Option<User>, mut conn: Conn<false>) -> StandardResponse {
    let competitions = Competition::all(&mut *conn)?;

    success(
        Page::new()
            .user_opt(user)
            .body(maud! {
                h1 { "Competitions" }
                @if competitions.is_empty() {
                    InfoAlert msg = "There are no competitions yet.";
                } @else {
                    div class="list-group" {
                        @for competition in &competitions {
                            a class="list-group-item list-group-item-action"
                              href=(format!("/competitions/{}", competition.id)) {
                                strong { (competition.name) }
                                " "
                                span class="text-muted" {
                                    (competition.date) ", " (competition.location)
                                }
                            }
                        }
                    }
                }
            })
            .render(),
    )
}
