use axum::{
    Form, Json,
    extract::{Path, Query},
    response::Redirect,
};
use chrono::{NaiveDateTime, Utc};
use diesel::{
    connection::LoadConnection, prelude::*, sqlite::Sqlite, upsert::excluded,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::User,
    competitions::{
        competitors::Competitor,
        dives::DiveEntry,
        events::Event,
        scoring::{
            JudgeScore,
            calc::{DiveResult, compute_entry_result},
        },
    },
    permission::{Permission, require},
    schema::{competitors, dive_entries, scores},
    state::Conn,
    util_resp::{
        FailureResponse, StandardResponse, bad_request_json, json_ok,
        see_other_ok,
    },
    validation::is_valid_score,
};

pub mod judge;

#[derive(Serialize, Deserialize, Queryable, Clone, Debug, PartialEq)]
pub struct Score {
    pub id: String,
    pub entry_id: String,
    pub judge_number: i64,
    pub value: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Score {
    pub fn for_entry(
        entry_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Vec<Self>, FailureResponse> {
        Ok(scores::table
            .filter(scores::entry_id.eq(entry_id))
            .order_by(scores::judge_number.asc())
            .load::<Score>(conn)?)
    }

    /// Every score given in an event, in one query.
    pub fn for_event(
        event_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Vec<Self>, FailureResponse> {
        Ok(scores::table
            .inner_join(dive_entries::table.inner_join(competitors::table))
            .filter(competitors::event_id.eq(event_id))
            .order_by((scores::entry_id.asc(), scores::judge_number.asc()))
            .select(scores::all_columns)
            .load::<Score>(conn)?)
    }
}

/// Everything needed to judge one dive entry.
pub struct EntryContext {
    pub entry: DiveEntry,
    pub competitor: Competitor,
    pub event: Event,
    pub num_judges: i64,
}

impl EntryContext {
    #[tracing::instrument(skip(conn))]
    pub fn load(
        entry_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Self, FailureResponse> {
        let entry = DiveEntry::fetch(entry_id, conn)?;
        let competitor = Competitor::fetch(&entry.competitor_id, conn)?;
        let event = Event::fetch(&competitor.event_id, conn)?;
        let num_judges = event.num_judges(conn)?;

        Ok(EntryContext {
            entry,
            competitor,
            event,
            num_judges,
        })
    }

    pub fn check_submission(
        &self,
        judge_number: i64,
        value: f64,
    ) -> Result<(), String> {
        if !(1..=self.num_judges).contains(&judge_number) {
            return Err(format!(
                "judge number must be between 1 and {}",
                self.num_judges
            ));
        }
        is_valid_score(value)
    }
}

/// Stores a judge's mark for a dive. A second submission from the same judge
/// replaces the first.
pub fn upsert_score(
    entry_id: &str,
    judge_number: i64,
    value: f64,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(), FailureResponse> {
    let now = Utc::now().naive_utc();

    diesel::insert_into(scores::table)
        .values((
            scores::id.eq(Uuid::now_v7().to_string()),
            scores::entry_id.eq(entry_id),
            scores::judge_number.eq(judge_number),
            scores::value.eq(value),
            scores::created_at.eq(now),
            scores::updated_at.eq(now),
        ))
        .on_conflict((scores::entry_id, scores::judge_number))
        .do_update()
        .set((
            scores::value.eq(excluded(scores::value)),
            scores::updated_at.eq(excluded(scores::updated_at)),
        ))
        .execute(conn)?;

    info!(entry = entry_id, judge_number, value, "recorded score");

    Ok(())
}

#[derive(Deserialize, Debug)]
pub struct ScoreSubmission {
    pub entry_id: String,
    pub judge_number: i64,
    pub score: f64,
}

#[derive(Serialize)]
pub struct EntryScores {
    pub entry: DiveEntry,
    pub num_judges: i64,
    pub scores: Vec<Score>,
    pub result: Option<DiveResult>,
    /// Set when the stored scores cannot be turned into a result.
    pub fault: Option<String>,
}

impl EntryScores {
    pub fn load(
        context: EntryContext,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Self, FailureResponse> {
        let scores = Score::for_entry(&context.entry.id, conn)?;
        let marks = scores.iter().map(JudgeScore::from).collect::<Vec<_>>();

        let (result, fault) = match compute_entry_result(
            &marks,
            context.entry.difficulty,
            context.num_judges,
        ) {
            Ok(result) => (Some(result), None),
            Err(e) => {
                tracing::warn!(entry = %context.entry.id, "{e}");
                (None, Some(e.to_string()))
            }
        };

        Ok(EntryScores {
            entry: context.entry,
            num_judges: context.num_judges,
            scores,
            result,
            fault,
        })
    }
}

pub async fn submit_score(
    user: User,
    mut conn: Conn<true>,
    Json(submission): Json<ScoreSubmission>,
) -> StandardResponse {
    require(&user, Permission::SubmitScores)?;

    let context = EntryContext::load(&submission.entry_id, &mut *conn)?;
    if let Err(e) =
        context.check_submission(submission.judge_number, submission.score)
    {
        return bad_request_json(e);
    }

    upsert_score(
        &context.entry.id,
        submission.judge_number,
        submission.score,
        &mut *conn,
    )?;

    json_ok(EntryScores::load(context, &mut *conn)?)
}

pub async fn entry_scores(
    Path(entry_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let context = EntryContext::load(&entry_id, &mut *conn)?;
    json_ok(EntryScores::load(context, &mut *conn)?)
}

#[derive(Deserialize, Debug)]
pub struct ScoreForm {
    pub entry_id: String,
    pub judge_number: i64,
    pub score: f64,
}

#[derive(Deserialize, Debug)]
pub struct JudgeParam {
    pub judge: Option<i64>,
}

/// Form target of the judging page.
pub async fn do_submit_score_form(
    Path(event_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
    Form(form): Form<ScoreForm>,
) -> StandardResponse {
    require(&user, Permission::SubmitScores)?;

    let context = EntryContext::load(&form.entry_id, &mut *conn)?;
    if context.event.id != event_id {
        return Err(FailureResponse::NotFound(()));
    }

    if let Err(e) = context.check_submission(form.judge_number, form.score) {
        return judge::judging_page_with_error(
            context.event,
            user,
            form.judge_number,
            e,
            &mut *conn,
        );
    }

    upsert_score(&context.entry.id, form.judge_number, form.score, &mut *conn)?;

    see_other_ok(Redirect::to(&format!(
        "/events/{}/judge?judge={}",
        event_id, form.judge_number
    )))
}

pub async fn judging_page(
    Path(event_id): Path<String>,
    Query(params): Query<JudgeParam>,
    user: User,
    mut conn: Conn<false>,
) -> StandardResponse {
    require(&user, Permission::SubmitScores)?;

    let event = Event::fetch(&event_id, &mut *conn)?;
    judge::render_judging_page(event, user, params.judge, None, &mut *conn)
}
