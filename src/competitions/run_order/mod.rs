//! The order competitors dive in within each round.

use std::sync::Arc;

use axum::extract::{Path, State};
use diesel::{
    connection::LoadConnection, dsl::exists, prelude::*, select,
    sqlite::Sqlite,
};
use hypertext::prelude::*;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::User,
    competitions::{
        Competition,
        competitors::Competitor,
        events::Event,
        live::EventSnapshot,
        scoring::{
            calc::display_score,
            next_dive::{RunOrderNext, select_next_dive_in_run_order},
        },
    },
    permission::{Permission, require},
    schema::run_orders,
    settings::Settings,
    state::Conn,
    template::Page,
    util_resp::{
        FailureResponse, StandardResponse, bad_request_json, json_created,
        json_ok, success,
    },
    widgets::alert::InfoAlert,
};

#[derive(Serialize, Deserialize, Queryable, Clone, Debug, PartialEq)]
pub struct RunOrderSlot {
    pub id: String,
    pub event_id: String,
    pub competitor_id: String,
    pub run_position: i64,
}

impl RunOrderSlot {
    /// The stored run order of an event, by position. Empty if none has been
    /// drawn.
    pub fn of_event(
        event_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Vec<Self>, FailureResponse> {
        Ok(run_orders::table
            .filter(run_orders::event_id.eq(event_id))
            .order_by(run_orders::run_position.asc())
            .load::<RunOrderSlot>(conn)?)
    }

    fn exists_for(
        event_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<bool, FailureResponse> {
        Ok(select(exists(
            run_orders::table.filter(run_orders::event_id.eq(event_id)),
        ))
        .get_result::<bool>(conn)?)
    }
}

/// Shuffles the competitors and numbers them from 1.
pub fn draw_positions(
    mut competitor_ids: Vec<String>,
    rng: &mut impl Rng,
) -> Vec<(String, i64)> {
    competitor_ids.shuffle(rng);
    competitor_ids
        .into_iter()
        .zip(1..)
        .collect()
}

#[derive(Serialize)]
struct RunOrderView {
    event_id: String,
    run_order: Vec<RunOrderRow>,
}

#[derive(Serialize)]
struct RunOrderRow {
    run_position: i64,
    competitor: Competitor,
}

fn load_view(
    event: &Event,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<RunOrderView, FailureResponse> {
    let slots = RunOrderSlot::of_event(&event.id, conn)?;
    let competitors = Competitor::of_event(&event.id, conn)?;

    let run_order = slots
        .into_iter()
        .filter_map(|slot| {
            competitors
                .iter()
                .find(|c| c.id == slot.competitor_id)
                .map(|competitor| RunOrderRow {
                    run_position: slot.run_position,
                    competitor: competitor.clone(),
                })
        })
        .collect();

    Ok(RunOrderView {
        event_id: event.id.clone(),
        run_order,
    })
}

pub async fn generate_run_order(
    Path(event_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let event = Event::fetch(&event_id, &mut *conn)?;

    if RunOrderSlot::exists_for(&event.id, &mut *conn)? {
        return bad_request_json(
            "a run order already exists for this event; stop the event to \
             clear it first",
        );
    }

    let competitors = Competitor::of_event(&event.id, &mut *conn)?;
    if competitors.is_empty() {
        return bad_request_json("this event has no competitors");
    }

    let mut rng = ChaCha20Rng::from_os_rng();
    let positions = draw_positions(
        competitors.into_iter().map(|c| c.id).collect(),
        &mut rng,
    );

    for (competitor_id, run_position) in &positions {
        diesel::insert_into(run_orders::table)
            .values((
                run_orders::id.eq(Uuid::now_v7().to_string()),
                run_orders::event_id.eq(&event.id),
                run_orders::competitor_id.eq(competitor_id),
                run_orders::run_position.eq(run_position),
            ))
            .execute(&mut *conn)?;
    }

    info!(event = %event.id, competitors = positions.len(), "drew run order");

    json_created(load_view(&event, &mut *conn)?)
}

pub async fn get_run_order(
    Path(event_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let event = Event::fetch(&event_id, &mut *conn)?;
    json_ok(load_view(&event, &mut *conn)?)
}

/// "Stop event": throws the run order away.
pub async fn delete_run_order(
    Path(event_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
) -> StandardResponse {
    require(&user, Permission::ManageCompetitions)?;

    let event = Event::fetch(&event_id, &mut *conn)?;
    let n = diesel::delete(run_orders::table.filter(run_orders::event_id.eq(&event.id)))
        .execute(&mut *conn)?;

    info!(event = %event.id, removed = n, "cleared run order");

    json_ok(serde_json::json!({ "event_id": event.id, "removed": n }))
}

#[derive(Serialize, Debug)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOrderStatus {
    /// No run order has been drawn yet.
    NotStarted,
    Next {
        round: i64,
        run_position: i64,
        competitor: Competitor,
        entry: crate::competitions::dives::DiveEntry,
    },
    SheetMissing {
        round: i64,
        run_position: i64,
        competitor: Competitor,
    },
    Complete,
}

pub fn run_order_status(
    snapshot: &EventSnapshot,
    run_order: &[RunOrderSlot],
) -> RunOrderStatus {
    if run_order.is_empty() {
        return RunOrderStatus::NotStarted;
    }

    let next = select_next_dive_in_run_order(
        run_order,
        &snapshot.entries_by_competitor,
        &snapshot.scores,
        snapshot.num_judges,
        snapshot.event.num_dives,
    );

    let position_of = |competitor_id: &str| {
        run_order
            .iter()
            .find(|slot| slot.competitor_id == competitor_id)
            .map(|slot| slot.run_position)
            .unwrap_or_default()
    };

    match next {
        None => RunOrderStatus::Complete,
        Some(RunOrderNext::Next { round, entry }) => {
            match snapshot.competitor(&entry.competitor_id) {
                Some(competitor) => RunOrderStatus::Next {
                    round,
                    run_position: position_of(&competitor.id),
                    competitor: competitor.clone(),
                    entry,
                },
                // run order rows cascade with their competitor
                None => RunOrderStatus::NotStarted,
            }
        }
        Some(RunOrderNext::SheetMissing {
            round,
            competitor_id,
        }) => match snapshot.competitor(&competitor_id) {
            Some(competitor) => RunOrderStatus::SheetMissing {
                round,
                run_position: position_of(&competitor_id),
                competitor: competitor.clone(),
            },
            None => RunOrderStatus::NotStarted,
        },
    }
}

pub async fn next_in_run_order(
    Path(event_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let snapshot = EventSnapshot::load(&event_id, &mut *conn)?;
    let run_order = RunOrderSlot::of_event(&snapshot.event.id, &mut *conn)?;

    json_ok(run_order_status(&snapshot, &run_order))
}

/// Competitors in run order against rounds, with each completed dive's final
/// score.
pub struct RunOrderGrid<'r> {
    pub snapshot: &'r EventSnapshot,
    pub run_order: &'r [RunOrderSlot],
}

impl Renderable for RunOrderGrid<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let snapshot = self.snapshot;
        let status = run_order_status(snapshot, self.run_order);
        let rounds = (1..=snapshot.event.num_dives).collect::<Vec<_>>();

        let rows = self
            .run_order
            .iter()
            .filter_map(|slot| {
                snapshot.competitor(&slot.competitor_id).map(|competitor| {
                    let cells = rounds
                        .iter()
                        .map(|round| {
                            snapshot.final_score_of(&competitor.id, *round)
                        })
                        .collect::<Vec<_>>();
                    let total = cells.iter().flatten().sum::<f64>();
                    (slot.run_position, competitor, cells, total)
                })
            })
            .collect::<Vec<_>>();

        let cell_class = |competitor_id: &str, round: i64| match &status {
            RunOrderStatus::Next {
                round: r,
                competitor,
                ..
            }
            | RunOrderStatus::SheetMissing {
                round: r,
                competitor,
                ..
            } if *r == round && competitor.id == competitor_id => {
                "table-primary"
            }
            _ => "",
        };
        let status = &status;

        maud! {
            @match &status {
                RunOrderStatus::NotStarted => {
                    InfoAlert msg = "No run order has been drawn for this event.";
                }
                RunOrderStatus::Complete => {
                    div class="alert alert-success" { "All rounds are complete." }
                }
                RunOrderStatus::Next { round, competitor, entry, .. } => {
                    div class="alert alert-primary" {
                        "Round " (round) ": " strong { (competitor.display_name()) }
                        " - " (entry.fina_code) " from " (entry.board_height)
                        " (DD " (entry.difficulty) ")"
                    }
                }
                RunOrderStatus::SheetMissing { round, competitor, .. } => {
                    div class="alert alert-warning" {
                        "Round " (round) ": waiting for "
                        strong { (competitor.display_name()) }
                        " to enter a dive for this round."
                    }
                }
            }
            @if !rows.is_empty() {
                table class="table table-sm table-bordered" {
                    thead {
                        tr {
                            th { "#" }
                            th { "Competitor" }
                            @for round in &rounds {
                                th { "Dive " (round) }
                            }
                            th { "Total" }
                        }
                    }
                    tbody {
                        @for (position, competitor, cells, total) in &rows {
                            tr {
                                td { (position) }
                                td { (competitor.display_name()) }
                                @for (round, cell) in rounds.iter().zip(cells.iter()) {
                                    td class=(cell_class(&competitor.id, *round)) {
                                        @match cell {
                                            Some(score) => { (display_score(*score)) }
                                            None => { "-" }
                                        }
                                    }
                                }
                                td { strong { (display_score(*total)) } }
                            }
                        }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

pub async fn run_order_grid(
    Path(event_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let snapshot = EventSnapshot::load(&event_id, &mut *conn)?;
    let run_order = RunOrderSlot::of_event(&snapshot.event.id, &mut *conn)?;

    success(
        RunOrderGrid {
            snapshot: &snapshot,
            run_order: &run_order,
        }
        .render(),
    )
}

pub async fn run_order_page(
    Path(event_id): Path<String>,
    State(settings): State<Arc<Settings>>,
    user: Option<User>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let snapshot = EventSnapshot::load(&event_id, &mut *conn)?;
    let run_order = RunOrderSlot::of_event(&snapshot.event.id, &mut *conn)?;
    let competition: Competition = snapshot.competition.clone();
    let grid = RunOrderGrid {
        snapshot: &snapshot,
        run_order: &run_order,
    };

    let trigger = format!("every {}s", settings.live_poll_seconds);
    let fragment = format!("/events/{}/run-order/grid", snapshot.event.id);
    let snapshot = &snapshot;

    success(
        Page::new()
            .user_opt(user)
            .title(format!("{} run order", snapshot.event.name))
            .competition(competition)
            .body(maud! {
                h1 { (snapshot.event.name) " run order" }
                div hx-get=(fragment) hx-trigger=(trigger) hx-swap="innerHTML" {
                    (grid)
                }
            })
            .render(),
    )
}
