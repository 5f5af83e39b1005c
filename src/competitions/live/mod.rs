//! Live results: what is on deck, how each dive scored and who is winning.
//!
//! Every request rebuilds an [`EventSnapshot`] from the database, so a poll
//! always reflects the scores committed before it started and nothing is
//! held between polls.

use std::{collections::HashMap, sync::Arc};

use axum::extract::{Path, State};
use diesel::{connection::LoadConnection, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::Serialize;
use tracing::{debug, error};

use crate::{
    auth::User,
    competitions::{
        Competition,
        competitors::Competitor,
        dives::{DiveEntry, EventEntry},
        events::Event,
        scores::Score,
        scoring::{
            JudgeScore, ScoresByEntry, ScoringError,
            calc::{DiveResult, FinalScore, compute_entry_result, display_score},
            group_scores,
            leaderboard::{Standing, compute_leaderboard},
            next_dive::select_next_dive,
        },
    },
    settings::Settings,
    state::Conn,
    template::Page,
    util_resp::{FailureResponse, StandardResponse, SuccessResponse, json_ok, success},
    widgets::{
        alert::{ErrorAlert, InfoAlert},
        score::{JudgeMarks, ScoreBreakdown},
    },
};

/// An event with all of its competitors, entries and scores.
pub struct EventSnapshot {
    pub event: Event,
    pub competition: Competition,
    pub num_judges: i64,
    /// Ordered by last name, first name, id.
    pub competitors: Vec<Competitor>,
    /// Live order.
    pub entries: Vec<EventEntry>,
    pub entries_by_competitor: HashMap<String, Vec<DiveEntry>>,
    pub scores: ScoresByEntry,
}

impl EventSnapshot {
    #[tracing::instrument(skip(conn))]
    pub fn load(
        event_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Self, FailureResponse> {
        let event = Event::fetch(event_id, conn)?;
        let competition = Competition::fetch(&event.competition_id, conn)?;
        let competitors = Competitor::of_event(&event.id, conn)?;
        let entries = DiveEntry::entries_for_event(&event.id, conn)?;
        let scores = group_scores(&Score::for_event(&event.id, conn)?);

        let mut entries_by_competitor: HashMap<String, Vec<DiveEntry>> =
            HashMap::new();
        for EventEntry { entry, .. } in &entries {
            entries_by_competitor
                .entry(entry.competitor_id.clone())
                .or_default()
                .push(entry.clone());
        }

        debug!(
            event = %event.id,
            competitors = competitors.len(),
            entries = entries.len(),
            "loaded event snapshot"
        );

        Ok(EventSnapshot {
            num_judges: competition.num_judges,
            event,
            competition,
            competitors,
            entries,
            entries_by_competitor,
            scores,
        })
    }

    pub fn competitor(&self, competitor_id: &str) -> Option<&Competitor> {
        self.competitors.iter().find(|c| c.id == competitor_id)
    }

    pub fn marks_of(&self, entry_id: &str) -> &[JudgeScore] {
        self.scores
            .get(entry_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn result_of(
        &self,
        entry: &DiveEntry,
    ) -> Result<DiveResult, ScoringError> {
        compute_entry_result(
            self.marks_of(&entry.id),
            entry.difficulty,
            self.num_judges,
        )
    }

    /// The final score of a competitor's dive, if that dive exists and every
    /// judge has scored it.
    pub fn final_score_of(
        &self,
        competitor_id: &str,
        dive_number: i64,
    ) -> Option<f64> {
        let entry = self
            .entries_by_competitor
            .get(competitor_id)?
            .iter()
            .find(|entry| entry.dive_number == dive_number)?;

        self.result_of(entry).ok()?.final_score()
    }

    pub fn next_entry(&self) -> Option<&EventEntry> {
        select_next_dive(&self.entries, &self.scores, self.num_judges)
    }

    pub fn leaderboard(&self) -> Vec<Standing> {
        compute_leaderboard(
            &self.competitors,
            &self.entries_by_competitor,
            &self.scores,
            self.num_judges,
        )
    }

    pub fn status(&self) -> LiveStatus {
        if self.entries.is_empty() {
            LiveStatus::NoDives
        } else if self.next_entry().is_some() {
            LiveStatus::InProgress
        } else {
            LiveStatus::Complete
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LiveStatus {
    NoDives,
    InProgress,
    Complete,
}

#[derive(Serialize)]
struct LiveEntry<'a> {
    entry: &'a DiveEntry,
    competitor: &'a Competitor,
    num_scores: usize,
    is_complete: bool,
    is_next: bool,
    result: Option<FinalScore>,
    fault: Option<String>,
}

#[derive(Serialize)]
struct LiveResults<'a> {
    event: &'a Event,
    num_judges: i64,
    status: LiveStatus,
    next_entry_id: Option<&'a str>,
    entries: Vec<LiveEntry<'a>>,
}

fn live_results(snapshot: &EventSnapshot) -> LiveResults<'_> {
    let next_entry_id = snapshot.next_entry().map(|next| next.entry.id.as_str());

    let entries = snapshot
        .entries
        .iter()
        .map(|EventEntry { entry, competitor }| {
            let (result, fault) = match snapshot.result_of(entry) {
                Ok(DiveResult::Complete(score)) => (Some(score), None),
                Ok(DiveResult::Incomplete { .. }) => (None, None),
                Err(e) => (None, Some(e.to_string())),
            };

            LiveEntry {
                entry,
                competitor,
                num_scores: snapshot.marks_of(&entry.id).len(),
                is_complete: result.is_some(),
                is_next: next_entry_id == Some(entry.id.as_str()),
                result,
                fault,
            }
        })
        .collect();

    LiveResults {
        event: &snapshot.event,
        num_judges: snapshot.num_judges,
        status: snapshot.status(),
        next_entry_id,
        entries,
    }
}

pub async fn get_live_results(
    Path(event_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let snapshot = EventSnapshot::load(&event_id, &mut *conn)?;
    json_ok(live_results(&snapshot))
}

pub async fn get_leaderboard(
    Path(event_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let snapshot = EventSnapshot::load(&event_id, &mut *conn)?;
    json_ok(snapshot.leaderboard())
}

#[derive(Serialize, Debug, PartialEq)]
pub struct CompletedDive {
    pub competitor_id: String,
    pub dive_number: i64,
    pub final_score: f64,
}

/// Final scores of every completed dive of an event.
pub fn completed_dives(snapshot: &EventSnapshot) -> Vec<CompletedDive> {
    snapshot
        .entries
        .iter()
        .filter_map(|EventEntry { entry, .. }| {
            let final_score = snapshot.result_of(entry).ok()?.final_score()?;
            Some(CompletedDive {
                competitor_id: entry.competitor_id.clone(),
                dive_number: entry.dive_number,
                final_score,
            })
        })
        .collect()
}

pub async fn get_event_scores(
    Path(event_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let snapshot = EventSnapshot::load(&event_id, &mut *conn)?;
    json_ok(completed_dives(&snapshot))
}

#[derive(Serialize)]
struct LeaderboardRow<'a> {
    position: usize,
    last_name: &'a str,
    first_name: &'a str,
    club: &'a str,
    completed_dives: usize,
    total_score: String,
}

pub fn leaderboard_csv(standings: &[Standing]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(vec![]);

    for standing in standings {
        writer.serialize(LeaderboardRow {
            position: standing.position,
            last_name: &standing.competitor.last_name,
            first_name: &standing.competitor.first_name,
            club: standing.competitor.club.as_deref().unwrap_or(""),
            completed_dives: standing.completed_dives,
            total_score: display_score(standing.total_score),
        })?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub async fn download_leaderboard_csv(
    Path(event_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let snapshot = EventSnapshot::load(&event_id, &mut *conn)?;

    let body = leaderboard_csv(&snapshot.leaderboard()).map_err(|e| {
        error!("failed to write leaderboard csv: {e}");
        FailureResponse::ServerError(())
    })?;

    Ok(SuccessResponse::Csv {
        filename: format!("leaderboard-{}.csv", snapshot.event.id),
        body,
    })
}

pub struct StandingsTable<'r> {
    pub standings: &'r [Standing],
}

impl Renderable for StandingsTable<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            table class="table table-striped" {
                thead {
                    tr {
                        th scope="col" { "#" }
                        th scope="col" { "Competitor" }
                        th scope="col" { "Club" }
                        th scope="col" { "Dives" }
                        th scope="col" { "Total" }
                    }
                }
                tbody {
                    @for standing in self.standings {
                        tr {
                            td { (standing.position) }
                            td {
                                (standing.competitor.display_name())
                                @if standing.fault.is_some() {
                                    " "
                                    span class="badge bg-danger" { "score error" }
                                }
                            }
                            td { (standing.competitor.club.as_deref().unwrap_or("")) }
                            td { (standing.completed_dives) }
                            td { strong { (display_score(standing.total_score)) } }
                        }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

/// The part of the live page that is swapped in on every poll.
pub struct LiveFragment<'r> {
    pub snapshot: &'r EventSnapshot,
}

impl LiveFragment<'_> {
    /// The dive before the one on deck, if it has been fully judged.
    fn previous_dive(&self) -> Option<&EventEntry> {
        let snapshot = self.snapshot;
        let next = snapshot.next_entry()?;
        let idx = snapshot
            .entries
            .iter()
            .position(|e| e.entry.id == next.entry.id)?;

        idx.checked_sub(1).map(|prev| &snapshot.entries[prev])
    }
}

impl Renderable for LiveFragment<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let snapshot = self.snapshot;
        let status = snapshot.status();
        let next = snapshot.next_entry();
        let previous = self.previous_dive();
        let standings = snapshot.leaderboard();

        maud! {
            @if status == LiveStatus::NoDives {
                InfoAlert msg = "No dives have been entered for this event yet.";
            }
            @if let Some(EventEntry { entry, competitor }) = next {
                div class="card mb-3 border-primary" {
                    div class="card-header" { "On deck" }
                    div class="card-body" {
                        h3 class="card-title" { (competitor.display_name()) }
                        p class="card-text" {
                            "Dive " (entry.dive_number) ": " (entry.fina_code)
                            @if let Some(description) = &entry.description {
                                " " (description)
                            }
                            " from " (entry.board_height)
                            ", DD " (entry.difficulty)
                        }
                        p class="card-text text-muted" {
                            (snapshot.marks_of(&entry.id).len()) " of "
                            (snapshot.num_judges) " judges have scored"
                        }
                    }
                }
            }
            @if let Some(EventEntry { entry, competitor }) = previous {
                div class="card mb-3" {
                    div class="card-header" {
                        "Last dive: " (competitor.display_name())
                        " (" (entry.fina_code) ")"
                    }
                    div class="card-body" {
                        JudgeMarks
                            marks=(snapshot.marks_of(&entry.id))
                            num_judges=(snapshot.num_judges);
                        @match snapshot.result_of(entry) {
                            Ok(DiveResult::Complete(score)) => {
                                ScoreBreakdown score=(score) difficulty=(entry.difficulty);
                            }
                            Ok(DiveResult::Incomplete { .. }) => {}
                            Err(e) => {
                                ErrorAlert msg=(e);
                            }
                        }
                    }
                }
            }
            @if status == LiveStatus::Complete {
                h2 { "Final standings" }
            } @else {
                h2 { "Standings" }
            }
            StandingsTable standings=(&standings);
        }
        .render_to(buffer);
    }
}

pub async fn live_fragment(
    Path(event_id): Path<String>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let snapshot = EventSnapshot::load(&event_id, &mut *conn)?;
    success(
        LiveFragment {
            snapshot: &snapshot,
        }
        .render(),
    )
}

pub async fn live_page(
    Path(event_id): Path<String>,
    State(settings): State<Arc<Settings>>,
    user: Option<User>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let snapshot = EventSnapshot::load(&event_id, &mut *conn)?;

    let fragment_url = format!("/events/{}/live/fragment", snapshot.event.id);
    let csv_url = format!("/events/{}/leaderboard.csv", snapshot.event.id);
    let trigger = format!("every {}s", settings.live_poll_seconds);

    success(
        Page::new()
            .user_opt(user)
            .title(format!("{} live", snapshot.event.name))
            .competition(snapshot.competition.clone())
            .body(maud! {
                div class="d-flex justify-content-between align-items-center" {
                    h1 { (snapshot.event.name) }
                    a class="btn btn-outline-secondary" href=(csv_url) {
                        "Download results (CSV)"
                    }
                }
                div hx-get=(fragment_url) hx-trigger=(trigger) hx-swap="innerHTML" {
                    LiveFragment snapshot=(&snapshot);
                }
            })
            .render(),
    )
}
