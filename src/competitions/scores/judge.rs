//! The judging page: one judge's view of every dive of an event.

use diesel::{connection::LoadConnection, sqlite::Sqlite};
use hypertext::{Rendered, prelude::*};

use crate::{
    auth::User,
    competitions::{dives::EventEntry, events::Event, live::EventSnapshot},
    template::Page,
    util_resp::{FailureResponse, StandardResponse, bad_request, success},
    widgets::alert::{ErrorAlert, InfoAlert},
};

struct JudgePicker<'r> {
    event_id: &'r str,
    num_judges: i64,
    selected: Option<i64>,
}

impl Renderable for JudgePicker<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            div class="btn-group mb-3" role="group" {
                @for judge in 1..=self.num_judges {
                    a href=(format!("/events/{}/judge?judge={judge}", self.event_id))
                      class=(if self.selected == Some(judge) {
                          "btn btn-primary"
                      } else {
                          "btn btn-outline-primary"
                      }) {
                        "Judge " (judge)
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

struct ScoringTable<'r> {
    snapshot: &'r EventSnapshot,
    judge: i64,
}

impl Renderable for ScoringTable<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let snapshot = self.snapshot;
        let next_id = snapshot.next_entry().map(|next| next.entry.id.clone());
        let action = format!("/events/{}/judge", snapshot.event.id);

        let my_mark = |entry_id: &str| {
            snapshot
                .marks_of(entry_id)
                .iter()
                .find(|mark| mark.judge_number == self.judge)
                .map(|mark| mark.value)
        };

        maud! {
            table class="table align-middle" {
                thead {
                    tr {
                        th scope="col" { "Competitor" }
                        th scope="col" { "Dive" }
                        th scope="col" { "Code" }
                        th scope="col" { "Height" }
                        th scope="col" { "DD" }
                        th scope="col" { "Your score" }
                    }
                }
                tbody {
                    @for EventEntry { entry, competitor } in &snapshot.entries {
                        @let existing = my_mark(&entry.id);
                        tr class=(if next_id.as_deref() == Some(entry.id.as_str()) { "table-primary" } else { "" }) {
                            td { (competitor.display_name()) }
                            td { (entry.dive_number) }
                            td { (entry.fina_code) }
                            td { (entry.board_height) }
                            td { (entry.difficulty) }
                            td {
                                form method="post" action=(&action) class="d-flex gap-2" {
                                    input type="hidden" name="entry_id" value=(entry.id);
                                    input type="hidden" name="judge_number" value=(self.judge);
                                    @if let Some(value) = existing {
                                        input type="number" class="form-control form-control-sm"
                                            name="score" min="0" max="10" step="0.5"
                                            value=(value) required;
                                        button type="submit" class="btn btn-sm btn-outline-primary" {
                                            "Update"
                                        }
                                    } @else {
                                        input type="number" class="form-control form-control-sm"
                                            name="score" min="0" max="10" step="0.5"
                                            required;
                                        button type="submit" class="btn btn-sm btn-primary" {
                                            "Submit"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

fn judging_view(
    event: Event,
    user: User,
    judge: Option<i64>,
    error: Option<String>,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Rendered<String>, FailureResponse> {
    let snapshot = EventSnapshot::load(&event.id, conn)?;
    let judge = judge.filter(|j| (1..=snapshot.num_judges).contains(j));

    Ok(Page::new()
        .user(user)
        .title(format!("Judge {}", snapshot.event.name))
        .competition(snapshot.competition.clone())
        .body(maud! {
            h1 { "Judging: " (snapshot.event.name) }
            @if let Some(error) = &error {
                ErrorAlert msg=(error);
            }
            JudgePicker
                event_id=(&snapshot.event.id)
                num_judges=(snapshot.num_judges)
                selected=(judge);
            @match judge {
                None => {
                    InfoAlert msg = "Choose your judge number to start scoring.";
                }
                Some(_) if snapshot.entries.is_empty() => {
                    InfoAlert msg = "No dives have been entered for this event yet.";
                }
                Some(judge) => {
                    ScoringTable snapshot=(&snapshot) judge=(judge);
                }
            }
        })
        .render())
}

pub fn render_judging_page(
    event: Event,
    user: User,
    judge: Option<i64>,
    error: Option<String>,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> StandardResponse {
    success(judging_view(event, user, judge, error, conn)?)
}

/// Re-renders the judging page with a message after a rejected submission.
pub fn judging_page_with_error(
    event: Event,
    user: User,
    judge_number: i64,
    error: String,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> StandardResponse {
    bad_request(judging_view(
        event,
        user,
        Some(judge_number),
        Some(error),
        conn,
    )?)
}
