//! End-to-end tests which drive the whole router over HTTP.

use axum::Router;
use axum_test::TestServer;
use serde_json::{Value, json};

use crate::{config::make_app, settings::Settings};

mod judging;
mod permissions;
mod run_order;
mod sheets;

pub const PASSWORD: &str = "hunter22";

pub async fn make_router() -> Router {
    make_app(Settings::for_tests()).await.unwrap()
}

/// A client with its own cookie jar. Several clients can share one router
/// (and so one database).
pub fn client(router: &Router) -> TestServer {
    let mut server = TestServer::new(router.clone()).unwrap();
    server.do_save_cookies();
    server
}

/// Registers (and so logs in) `username`. The first account registered on a
/// router becomes an admin.
pub async fn register(server: &TestServer, username: &str) {
    let res = server
        .post("/register")
        .form(&[
            ("username", username.to_string()),
            ("email", format!("{username}@example.com")),
            ("password", PASSWORD.to_string()),
            ("password2", PASSWORD.to_string()),
        ])
        .await;
    assert!(
        res.status_code().is_redirection(),
        "registering {username} failed: {}",
        res.text()
    );
}

pub async fn admin(router: &Router) -> TestServer {
    let server = client(router);
    register(&server, "admin").await;
    server
}

/// Creates a competition with one event and returns the event id.
pub async fn create_event(
    admin: &TestServer,
    num_judges: i64,
    num_dives: i64,
) -> String {
    let competition = admin
        .post("/api/competitions")
        .json(&json!({
            "name": "Summer Open",
            "date": "2025-07-12",
            "location": "Lido",
            "num_judges": num_judges,
        }))
        .await;
    assert_eq!(competition.status_code(), 201, "{}", competition.text());
    let competition_id = competition.json::<Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let event = admin
        .post(&format!("/api/competitions/{competition_id}/events"))
        .json(&json!({ "name": "3m Springboard", "num_dives": num_dives }))
        .await;
    assert_eq!(event.status_code(), 201, "{}", event.text());
    event.json::<Value>()["id"].as_str().unwrap().to_string()
}

pub async fn add_competitor(
    admin: &TestServer,
    event_id: &str,
    first_name: &str,
    last_name: &str,
) -> String {
    let res = admin
        .post(&format!("/api/events/{event_id}/competitors"))
        .json(&json!({ "first_name": first_name, "last_name": last_name }))
        .await;
    assert_eq!(res.status_code(), 201, "{}", res.text());
    res.json::<Value>()["id"].as_str().unwrap().to_string()
}

pub async fn add_entry(
    admin: &TestServer,
    competitor_id: &str,
    body: Value,
) -> Value {
    let res = admin
        .post(&format!("/api/competitors/{competitor_id}/entries"))
        .json(&body)
        .await;
    assert_eq!(res.status_code(), 201, "{}", res.text());
    res.json::<Value>()
}

pub async fn score(
    judge: &TestServer,
    entry_id: &str,
    judge_number: i64,
    value: f64,
) -> axum_test::TestResponse {
    judge
        .post("/api/scores")
        .json(&json!({
            "entry_id": entry_id,
            "judge_number": judge_number,
            "score": value,
        }))
        .await
}
