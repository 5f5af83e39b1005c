use serde_json::{Value, json};

use super::{add_competitor, add_entry, admin, create_event, make_router, score};

#[tokio::test]
async fn submitted_sheets_are_locked_until_reopened() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 5, 3).await;
    let diver = add_competitor(&admin, &event_id, "Ida", "India").await;

    let sheet = admin
        .get(&format!("/api/competitors/{diver}/dive-sheet"))
        .await
        .json::<Value>();
    assert_eq!(sheet["dive_sheet"]["status"], "draft");
    assert_eq!(sheet["entries"].as_array().unwrap().len(), 0);

    let entry = add_entry(
        &admin,
        &diver,
        json!({ "dive_number": 1, "fina_code": "103B", "board_height": "1m" }),
    )
    .await;
    assert_eq!(entry["description"], "Forward 1½ Somersaults Pike");
    let entry_id = entry["id"].as_str().unwrap().to_string();

    let submitted = admin
        .post(&format!("/api/competitors/{diver}/dive-sheet/submit"))
        .await;
    assert_eq!(submitted.status_code(), 200);
    assert_eq!(submitted.json::<Value>()["status"], "submitted");

    let blocked = admin
        .post(&format!("/api/competitors/{diver}/entries"))
        .json(&json!({ "dive_number": 2, "fina_code": "201A", "board_height": "1m" }))
        .await;
    assert_eq!(blocked.status_code(), 400);
    assert_eq!(
        admin
            .delete(&format!("/api/entries/{entry_id}"))
            .await
            .status_code(),
        400
    );

    let reopened = admin
        .post(&format!("/api/competitors/{diver}/dive-sheet/reopen"))
        .await;
    assert_eq!(reopened.json::<Value>()["status"], "draft");

    add_entry(
        &admin,
        &diver,
        json!({ "dive_number": 2, "fina_code": "201A", "board_height": "1m" }),
    )
    .await;

    let sheet = admin
        .get(&format!("/api/competitors/{diver}/dive-sheet"))
        .await
        .json::<Value>();
    let numbers = sheet["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["dive_number"].as_i64().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(numbers, vec![1, 2]);
}

#[tokio::test]
async fn entries_are_checked_against_the_event() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 5, 2).await;
    let diver = add_competitor(&admin, &event_id, "Jo", "Juliet").await;

    let post = |body: Value| {
        admin
            .post(&format!("/api/competitors/{diver}/entries"))
            .json(&body)
    };

    // beyond the number of dives in the event
    let res = post(json!({ "dive_number": 3, "fina_code": "101A", "board_height": "1m" })).await;
    assert_eq!(res.status_code(), 400);

    // not a dive code
    let res = post(json!({ "dive_number": 1, "fina_code": "7XYZ", "board_height": "1m" })).await;
    assert_eq!(res.status_code(), 400);

    // not a board height
    let res = post(json!({ "dive_number": 1, "fina_code": "101A", "board_height": "2m" })).await;
    assert_eq!(res.status_code(), 400);

    // well formed, but not in the table, so a difficulty is needed
    let res = post(json!({ "dive_number": 1, "fina_code": "1999D", "board_height": "1m" })).await;
    assert_eq!(res.status_code(), 400);
    assert!(
        res.json::<Value>()["error"]
            .as_str()
            .unwrap()
            .contains("manually")
    );
    let res = post(json!({
        "dive_number": 1,
        "fina_code": "1999D",
        "board_height": "1m",
        "difficulty": 3.1,
    }))
    .await;
    assert_eq!(res.status_code(), 201);

    // the same dive number twice
    let res = post(json!({ "dive_number": 1, "fina_code": "101A", "board_height": "1m" })).await;
    assert_eq!(res.status_code(), 400);

    let res = post(json!({
        "dive_number": 2,
        "fina_code": "101A",
        "board_height": "1m",
        "difficulty": 5.0,
    }))
    .await;
    assert_eq!(res.status_code(), 400);
}

#[tokio::test]
async fn panel_and_sheet_sizes_cannot_shrink_under_existing_data() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 5, 3).await;
    let diver = add_competitor(&admin, &event_id, "Kit", "Kilo").await;
    let entry = add_entry(
        &admin,
        &diver,
        json!({ "dive_number": 3, "fina_code": "101A", "board_height": "1m" }),
    )
    .await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = admin
        .put(&format!("/api/events/{event_id}"))
        .json(&json!({ "name": "3m Springboard", "num_dives": 2 }))
        .await;
    assert_eq!(res.status_code(), 400);

    assert_eq!(score(&admin, &entry, 5, 7.0).await.status_code(), 200);

    let event = admin
        .get(&format!("/api/events/{event_id}"))
        .await
        .json::<Value>();
    let competition_id = event["competition_id"].as_str().unwrap().to_string();

    let res = admin
        .put(&format!("/api/competitions/{competition_id}"))
        .json(&json!({
            "name": "Summer Open",
            "date": "2025-07-12",
            "location": "Lido",
            "num_judges": 3,
        }))
        .await;
    assert_eq!(res.status_code(), 400);

    let res = admin
        .put(&format!("/api/competitions/{competition_id}"))
        .json(&json!({
            "name": "Summer Open",
            "date": "2025-07-12",
            "location": "Lido",
            "num_judges": 4,
        }))
        .await;
    assert_eq!(res.status_code(), 400);
}

#[tokio::test]
async fn fina_lookup_and_cascading_deletes() {
    let router = make_router().await;
    let admin = admin(&router).await;

    let dive = admin.get("/api/fina/105b/3m").await;
    assert_eq!(dive.status_code(), 200);
    assert_eq!(dive.json::<Value>()["difficulty"], 2.4);
    assert_eq!(admin.get("/api/fina/105B/2m").await.status_code(), 404);

    let event_id = create_event(&admin, 5, 1).await;
    let diver = add_competitor(&admin, &event_id, "Lu", "Lima").await;
    let entry = add_entry(
        &admin,
        &diver,
        json!({ "dive_number": 1, "fina_code": "101A", "board_height": "1m" }),
    )
    .await["id"]
        .as_str()
        .unwrap()
        .to_string();
    score(&admin, &entry, 1, 7.0).await;

    let res = admin.delete(&format!("/api/competitors/{diver}")).await;
    assert_eq!(res.status_code(), 200);

    assert_eq!(
        admin
            .get(&format!("/api/entries/{entry}/scores"))
            .await
            .status_code(),
        404
    );
    let board = admin
        .get(&format!("/api/events/{event_id}/leaderboard"))
        .await
        .json::<Value>();
    assert_eq!(board.as_array().unwrap().len(), 0);
}
