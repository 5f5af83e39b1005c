use serde_json::{Value, json};

use super::{add_competitor, add_entry, admin, create_event, make_router, score};

#[tokio::test]
async fn scores_flow_into_live_results_and_the_leaderboard() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 5, 1).await;

    let bravo = add_competitor(&admin, &event_id, "Bea", "Bravo").await;
    let alpha = add_competitor(&admin, &event_id, "Al", "Alpha").await;

    // difficulty comes from the FINA table when left out
    let alpha_dive = add_entry(
        &admin,
        &alpha,
        json!({ "dive_number": 1, "fina_code": "105b", "board_height": "3m" }),
    )
    .await;
    assert_eq!(alpha_dive["fina_code"], "105B");
    assert_eq!(alpha_dive["difficulty"], 2.4);
    let alpha_dive = alpha_dive["id"].as_str().unwrap().to_string();

    let bravo_dive = add_entry(
        &admin,
        &bravo,
        json!({
            "dive_number": 1,
            "fina_code": "101A",
            "board_height": "3m",
            "difficulty": 2.0,
        }),
    )
    .await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let live = admin
        .get(&format!("/api/events/{event_id}/live-results"))
        .await
        .json::<Value>();
    assert_eq!(live["status"], "in_progress");
    // live order is by last name, not by creation
    assert_eq!(live["next_entry_id"], alpha_dive.as_str());
    assert_eq!(live["entries"][0]["competitor"]["last_name"], "Alpha");

    for (judge, value) in [7.0, 9.0, 7.0, 9.0, 7.0].into_iter().enumerate() {
        let res = score(&admin, &alpha_dive, judge as i64 + 1, value).await;
        assert_eq!(res.status_code(), 200, "{}", res.text());
    }

    let entry = admin
        .get(&format!("/api/entries/{alpha_dive}/scores"))
        .await
        .json::<Value>();
    assert_eq!(entry["result"]["state"], "complete");
    // sorted [7,7,7,9,9] keeps [7,7,9]
    let final_score = entry["result"]["final_score"].as_f64().unwrap();
    assert!((final_score - 23.0 / 3.0 * 2.4).abs() < 1e-9);

    let live = admin
        .get(&format!("/api/events/{event_id}/live-results"))
        .await
        .json::<Value>();
    assert_eq!(live["next_entry_id"], bravo_dive.as_str());
    assert_eq!(live["entries"][0]["is_complete"], true);
    assert_eq!(live["entries"][1]["is_next"], true);
    assert_eq!(live["entries"][1]["num_scores"], 0);

    for judge in 1..=5 {
        score(&admin, &bravo_dive, judge, 6.0).await;
    }

    let live = admin
        .get(&format!("/api/events/{event_id}/live-results"))
        .await
        .json::<Value>();
    assert_eq!(live["status"], "complete");
    assert!(live["next_entry_id"].is_null());

    let board = admin
        .get(&format!("/api/events/{event_id}/leaderboard"))
        .await
        .json::<Value>();
    assert_eq!(board[0]["position"], 1);
    assert_eq!(board[0]["competitor"]["id"], alpha.as_str());
    assert_eq!(board[1]["competitor"]["id"], bravo.as_str());
    assert_eq!(board[1]["total_score"], 12.0);

    let csv = admin
        .get(&format!("/events/{event_id}/leaderboard.csv"))
        .await
        .text();
    let lines = csv.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "1,Alpha,Al,,1,18.40");
    assert_eq!(lines[2], "2,Bravo,Bea,,1,12.00");

    let completed = admin
        .get(&format!("/api/events/{event_id}/scores"))
        .await
        .json::<Value>();
    assert_eq!(completed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn an_event_without_dives_is_not_complete() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 5, 6).await;
    add_competitor(&admin, &event_id, "Gus", "Golf").await;
    add_competitor(&admin, &event_id, "Hank", "Hotel").await;

    let live = admin
        .get(&format!("/api/events/{event_id}/live-results"))
        .await
        .json::<Value>();
    assert_eq!(live["status"], "no_dives");
    assert!(live["next_entry_id"].is_null());
    assert_eq!(live["entries"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn resubmitting_a_score_replaces_it() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 3, 1).await;
    let diver = add_competitor(&admin, &event_id, "Cy", "Charlie").await;
    let entry = add_entry(
        &admin,
        &diver,
        json!({
            "dive_number": 1,
            "fina_code": "101A",
            "board_height": "1m",
            "difficulty": 2.5,
        }),
    )
    .await["id"]
        .as_str()
        .unwrap()
        .to_string();

    score(&admin, &entry, 1, 8.0).await;
    score(&admin, &entry, 2, 8.5).await;
    score(&admin, &entry, 3, 9.0).await;
    let res = score(&admin, &entry, 3, 6.0).await.json::<Value>();

    assert_eq!(res["scores"].as_array().unwrap().len(), 3);
    assert_eq!(res["scores"][2]["value"], 6.0);
    let final_score = res["result"]["final_score"].as_f64().unwrap();
    assert!((final_score - 18.75).abs() < 1e-9);
}

#[tokio::test]
async fn invalid_scores_are_rejected() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 3, 1).await;
    let diver = add_competitor(&admin, &event_id, "Di", "Delta").await;
    let entry = add_entry(
        &admin,
        &diver,
        json!({ "dive_number": 1, "fina_code": "201A", "board_height": "1m" }),
    )
    .await["id"]
        .as_str()
        .unwrap()
        .to_string();

    assert_eq!(score(&admin, &entry, 1, 7.25).await.status_code(), 400);
    assert_eq!(score(&admin, &entry, 1, 10.5).await.status_code(), 400);
    assert_eq!(score(&admin, &entry, 4, 7.0).await.status_code(), 400);
    assert_eq!(score(&admin, &entry, 0, 7.0).await.status_code(), 400);
    assert_eq!(score(&admin, "no-such-entry", 1, 7.0).await.status_code(), 404);

    let scores = admin
        .get(&format!("/api/entries/{entry}/scores"))
        .await
        .json::<Value>();
    assert_eq!(scores["scores"].as_array().unwrap().len(), 0);
    assert_eq!(scores["result"]["state"], "incomplete");
    assert_eq!(scores["result"]["needed"], 3);
}

#[tokio::test]
async fn judging_form_records_scores() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 3, 1).await;
    let diver = add_competitor(&admin, &event_id, "Ed", "Echo").await;
    let entry = add_entry(
        &admin,
        &diver,
        json!({ "dive_number": 1, "fina_code": "301B", "board_height": "3m" }),
    )
    .await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let page = admin.get(&format!("/events/{event_id}/judge?judge=2")).await;
    assert_eq!(page.status_code(), 200);
    assert!(page.text().contains(&entry));

    let res = admin
        .post(&format!("/events/{event_id}/judge"))
        .form(&[
            ("entry_id", entry.clone()),
            ("judge_number", "2".to_string()),
            ("score", "7.5".to_string()),
        ])
        .await;
    assert!(res.status_code().is_redirection(), "{}", res.text());

    let bad = admin
        .post(&format!("/events/{event_id}/judge"))
        .form(&[
            ("entry_id", entry.clone()),
            ("judge_number", "2".to_string()),
            ("score", "11".to_string()),
        ])
        .await;
    assert_eq!(bad.status_code(), 400);

    let scores = admin
        .get(&format!("/api/entries/{entry}/scores"))
        .await
        .json::<Value>();
    assert_eq!(scores["scores"][0]["judge_number"], 2);
    assert_eq!(scores["scores"][0]["value"], 7.5);
}

#[tokio::test]
async fn live_pages_render() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 5, 2).await;

    let empty = admin.get(&format!("/events/{event_id}/live/fragment")).await;
    assert_eq!(empty.status_code(), 200);
    assert!(empty.text().contains("No dives have been entered"));

    let diver = add_competitor(&admin, &event_id, "Flo", "Foxtrot").await;
    add_entry(
        &admin,
        &diver,
        json!({ "dive_number": 1, "fina_code": "401C", "board_height": "1m" }),
    )
    .await;

    let page = admin.get(&format!("/events/{event_id}/live")).await;
    assert_eq!(page.status_code(), 200);
    let html = page.text();
    assert!(html.contains("every 2s"));
    assert!(html.contains("On deck"));
    assert!(html.contains("Flo Foxtrot"));

    assert_eq!(
        admin
            .get("/events/not-an-event/live")
            .await
            .status_code(),
        404
    );
}
