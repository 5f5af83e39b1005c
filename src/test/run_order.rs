use serde_json::{Value, json};

use super::{add_competitor, add_entry, admin, create_event, make_router, score};

#[tokio::test]
async fn run_order_walks_round_by_round() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 3, 2).await;

    let mut entries = vec![];
    for (first, last) in [("Mo", "Mike"), ("Ned", "November")] {
        let diver = add_competitor(&admin, &event_id, first, last).await;
        for dive_number in 1..=2 {
            let entry = add_entry(
                &admin,
                &diver,
                json!({
                    "dive_number": dive_number,
                    "fina_code": "101A",
                    "board_height": "1m",
                }),
            )
            .await;
            entries.push(entry);
        }
    }

    let next = admin
        .get(&format!("/api/events/{event_id}/run-order/next"))
        .await
        .json::<Value>();
    assert_eq!(next["status"], "not_started");

    let drawn = admin
        .post(&format!("/api/events/{event_id}/run-order"))
        .await;
    assert_eq!(drawn.status_code(), 201, "{}", drawn.text());
    let order = drawn.json::<Value>()["run_order"].as_array().unwrap().clone();
    assert_eq!(order.len(), 2);
    assert_eq!(order[0]["run_position"], 1);
    assert_eq!(order[1]["run_position"], 2);

    let again = admin
        .post(&format!("/api/events/{event_id}/run-order"))
        .await;
    assert_eq!(again.status_code(), 400);

    let first = order[0]["competitor"]["id"].as_str().unwrap().to_string();
    let second = order[1]["competitor"]["id"].as_str().unwrap().to_string();
    let entry_of = |competitor: &str, dive_number: i64| {
        entries
            .iter()
            .find(|e| {
                e["competitor_id"] == competitor && e["dive_number"] == dive_number
            })
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    };

    let next = admin
        .get(&format!("/api/events/{event_id}/run-order/next"))
        .await
        .json::<Value>();
    assert_eq!(next["status"], "next");
    assert_eq!(next["round"], 1);
    assert_eq!(next["entry"]["id"], entry_of(&first, 1).as_str());

    // the first diver's second dive does not jump the queue
    for judge in 1..=3 {
        score(&admin, &entry_of(&first, 1), judge, 7.0).await;
        score(&admin, &entry_of(&first, 2), judge, 7.0).await;
    }
    let next = admin
        .get(&format!("/api/events/{event_id}/run-order/next"))
        .await
        .json::<Value>();
    assert_eq!(next["round"], 1);
    assert_eq!(next["competitor"]["id"], second.as_str());

    for judge in 1..=3 {
        score(&admin, &entry_of(&second, 1), judge, 7.0).await;
    }
    let next = admin
        .get(&format!("/api/events/{event_id}/run-order/next"))
        .await
        .json::<Value>();
    assert_eq!(next["round"], 2);
    assert_eq!(next["entry"]["id"], entry_of(&second, 2).as_str());

    let grid = admin.get(&format!("/events/{event_id}/run-order/grid")).await;
    assert_eq!(grid.status_code(), 200);
    assert!(grid.text().contains("16.80"));

    let cleared = admin
        .delete(&format!("/api/events/{event_id}/run-order"))
        .await;
    assert_eq!(cleared.json::<Value>()["removed"], 2);
    let stored = admin
        .get(&format!("/api/events/{event_id}/run-order"))
        .await
        .json::<Value>();
    assert_eq!(stored["run_order"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn a_missing_dive_holds_up_the_round() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 3, 1).await;
    let diver = add_competitor(&admin, &event_id, "Oz", "Oscar").await;

    admin
        .post(&format!("/api/events/{event_id}/run-order"))
        .await;

    let next = admin
        .get(&format!("/api/events/{event_id}/run-order/next"))
        .await
        .json::<Value>();
    assert_eq!(next["status"], "sheet_missing");
    assert_eq!(next["round"], 1);
    assert_eq!(next["competitor"]["id"], diver.as_str());

    let page = admin.get(&format!("/events/{event_id}/run-order")).await;
    assert_eq!(page.status_code(), 200);
    assert!(page.text().contains("waiting for"));
}

#[tokio::test]
async fn run_orders_need_competitors() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 5, 6).await;

    let res = admin
        .post(&format!("/api/events/{event_id}/run-order"))
        .await;
    assert_eq!(res.status_code(), 400);
}
