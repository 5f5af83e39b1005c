use serde_json::{Value, json};

use super::{
    add_competitor, add_entry, admin, client, create_event, make_router,
    register, score,
};

#[tokio::test]
async fn anonymous_users_can_read_but_not_write() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 5, 6).await;

    let anonymous = client(&router);
    assert_eq!(
        anonymous
            .get(&format!("/api/events/{event_id}/leaderboard"))
            .await
            .status_code(),
        200
    );
    assert_eq!(anonymous.get("/api/competitions").await.status_code(), 200);

    let res = anonymous
        .post("/api/competitions")
        .json(&json!({ "name": "x", "date": "2025-01-01", "location": "y" }))
        .await;
    assert_eq!(res.status_code(), 401);
    assert!(res.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn viewers_cannot_manage_or_score() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 3, 1).await;
    let diver = add_competitor(&admin, &event_id, "Gil", "Golf").await;
    let entry = add_entry(
        &admin,
        &diver,
        json!({ "dive_number": 1, "fina_code": "101A", "board_height": "1m" }),
    )
    .await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let viewer = client(&router);
    register(&viewer, "viewer").await;

    assert_eq!(score(&viewer, &entry, 1, 7.0).await.status_code(), 403);
    assert_eq!(
        viewer
            .post(&format!("/api/events/{event_id}/competitors"))
            .json(&json!({ "first_name": "A", "last_name": "B" }))
            .await
            .status_code(),
        403
    );
    assert_eq!(viewer.get("/api/users").await.status_code(), 403);
    assert_eq!(
        viewer
            .get(&format!("/events/{event_id}/judge"))
            .await
            .status_code(),
        403
    );
}

#[tokio::test]
async fn admins_promote_judges_but_not_themselves() {
    let router = make_router().await;
    let admin = admin(&router).await;
    let event_id = create_event(&admin, 3, 1).await;
    let diver = add_competitor(&admin, &event_id, "Hal", "Hotel").await;
    let entry = add_entry(
        &admin,
        &diver,
        json!({ "dive_number": 1, "fina_code": "101A", "board_height": "1m" }),
    )
    .await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let judge = client(&router);
    register(&judge, "judge").await;

    let users = admin.get("/api/users").await.json::<Value>();
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
    let find = |name: &str| {
        users
            .iter()
            .find(|u| u["username"] == name)
            .unwrap()
            .clone()
    };
    assert_eq!(find("admin")["role"], "admin");
    assert_eq!(find("judge")["role"], "viewer");

    let admin_id = find("admin")["id"].as_str().unwrap().to_string();
    let judge_id = find("judge")["id"].as_str().unwrap().to_string();

    let own = admin
        .put(&format!("/api/users/{admin_id}/role"))
        .json(&json!({ "role": "viewer" }))
        .await;
    assert_eq!(own.status_code(), 400);

    let unknown = admin
        .put(&format!("/api/users/{judge_id}/role"))
        .json(&json!({ "role": "referee" }))
        .await;
    assert_eq!(unknown.status_code(), 400);

    let promoted = admin
        .put(&format!("/api/users/{judge_id}/role"))
        .json(&json!({ "role": "judge" }))
        .await;
    assert_eq!(promoted.status_code(), 200, "{}", promoted.text());
    assert_eq!(promoted.json::<Value>()["role"], "judge");

    assert_eq!(score(&judge, &entry, 2, 7.0).await.status_code(), 200);

    // judges still cannot manage the competition
    assert_eq!(
        judge
            .delete(&format!("/api/events/{event_id}"))
            .await
            .status_code(),
        403
    );
}

#[tokio::test]
async fn logging_out_and_back_in() {
    let router = make_router().await;
    let admin = admin(&router).await;

    let res = admin.post("/logout").await;
    assert!(res.status_code().is_redirection());
    assert_eq!(admin.get("/api/users").await.status_code(), 401);

    let wrong = admin
        .post("/login")
        .form(&[("id", "admin"), ("password", "wrong password")])
        .await;
    assert_eq!(wrong.status_code(), 400);

    let res = admin
        .post("/login")
        .form(&[("id", "admin@example.com"), ("password", super::PASSWORD)])
        .await;
    assert!(res.status_code().is_redirection());
    assert_eq!(admin.get("/api/users").await.status_code(), 200);
}
