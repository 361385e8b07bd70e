mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{authed, spawn_app, test_config, GatewayScript};

#[tokio::test]
async fn test_admin_creates_transporter_with_default_password() {
    let app = spawn_app(GatewayScript::Silent);
    let admin = app.seed_admin().await;

    let created = authed(app.server.post("/api/v1/transporters"), &admin.token)
        .json(&json!({
            "name": "Horizon Express",
            "email": "ops@horizon.rw",
            "phoneNumber": "0788111222",
            "areaOfOperations": ["North", "Kigali"]
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let user = created.json::<Value>()["data"].clone();
    assert_eq!(user["role"], "transporter");
    assert_eq!(user["areaOfOperations"], json!(["North", "Kigali"]));

    let welcome = app.emails.sent_to("ops@horizon.rw");
    assert_eq!(welcome.len(), 1);
    assert!(welcome[0].html.contains(&test_config().default_password));

    app.server
        .post("/api/v1/auth/signin")
        .json(&json!({ "email": "ops@horizon.rw", "password": test_config().default_password }))
        .await
        .assert_status_ok();

    let listed = app.server.get("/api/v1/transporters").await.json::<Value>();
    assert_eq!(listed["results"], 1);
}

#[tokio::test]
async fn test_admin_creates_school_and_plain_accounts() {
    let app = spawn_app(GatewayScript::Silent);
    let admin = app.seed_admin().await;

    authed(app.server.post("/api/v1/schools"), &admin.token)
        .json(&json!({
            "name": "GS Musanze",
            "email": "info@gsmusanze.rw",
            "phoneNumber": "0788333444",
            "password": "school-pass",
            "district": "Musanze",
            "sector": "Muhoza",
            "cell": "Mpenge",
            "village": "Kabaya"
        }))
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(app.emails.sent_to("info@gsmusanze.rw").len(), 1);

    let authority = authed(app.server.post("/api/v1/users"), &admin.token)
        .json(&json!({
            "name": "District Office",
            "email": "district@gov.rw",
            "phoneNumber": "0788555666",
            "role": "authority"
        }))
        .await;
    authority.assert_status(StatusCode::CREATED);
    assert!(app.emails.sent_to("district@gov.rw").is_empty());

    let wrong_endpoint = authed(app.server.post("/api/v1/users"), &admin.token)
        .json(&json!({
            "name": "Sneaky",
            "email": "sneaky@bus.rw",
            "phoneNumber": "0788777888",
            "role": "transporter"
        }))
        .await;
    wrong_endpoint.assert_status(StatusCode::BAD_REQUEST);

    let duplicate = authed(app.server.post("/api/v1/users"), &admin.token)
        .json(&json!({
            "name": "Copy",
            "email": "DISTRICT@gov.rw",
            "phoneNumber": "0788555666"
        }))
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);

    let schools = app.server.get("/api/v1/schools").await.json::<Value>();
    assert_eq!(schools["results"], 1);
    assert_eq!(schools["data"][0]["district"], "Musanze");

    let authorities = authed(
        app.server.get("/api/v1/users").add_query_param("role", "authority"),
        &admin.token,
    )
    .await
    .json::<Value>();
    assert_eq!(authorities["results"], 1);
}

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let app = spawn_app(GatewayScript::Silent);
    let admin = app.seed_admin().await;
    let school = app.seed_school("info@gshuye.rw").await;
    let path = format!("/api/v1/users/{}", school.user.id);

    authed(app.server.get(&path), &school.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    authed(app.server.post("/api/v1/transporters"), &school.token)
        .json(&json!({}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let fetched = authed(app.server.get(&path), &admin.token).await;
    fetched.assert_status_ok();
    assert_eq!(fetched.json::<Value>()["data"]["email"], "info@gshuye.rw");

    authed(app.server.delete(&path), &admin.token)
        .await
        .assert_status_ok();
    authed(app.server.get(&path), &admin.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let logs = authed(app.server.get("/api/v1/activity-logs"), &admin.token)
        .await
        .json::<Value>();
    assert_eq!(logs["results"], 2);
    assert_eq!(logs["data"][0]["status"], "failure");
}
