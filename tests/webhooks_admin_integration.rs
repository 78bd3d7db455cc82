//! Integration tests for the payment webhook and the admin endpoints

mod common;

use common::{assert_unauthorized, spawn_app, spawn_app_with, test_settings, TestApp, API_KEY, PASSWORD};
use serde_json::{json, Value};

async fn send_webhook(app: &TestApp, authorization: Option<&str>, body: Value) -> reqwest::Response {
    let mut request = app.client.post(app.url("/api/webhooks")).json(&body);
    if let Some(value) = authorization {
        request = request.header("Authorization", value);
    }
    request.send().await.expect("Failed to execute request.")
}

fn upgrade_event(user_id: &str) -> Value {
    json!({ "event": "user.upgraded", "data": { "user_id": user_id } })
}

// --- Webhook Tests ---

#[tokio::test]
async fn webhook_upgrades_user() {
    let app = spawn_app();
    let session = app.signed_in_user("walt@breakingbad.com").await;
    let user_id = session["id"].as_str().unwrap();

    let response = send_webhook(
        &app,
        Some(&format!("ApiKey {}", API_KEY)),
        upgrade_event(user_id),
    )
    .await;
    assert_eq!(204, response.status().as_u16());

    let login: Value = app
        .login("walt@breakingbad.com", PASSWORD)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(login["is_premium"], true);
}

#[tokio::test]
async fn webhook_requires_the_api_key() {
    let app = spawn_app();
    let session = app.signed_in_user("walt@breakingbad.com").await;
    let event = upgrade_event(session["id"].as_str().unwrap());

    assert_unauthorized(send_webhook(&app, None, event.clone()).await).await;
    assert_unauthorized(send_webhook(&app, Some("ApiKey wrong-key"), event.clone()).await).await;
    assert_unauthorized(
        send_webhook(&app, Some(&format!("Bearer {}", API_KEY)), event.clone()).await,
    )
    .await;
}

#[tokio::test]
async fn webhook_ignores_other_events() {
    let app = spawn_app();

    let response = send_webhook(
        &app,
        Some(&format!("apikey {}", API_KEY)),
        json!({ "event": "user.payment_failed", "data": { "user_id": "whatever" } }),
    )
    .await;
    assert_eq!(204, response.status().as_u16());
}

#[tokio::test]
async fn webhook_reports_unknown_and_malformed_users() {
    let app = spawn_app();
    let key = format!("ApiKey {}", API_KEY);

    let unknown = send_webhook(&app, Some(&key), upgrade_event(&uuid::Uuid::new_v4().to_string())).await;
    assert_eq!(404, unknown.status().as_u16());

    let malformed = send_webhook(&app, Some(&key), upgrade_event("not-a-uuid")).await;
    assert_eq!(400, malformed.status().as_u16());
}

// --- Admin Tests ---

#[tokio::test]
async fn metrics_counts_static_file_hits() {
    let app = spawn_app();

    for _ in 0..2 {
        let response = app.client.get(app.url("/app/")).send().await.unwrap();
        assert_eq!(200, response.status().as_u16());
    }
    // not counted
    app.client.get(app.url("/api/healthz")).send().await.unwrap();

    let response = app.client.get(app.url("/admin/metrics")).send().await.unwrap();
    assert_eq!(200, response.status().as_u16());
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(response.text().await.unwrap().contains("visited 2 times"));
}

#[tokio::test]
async fn reset_clears_hits_and_users_on_dev() {
    let app = spawn_app();
    app.signed_in_user("walt@breakingbad.com").await;
    app.client.get(app.url("/app/")).send().await.unwrap();

    let response = app.client.post(app.url("/admin/reset")).send().await.unwrap();
    assert_eq!(200, response.status().as_u16());

    let metrics = app.client.get(app.url("/admin/metrics")).send().await.unwrap();
    assert!(metrics.text().await.unwrap().contains("visited 0 times"));
    assert_unauthorized(app.login("walt@breakingbad.com", PASSWORD).await).await;
}

#[tokio::test]
async fn reset_is_forbidden_outside_dev() {
    let app = spawn_app_with(test_settings("production"));
    app.signed_in_user("walt@breakingbad.com").await;

    let response = app.client.post(app.url("/admin/reset")).send().await.unwrap();
    assert_eq!(403, response.status().as_u16());

    assert_eq!(200, app.login("walt@breakingbad.com", PASSWORD).await.status().as_u16());
}
