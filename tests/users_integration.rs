//! Integration tests for account creation and update

mod common;

use common::{assert_unauthorized, spawn_app, PASSWORD};
use serde_json::{json, Value};

#[tokio::test]
async fn create_user_returns_201_without_password_hash() {
    let app = spawn_app();

    let response = app.create_user("walt@breakingbad.com", PASSWORD).await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], "walt@breakingbad.com");
    assert_eq!(body["is_premium"], false);
    assert!(uuid::Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
    assert_eq!(body["created_at"], body["updated_at"]);
    assert!(body.get("hashed_password").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn create_user_returns_409_for_duplicate_email() {
    let app = spawn_app();

    assert_eq!(201, app.create_user("walt@breakingbad.com", PASSWORD).await.status().as_u16());
    assert_eq!(409, app.create_user("walt@breakingbad.com", PASSWORD).await.status().as_u16());
}

#[tokio::test]
async fn create_user_returns_400_for_invalid_input() {
    let app = spawn_app();

    let cases = vec![
        ("notanemail", PASSWORD, "invalid email"),
        ("user@", PASSWORD, "invalid email"),
        ("", PASSWORD, "empty email"),
        ("walt@breakingbad.com", "", "empty password"),
        ("walt@breakingbad.com", "short", "short password"),
    ];

    for (email, password, description) in cases {
        let response = app.create_user(email, password).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for {}.",
            description
        );
    }
}

#[tokio::test]
async fn update_user_changes_credentials() {
    let app = spawn_app();
    let session = app.signed_in_user("walt@breakingbad.com").await;
    app.clock.advance(chrono::Duration::seconds(5));

    let response = app
        .client
        .put(app.url("/api/users"))
        .bearer_auth(session["access_token"].as_str().unwrap())
        .json(&json!({ "email": "heisenberg@breakingbad.com", "password": "say-my-name" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], session["id"]);
    assert_eq!(body["email"], "heisenberg@breakingbad.com");
    assert_ne!(body["updated_at"], session["updated_at"]);

    assert_eq!(
        200,
        app.login("heisenberg@breakingbad.com", "say-my-name").await.status().as_u16()
    );
    assert_unauthorized(app.login("walt@breakingbad.com", PASSWORD).await).await;
}

#[tokio::test]
async fn update_user_rejects_empty_fields() {
    let app = spawn_app();
    let session = app.signed_in_user("walt@breakingbad.com").await;
    let access_token = session["access_token"].as_str().unwrap();

    for body in [
        json!({ "email": "walt@breakingbad.com", "password": "" }),
        json!({ "email": "", "password": PASSWORD }),
    ] {
        let response = app
            .client
            .put(app.url("/api/users"))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(400, response.status().as_u16(), "payload: {}", body);
    }

    // the old password still works
    assert_eq!(200, app.login("walt@breakingbad.com", PASSWORD).await.status().as_u16());
}

#[tokio::test]
async fn update_user_requires_access_token() {
    let app = spawn_app();
    let session = app.signed_in_user("walt@breakingbad.com").await;

    let response = app
        .client
        .put(app.url("/api/users"))
        .bearer_auth(session["refresh_token"].as_str().unwrap())
        .json(&json!({ "email": "walt@breakingbad.com", "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_unauthorized(response).await;
}
