//! Shared harness for the integration tests
//!
//! Each test gets its own server on a random port, backed by a fresh
//! `MemoryStore` and a `FixedClock` the test can move forward.
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use squawk::clock::FixedClock;
use squawk::configuration::{
    ApplicationSettings, DatabaseSettings, JwtSettings, Settings, WebhookSettings,
};
use squawk::startup::run;
use squawk::store::MemoryStore;
use std::net::TcpListener;
use std::sync::Arc;

pub const PASSWORD: &str = "04234567";
pub const API_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub address: String,
    pub clock: Arc<FixedClock>,
    pub client: reqwest::Client,
}

pub fn test_settings(platform: &str) -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "squawk".to_string(),
            in_memory: true,
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            platform: platform.to_string(),
        },
        jwt: JwtSettings {
            secret: "integration-test-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 60 * 24 * 3600,
            issuer: "squawk-access".to_string(),
        },
        webhook: WebhookSettings {
            api_key: API_KEY.to_string(),
        },
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_settings("dev"))
}

pub fn spawn_app_with(settings: Settings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ));
    let server = run(
        listener,
        Arc::new(MemoryStore::new()),
        clock.clone(),
        settings,
    )
    .expect("Failed to create server");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        clock,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/users"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Creates the user and returns the login body
    pub async fn signed_in_user(&self, email: &str) -> Value {
        let response = self.create_user(email, PASSWORD).await;
        assert_eq!(201, response.status().as_u16());

        let response = self.login(email, PASSWORD).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse login response")
    }

    pub async fn create_post(&self, access_token: &str, body: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/posts"))
            .bearer_auth(access_token)
            .json(&json!({ "body": body }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/refresh"))
            .bearer_auth(refresh_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn revoke(&self, refresh_token: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/revoke"))
            .bearer_auth(refresh_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Asserts the uniform 401 envelope
pub async fn assert_unauthorized(response: reqwest::Response) {
    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse error body");
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["code"], "UNAUTHORIZED");
}
