//! Shared integration-test harness.
//!
//! Spins up the full router against a `MemoryStore` and one wiremock server
//! that impersonates every external service; each provider gets its own
//! path prefix under the mock's URI.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;
use wiremock::MockServer;

use retouch_service::{create_router, AppState, ServiceConfig};
use retouch_store::MemoryStore;

/// A tiny valid base64 payload standing in for image bytes.
pub const IMAGE_B64: &str = "aGVsbG8gd29ybGQ=";

pub struct TestHarness {
    pub server: TestServer,
    pub mock: MockServer,
    pub admin_key: String,
    pub webhook_secret: String,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_generation_deadline(30).await
    }

    pub async fn with_generation_deadline(deadline_seconds: u64) -> Self {
        let mock = MockServer::start().await;
        let admin_key = "admin-test-key".to_string();
        let webhook_secret = "whsec_test".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: String::new(),
            openai_api_key: "sk-test".into(),
            openai_base_url: format!("{}/openai/v1", mock.uri()),
            google: None,
            google_token_url: format!("{}/token", mock.uri()),
            vision_base_url: format!("{}/vision", mock.uri()),
            serpapi_key: Some("serp-test-key".into()),
            serpapi_base_url: format!("{}/serp", mock.uri()),
            stripe_api_key: Some("sk_test_stripe".into()),
            stripe_webhook_secret: Some(webhook_secret.clone()),
            stripe_base_url: format!("{}/stripe", mock.uri()),
            storage_base_url: format!("{}/storage/v1", mock.uri()),
            storage_service_key: "storage-service-key".into(),
            storage_bucket: "images".into(),
            app_url: "http://localhost:3000".into(),
            admin_api_key: Some(admin_key.clone()),
            cors_origins: vec!["*".into()],
            max_body_bytes: 10 * 1024 * 1024,
            request_timeout_seconds: 30,
            generation_deadline_seconds: deadline_seconds,
        };

        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        let server = TestServer::new(create_router(state)).expect("failed to create test server");

        Self {
            server,
            mock,
            admin_key,
            webhook_secret,
        }
    }

    /// Create an account and return its user ID.
    pub async fn create_user(&self) -> String {
        let response = self
            .server
            .post("/v1/users")
            .json(&json!({ "email": "test@example.com" }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        body["userId"].as_str().expect("userId in response").to_string()
    }

    /// Grant credits through the admin endpoint.
    pub async fn fund(&self, user_id: &str, credits: i64) {
        self.server
            .post("/v1/credits/add")
            .add_header("x-admin-key", &self.admin_key)
            .json(&json!({
                "userId": user_id,
                "credits": credits,
                "reason": "Test funding"
            }))
            .await
            .assert_status_ok();
    }

    /// Read the current balance.
    pub async fn credits(&self, user_id: &str) -> i64 {
        let response = self.server.get(&format!("/v1/users/{user_id}/credits")).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["credits"].as_i64().expect("credits in response")
    }

    /// Read the transaction history.
    pub async fn transactions(&self, user_id: &str) -> Vec<serde_json::Value> {
        let response = self
            .server
            .get(&format!("/v1/users/{user_id}/transactions"))
            .await;
        response.assert_status_ok();
        response.json()
    }

    /// Read the generation history.
    pub async fn generations(&self, user_id: &str) -> Vec<serde_json::Value> {
        let response = self
            .server
            .get(&format!("/v1/users/{user_id}/generations"))
            .await;
        response.assert_status_ok();
        response.json()
    }
}
