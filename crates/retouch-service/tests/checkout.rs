//! Checkout session integration tests.

mod common;

use common::TestHarness;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn missing_fields_are_rejected() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/checkout")
        .json(&json!({ "priceId": "price_123" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn session_is_created_with_reconciliation_metadata() {
    let harness = TestHarness::new().await;
    let user_id = harness.create_user().await;

    // The form body must embed the metadata the webhook reconciler reads
    // back later (bracket fields arrive URL-encoded).
    Mock::given(method("POST"))
        .and(path("/stripe/v1/checkout/sessions"))
        .and(body_string_contains("metadata%5BuserId%5D"))
        .and(body_string_contains("metadata%5Bcredits%5D=50"))
        .and(body_string_contains("mode=payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_abc",
            "url": "https://checkout.stripe.com/pay/cs_test_abc"
        })))
        .expect(1)
        .mount(&harness.mock)
        .await;

    let response = harness
        .server
        .post("/checkout")
        .json(&json!({
            "userId": user_id,
            "priceId": "price_123",
            "credits": 50
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["sessionId"], "cs_test_abc");
    assert_eq!(body["url"], "https://checkout.stripe.com/pay/cs_test_abc");
}

#[tokio::test]
async fn unknown_user_is_rejected() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/checkout")
        .json(&json!({
            "userId": "6fa85f64-5717-4562-b3fc-2c963f66afa6",
            "priceId": "price_123",
            "credits": 50
        }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn provider_failure_returns_generic_500() {
    let harness = TestHarness::new().await;
    let user_id = harness.create_user().await;

    Mock::given(method("POST"))
        .and(path("/stripe/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": { "type": "card_error", "message": "secret detail" }
        })))
        .mount(&harness.mock)
        .await;

    let response = harness
        .server
        .post("/checkout")
        .json(&json!({
            "userId": user_id,
            "priceId": "price_123",
            "credits": 50
        }))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Upstream provider request failed");
}
