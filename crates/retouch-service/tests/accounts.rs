//! Account endpoint integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

#[tokio::test]
async fn created_account_starts_at_zero_credits() {
    let harness = TestHarness::new().await;
    let user_id = harness.create_user().await;

    assert_eq!(harness.credits(&user_id).await, 0);
    assert!(harness.transactions(&user_id).await.is_empty());
    assert!(harness.generations(&user_id).await.is_empty());
}

#[tokio::test]
async fn create_account_requires_email() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/v1/users")
        .json(&json!({ "email": "" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn unknown_account_lookup_is_404() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/v1/users/6fa85f64-5717-4562-b3fc-2c963f66afa6/credits")
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn malformed_user_id_is_400() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/users/not-a-uuid/credits").await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn credit_grant_requires_admin_key() {
    let harness = TestHarness::new().await;
    let user_id = harness.create_user().await;

    let response = harness
        .server
        .post("/v1/credits/add")
        .json(&json!({ "userId": user_id, "credits": 5 }))
        .await;
    response.assert_status_unauthorized();

    let response = harness
        .server
        .post("/v1/credits/add")
        .add_header("x-admin-key", "wrong-key")
        .json(&json!({ "userId": user_id, "credits": 5 }))
        .await;
    response.assert_status_unauthorized();

    assert_eq!(harness.credits(&user_id).await, 0);
}

#[tokio::test]
async fn credit_grant_appends_a_transaction() {
    let harness = TestHarness::new().await;
    let user_id = harness.create_user().await;
    harness.fund(&user_id, 7).await;

    assert_eq!(harness.credits(&user_id).await, 7);

    let transactions = harness.transactions(&user_id).await;
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["kind"], "grant");
    assert_eq!(transactions[0]["delta"], 7);
    assert_eq!(transactions[0]["balanceAfter"], 7);
}
