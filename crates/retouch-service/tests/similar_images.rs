//! Similar-image lookup integration tests.
//!
//! The harness configures no Google credentials, so the resolver starts at
//! the SerpAPI fallback; resolver ordering across both providers is covered
//! by the unit tests in `similar.rs`.

mod common;

use common::{TestHarness, IMAGE_B64};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn visual_match(n: usize) -> serde_json::Value {
    json!({
        "thumbnail": format!("https://t.example.com/{n}.jpg"),
        "title": format!("Match {n}"),
        "link": format!("https://shop.example.com/{n}"),
    })
}

#[tokio::test]
async fn missing_image_is_rejected() {
    let harness = TestHarness::new().await;

    let response = harness.server.post("/similar-images").json(&json!({})).await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn results_are_normalized_and_truncated_to_six() {
    let harness = TestHarness::new().await;

    let matches: Vec<_> = (0..9).map(visual_match).collect();
    Mock::given(method("GET"))
        .and(path("/serp/search.json"))
        .and(query_param("engine", "google_lens"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "visual_matches": matches })),
        )
        .mount(&harness.mock)
        .await;

    let response = harness
        .server
        .post("/similar-images")
        .json(&json!({ "image": IMAGE_B64 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    assert_eq!(body["source"], "serp_api");
    assert_eq!(body["images"].as_array().unwrap().len(), 6);
    assert_eq!(body["images"][0]["url"], "https://t.example.com/0.jpg");
    assert_eq!(body["images"][0]["title"], "Match 0");
    assert_eq!(body["images"][0]["sourceUrl"], "https://shop.example.com/0");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn data_url_prefix_is_stripped_before_dispatch() {
    let harness = TestHarness::new().await;

    // The provider must receive the bare base64 payload.
    Mock::given(method("GET"))
        .and(path("/serp/search.json"))
        .and(query_param("url", IMAGE_B64))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "visual_matches": [visual_match(1)]
        })))
        .expect(1)
        .mount(&harness.mock)
        .await;

    let response = harness
        .server
        .post("/similar-images")
        .json(&json!({ "image": format!("data:image/png;base64,{IMAGE_B64}") }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["images"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_titles_fall_back() {
    let harness = TestHarness::new().await;

    Mock::given(method("GET"))
        .and(path("/serp/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "visual_matches": [{ "thumbnail": "https://t.example.com/1.jpg" }]
        })))
        .mount(&harness.mock)
        .await;

    let response = harness
        .server
        .post("/similar-images")
        .json(&json!({ "image": IMAGE_B64 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["images"][0]["title"], "Similar Object");
}

#[tokio::test]
async fn total_provider_failure_degrades_to_empty_200() {
    let harness = TestHarness::new().await;

    Mock::given(method("GET"))
        .and(path("/serp/search.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&harness.mock)
        .await;

    let response = harness
        .server
        .post("/similar-images")
        .json(&json!({ "image": IMAGE_B64 }))
        .await;

    // Degrades, never fails the request.
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["images"].as_array().unwrap().is_empty());
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn empty_provider_results_also_degrade() {
    let harness = TestHarness::new().await;

    Mock::given(method("GET"))
        .and(path("/serp/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "visual_matches": [] })))
        .mount(&harness.mock)
        .await;

    let response = harness
        .server
        .post("/similar-images")
        .json(&json!({ "image": IMAGE_B64 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["images"].as_array().unwrap().is_empty());
    assert!(body["error"].as_str().is_some());
}
