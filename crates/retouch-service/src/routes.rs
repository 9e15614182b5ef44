//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{checkout, credits, generate, health, images, similar, users, webhooks};
use crate::state::AppState;

/// Maximum concurrent pipeline requests (generation and edits are the
/// expensive provider-bound calls).
const PIPELINE_MAX_CONCURRENT_REQUESTS: usize = 32;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Pipeline (concurrency-limited)
/// - `POST /generate` - Credit-gated image generation
/// - `POST /edit-image` - Direct image edit
/// - `POST /similar-images` - Similar-image lookup with fallback
///
/// ## Payments
/// - `POST /checkout` - Create a hosted checkout session
/// - `POST /webhooks/stripe` - Payment-completion webhooks (signature
///   verification)
///
/// ## Accounts (`/v1`)
/// - `POST /v1/users` - Create account
/// - `GET /v1/users/:id/credits` - Current balance
/// - `GET /v1/users/:id/generations` - Generation history
/// - `GET /v1/users/:id/transactions` - Ledger history
/// - `POST /v1/credits/add` - Admin credit grant (admin key)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let state = Arc::new(state);

    // The pipeline endpoints each hold an upstream provider connection for
    // seconds at a time, so they get their own concurrency ceiling.
    let pipeline_routes = Router::new()
        .route("/generate", post(generate::generate))
        .route("/edit-image", post(images::edit_image))
        .route("/similar-images", post(similar::similar_images))
        .layer(ConcurrencyLimitLayer::new(PIPELINE_MAX_CONCURRENT_REQUESTS));

    let account_routes = Router::new()
        .route("/users", post(users::create_user))
        .route("/users/:id/credits", get(users::get_credits))
        .route("/users/:id/generations", get(users::list_generations))
        .route("/users/:id/transactions", get(users::list_transactions))
        .route("/credits/add", post(credits::admin_add_credits));

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Account API
        .nest("/v1", account_routes)
        // Generation pipeline
        .merge(pipeline_routes)
        // Payments
        .route("/checkout", post(checkout::create_checkout))
        // Webhooks (no concurrency limit - controlled by the event source)
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
