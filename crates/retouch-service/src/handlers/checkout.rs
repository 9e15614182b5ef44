//! Checkout session handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::handlers::users::parse_user_id;
use crate::state::AppState;

/// Checkout request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// The purchasing user.
    #[serde(default)]
    pub user_id: String,
    /// Payment-provider price identifier for the credit pack.
    #[serde(default)]
    pub price_id: String,
    /// Credits the pack grants, embedded in session metadata for the
    /// webhook reconciler.
    #[serde(default)]
    pub credits: i64,
}

/// Checkout response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Session ID.
    pub session_id: String,
    /// Hosted checkout URL to redirect the user to.
    pub url: String,
}

/// Create a hosted checkout session for a credit pack.
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    if body.user_id.trim().is_empty() || body.price_id.trim().is_empty() || body.credits <= 0 {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    }

    let user_id = parse_user_id(&body.user_id)?;

    // The account must exist before we sell it credits.
    state
        .store
        .get_account(&user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::Internal("payment provider not configured".into()))?;

    let success_url = format!(
        "{}/payment/success?session_id={{CHECKOUT_SESSION_ID}}",
        state.config.app_url
    );
    let cancel_url = format!("{}/payment/cancel", state.config.app_url);

    let session = stripe
        .create_checkout_session(
            &user_id.to_string(),
            &body.price_id,
            body.credits,
            &success_url,
            &cancel_url,
        )
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    let url = session
        .url
        .ok_or_else(|| ApiError::Upstream("checkout session carried no URL".into()))?;

    tracing::info!(
        user_id = %user_id,
        session_id = %session.id,
        credits = body.credits,
        "checkout session created"
    );

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url,
    }))
}
