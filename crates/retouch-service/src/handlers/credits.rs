//! Administrative credit grants.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use retouch_core::CreditTransaction;
use retouch_store::settle_with_retry;

use crate::error::ApiError;
use crate::handlers::users::parse_user_id;
use crate::state::AppState;

/// Bounded retries for the authorize→settle pair.
const SETTLE_ATTEMPTS: u32 = 3;

/// Admin credit grant request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCreditsRequest {
    /// Target user.
    pub user_id: String,
    /// Credits to grant.
    pub credits: i64,
    /// Audit reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Admin credit grant response.
#[derive(Debug, Serialize)]
pub struct AddCreditsResponse {
    /// New balance.
    pub credits: i64,
}

/// Grant credits to an account. Requires the admin API key.
pub async fn admin_add_credits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AddCreditsRequest>,
) -> Result<Json<AddCreditsResponse>, ApiError> {
    let expected = state
        .config
        .admin_api_key
        .as_deref()
        .ok_or(ApiError::Unauthorized)?;
    let provided = headers
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    if !crate::crypto::constant_time_eq(provided, expected) {
        return Err(ApiError::Unauthorized);
    }

    if body.credits <= 0 {
        return Err(ApiError::BadRequest("credits must be positive".into()));
    }

    let user_id = parse_user_id(&body.user_id)?;
    let reason = body
        .reason
        .clone()
        .unwrap_or_else(|| "Administrative credit grant".to_string());

    let balance = settle_with_retry(state.store.as_ref(), &user_id, SETTLE_ATTEMPTS, |current| {
        CreditTransaction::grant(user_id, body.credits, current + body.credits, reason.clone())
    })?;

    tracing::info!(
        user_id = %user_id,
        credits = body.credits,
        new_balance = balance,
        "admin credit grant applied"
    );

    Ok(Json(AddCreditsResponse { credits: balance }))
}
