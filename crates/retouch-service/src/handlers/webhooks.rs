//! Payment-completion webhook handler.
//!
//! State machine over verified deliveries: verify signature → dispatch on
//! event type → reconcile the ledger. Signature failures are 4xx and never
//! retried; any failure after verification is a 5xx so the event source
//! redelivers. Credits are idempotent per payment-session reference, so
//! at-least-once delivery cannot double-credit.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use retouch_core::CreditTransaction;
use retouch_store::{settle_with_retry, StoreError};

use crate::error::ApiError;
use crate::state::AppState;

/// Bounded retries for the authorize→settle pair.
const SETTLE_ATTEMPTS: u32 = 3;

/// Stripe webhook payload (the parts we dispatch on).
#[derive(Debug, Deserialize)]
pub struct StripeWebhook {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event ID.
    pub id: String,
    /// Event data.
    pub data: StripeEventData,
}

/// Stripe event data container.
#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    /// Event object.
    pub object: serde_json::Value,
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was processed.
    pub received: bool,
}

/// Handle Stripe webhooks.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    verify_signature(&state, &headers, &body)?;

    let webhook: StripeWebhook =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %webhook.event_type,
        event_id = %webhook.id,
        "received payment webhook"
    );

    match webhook.event_type.as_str() {
        "checkout.session.completed" => {
            handle_checkout_completed(&state, &webhook.data.object)?;
        }
        other => {
            tracing::debug!(event_type = %other, "unhandled payment event");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

fn verify_signature(state: &AppState, headers: &HeaderMap, body: &str) -> Result<(), ApiError> {
    let Some(stripe) = &state.stripe else {
        tracing::warn!("Stripe not configured - rejecting webhook");
        return Err(ApiError::BadRequest("payments not configured".into()));
    };

    if !stripe.has_webhook_secret() {
        // Development mode only; a production deployment always configures
        // the signing secret.
        tracing::warn!("webhook secret not configured - skipping signature verification");
        return Ok(());
    }

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing Stripe signature".into()))?;

    stripe.verify_webhook_signature(body, signature).map_err(|e| {
        tracing::warn!(error = %e, "invalid webhook signature");
        ApiError::SignatureInvalid
    })
}

/// Reconcile one completed checkout session.
///
/// Post-verification failures map to 5xx so the event source retries the
/// delivery; a replayed session settles as a no-op success.
fn handle_checkout_completed(
    state: &AppState,
    object: &serde_json::Value,
) -> Result<(), ApiError> {
    let session_id = object.get("id").and_then(|v| v.as_str()).unwrap_or("unknown");

    let payment_status = object
        .get("payment_status")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    if payment_status != "paid" {
        tracing::info!(
            session_id = %session_id,
            payment_status = %payment_status,
            "checkout session not paid yet, skipping"
        );
        return Ok(());
    }

    let metadata = object.get("metadata");
    let user_id_str = metadata
        .and_then(|m| m.get("userId"))
        .and_then(|v| v.as_str());
    let credits = metadata
        .and_then(|m| m.get("credits"))
        .and_then(value_as_i64)
        .unwrap_or(0);

    let Some(user_id_str) = user_id_str else {
        tracing::warn!(session_id = %session_id, "checkout session missing userId metadata");
        return Ok(());
    };
    if credits <= 0 {
        tracing::warn!(session_id = %session_id, "checkout session missing credits metadata");
        return Ok(());
    }

    let user_id = user_id_str
        .parse()
        .map_err(|_| ApiError::Internal(format!("invalid userId in session metadata: {user_id_str}")))?;

    let amount_cents = object
        .get("amount_total")
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(0);

    let settled = settle_with_retry(state.store.as_ref(), &user_id, SETTLE_ATTEMPTS, |current| {
        CreditTransaction::purchase(
            user_id,
            credits,
            current + credits,
            amount_cents,
            session_id,
        )
    });

    match settled {
        Ok(balance) => {
            tracing::info!(
                user_id = %user_id_str,
                session_id = %session_id,
                credits_added = credits,
                new_balance = balance,
                "credits added from checkout session"
            );
            Ok(())
        }
        Err(StoreError::DuplicateSession { session_id }) => {
            // At-least-once delivery: the first delivery already settled.
            tracing::info!(
                session_id = %session_id,
                "checkout session already settled, acknowledging replay"
            );
            Ok(())
        }
        // Everything else (missing account included) must surface as a 5xx
        // so the event source redelivers once the condition is fixed.
        Err(e) => Err(ApiError::Internal(format!(
            "failed to settle checkout session {session_id}: {e}"
        ))),
    }
}

/// Stripe metadata values arrive as strings; tolerate raw numbers too.
fn value_as_i64(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
