//! API error types and responses.
//!
//! Every error leaving the service is rendered as `{"error": "<message>"}`.
//! Upstream and persistence failures are logged with full detail server-side
//! and returned to the client as generic messages; provider error bodies and
//! credential material never cross the boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid admin credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Bad request - missing or malformed input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Conflict - resource already exists or a ledger settle lost its race.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Insufficient credits.
    #[error("insufficient credits: balance={balance}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
    },

    /// Webhook signature verification failed. Never retried by design.
    #[error("invalid webhook signature")]
    SignatureInvalid,

    /// Third-party API failure. The message is logged, not returned.
    #[error("upstream provider error: {0}")]
    Upstream(String),

    /// Storage or database write failure. The message is logged, not returned.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The generation pipeline exceeded its deadline.
    #[error("generation deadline exceeded")]
    Timeout,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::InsufficientCredits { balance } => (
                StatusCode::PAYMENT_REQUIRED,
                format!("Insufficient credits (balance: {balance})"),
            ),
            Self::SignatureInvalid => {
                (StatusCode::BAD_REQUEST, "Invalid webhook signature".into())
            }
            Self::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream provider error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Upstream provider request failed".into(),
                )
            }
            Self::Persistence(msg) => {
                tracing::error!(error = %msg, "Persistence error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store artifacts".into(),
                )
            }
            Self::Timeout => (StatusCode::GATEWAY_TIMEOUT, "Generation timed out".into()),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".into(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<retouch_store::StoreError> for ApiError {
    fn from(err: retouch_store::StoreError) -> Self {
        match err {
            retouch_store::StoreError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            retouch_store::StoreError::InsufficientCredits { balance, .. } => {
                Self::InsufficientCredits { balance }
            }
            retouch_store::StoreError::AlreadyExists { user_id } => {
                Self::Conflict(format!("Account already exists: {user_id}"))
            }
            retouch_store::StoreError::Conflict { user_id } => {
                Self::Conflict(format!("Ledger conflict for user {user_id}"))
            }
            retouch_store::StoreError::DuplicateSession { session_id } => {
                Self::Conflict(format!("Payment session already settled: {session_id}"))
            }
            retouch_store::StoreError::Database(msg)
            | retouch_store::StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
