//! Account and history handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use retouch_core::{CreditTransaction, GenerationRecord, UserAccount, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Create account request.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Contact email.
    pub email: String,
}

/// Account response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User ID.
    pub user_id: String,
    /// Contact email.
    pub email: String,
    /// Current credit balance.
    pub credits: i64,
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

impl From<&UserAccount> for UserResponse {
    fn from(account: &UserAccount) -> Self {
        Self {
            user_id: account.user_id.to_string(),
            email: account.email.clone(),
            credits: account.credits,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Create a new account with zero credits.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if body.email.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing email".into()));
    }

    let account = UserAccount::new(UserId::generate(), body.email.trim());
    state.store.create_account(&account)?;

    tracing::info!(user_id = %account.user_id, "account created");

    Ok(Json(UserResponse::from(&account)))
}

/// Balance response.
#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    /// Current credit balance.
    pub credits: i64,
}

/// Get the current balance for an account.
pub async fn get_credits(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CreditsResponse>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let account = state
        .store
        .get_account(&user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(CreditsResponse {
        credits: account.credits,
    }))
}

/// Generation record response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// Record ID.
    pub id: String,
    /// The requested change.
    pub prompt: String,
    /// Durable original-image URL.
    pub original_image_url: Option<String>,
    /// Durable generated-image URL.
    pub generated_image_url: Option<String>,
    /// Vision analysis text.
    pub analysis: Option<String>,
    /// Advisory similar-objects text.
    pub similar_objects: Option<String>,
    /// Record status.
    pub status: retouch_core::GenerationStatus,
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

impl From<GenerationRecord> for GenerationResponse {
    fn from(record: GenerationRecord) -> Self {
        Self {
            id: record.id.to_string(),
            prompt: record.prompt,
            original_image_url: record.original_image_url,
            generated_image_url: record.generated_image_url,
            analysis: record.analysis,
            similar_objects: record.similar_objects,
            status: record.status,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// List an account's generation records.
pub async fn list_generations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<GenerationResponse>>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let records = state.store.list_generations(&user_id)?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Ledger transaction response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Signed credit delta.
    pub delta: i64,
    /// Balance after this transaction.
    pub balance_after: i64,
    /// Monetary amount in cents, when payment-backed.
    pub amount_cents: Option<i64>,
    /// External payment-session reference.
    pub session_id: Option<String>,
    /// Transaction type.
    pub kind: retouch_core::TransactionType,
    /// Settlement status.
    pub status: retouch_core::TransactionStatus,
    /// Description.
    pub description: String,
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

impl From<CreditTransaction> for TransactionResponse {
    fn from(tx: CreditTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            delta: tx.delta,
            balance_after: tx.balance_after,
            amount_cents: tx.amount_cents,
            session_id: tx.session_id,
            kind: tx.kind,
            status: tx.status,
            description: tx.description,
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// List an account's ledger transactions.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let transactions = state.store.list_transactions(&user_id)?;

    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid user id".into()))
}
