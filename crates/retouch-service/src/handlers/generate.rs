//! Credit-gated generation handler.
//!
//! The request walks the full pipeline: ledger authorize → orchestrated
//! provider calls → artifact persistence → generation record → ledger debit.
//! The debit comes last: a failed generation or a failed upload never
//! consumes a credit.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use retouch_core::{
    credits::GENERATION_COST_CREDITS, CreditTransaction, GenerationRecord, UserId,
};
use retouch_store::settle_with_retry;

use crate::error::ApiError;
use crate::handlers::users::parse_user_id;
use crate::state::AppState;
use crate::{media, pipeline};

/// Bounded retries for the authorize→settle pair.
const SETTLE_ATTEMPTS: u32 = 3;

/// Generation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// The user to charge.
    #[serde(default)]
    pub user_id: String,
    /// The requested change.
    #[serde(default)]
    pub prompt: String,
    /// Original image, raw base64 or data URL.
    #[serde(default)]
    pub image_base64: String,
}

/// Generation response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Durable URL of the generated image.
    pub generated_image: String,
    /// Durable URL of the original image.
    pub original_image: String,
    /// Vision analysis of the original image.
    pub analysis: String,
    /// Advisory similar-objects text; null when captioning failed.
    pub similar_objects: Option<String>,
    /// Credit balance after the debit.
    pub remaining_credits: i64,
}

/// Run one credit-gated generation.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if body.user_id.trim().is_empty()
        || body.prompt.trim().is_empty()
        || body.image_base64.trim().is_empty()
    {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    }

    let user_id = parse_user_id(&body.user_id)?;

    // Gate on the balance before any provider call; a zero-balance request
    // must not reach the orchestrator or mutate the ledger.
    state.store.authorize(&user_id, GENERATION_COST_CREDITS)?;

    let original_bytes = media::decode_image(&body.image_base64)
        .map_err(|_| ApiError::BadRequest("Invalid image data".into()))?;
    let image_data_url = media::to_data_url(media::strip_data_url_prefix(&body.image_base64));

    let deadline = Duration::from_secs(state.config.generation_deadline_seconds);
    let run = run_pipeline(&state, &user_id, &body.prompt, &image_data_url, &original_bytes);

    let (outcome, stored) = match tokio::time::timeout(deadline, run).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            record_failure(&state, user_id, &body.prompt);
            return Err(e);
        }
        Err(_) => {
            tracing::warn!(user_id = %user_id, "generation deadline exceeded");
            record_failure(&state, user_id, &body.prompt);
            return Err(ApiError::Timeout);
        }
    };

    let record = GenerationRecord::completed(
        user_id,
        body.prompt.clone(),
        stored.original_url.clone(),
        stored.generated_url.clone(),
        outcome.analysis.clone(),
        outcome.similar_objects.clone(),
    );
    state.store.record_generation(&record)?;

    // Debit strictly after generation and persistence both succeeded.
    let remaining_credits =
        settle_with_retry(state.store.as_ref(), &user_id, SETTLE_ATTEMPTS, |current| {
            CreditTransaction::generation_debit(
                user_id,
                current - GENERATION_COST_CREDITS,
                &body.prompt,
            )
        })?;

    tracing::info!(
        user_id = %user_id,
        generation_id = %record.id,
        remaining_credits,
        "generation completed"
    );

    Ok(Json(GenerateResponse {
        generated_image: stored.generated_url,
        original_image: stored.original_url,
        analysis: outcome.analysis,
        similar_objects: outcome.similar_objects,
        remaining_credits,
    }))
}

/// Orchestrate the provider calls and artifact persistence under one
/// deadline.
async fn run_pipeline(
    state: &AppState,
    user_id: &UserId,
    prompt: &str,
    image_data_url: &str,
    original_bytes: &[u8],
) -> Result<(pipeline::GenerationOutcome, crate::storage::StoredPair), ApiError> {
    let outcome = pipeline::generate(&state.openai, prompt, image_data_url)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    let stored = state
        .artifacts
        .store_pair(user_id, original_bytes, &outcome.generated_image_url)
        .await
        .map_err(|e| ApiError::Persistence(e.to_string()))?;

    Ok((outcome, stored))
}

/// Append a failed-generation audit record; never masks the primary error.
fn record_failure(state: &AppState, user_id: UserId, prompt: &str) {
    if let Err(e) = state
        .store
        .record_generation(&GenerationRecord::failed(user_id, prompt))
    {
        tracing::warn!(user_id = %user_id, error = %e, "failed to record generation failure");
    }
}
