//! Direct image-edit handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::media;
use crate::state::AppState;

/// Edit request. The image may be a data URL or raw base64.
#[derive(Debug, Deserialize)]
pub struct EditImageRequest {
    /// Image payload.
    #[serde(default)]
    pub image: String,
    /// Edit instruction.
    #[serde(default)]
    pub prompt: String,
}

/// Edit response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditImageResponse {
    /// URL (or data URL) of the edited image.
    pub edited_image: String,
}

/// Edit an image with the provider's edit endpoint.
pub async fn edit_image(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EditImageRequest>,
) -> Result<Json<EditImageResponse>, ApiError> {
    if body.image.trim().is_empty() || body.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    }

    let image_bytes = media::decode_image(&body.image)
        .map_err(|_| ApiError::BadRequest("Invalid image data".into()))?;

    let edited_image = state
        .openai
        .edit_image(image_bytes, &body.prompt)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    Ok(Json(EditImageResponse { edited_image }))
}
