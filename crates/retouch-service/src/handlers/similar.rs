//! Similar-image lookup handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::media;
use crate::similar::SimilarImage;
use crate::state::AppState;

/// Lookup request. The image may be a data URL or raw base64.
#[derive(Debug, Deserialize)]
pub struct SimilarImagesRequest {
    /// Image payload.
    #[serde(default)]
    pub image: String,
}

/// Lookup response. Always HTTP 200 once the input validates: provider
/// failure degrades to an empty list plus a soft error string.
#[derive(Debug, Serialize)]
pub struct SimilarImagesResponse {
    /// Up to six normalized results.
    pub images: Vec<SimilarImage>,
    /// Provider that produced the results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
    /// Soft error when every provider came back empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Look up visually similar images with ordered provider fallback.
pub async fn similar_images(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SimilarImagesRequest>,
) -> Result<Json<SimilarImagesResponse>, ApiError> {
    if body.image.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing image data".into()));
    }

    let image_base64 = media::strip_data_url_prefix(&body.image);
    let resolution = state.resolver.resolve(image_base64).await;

    Ok(Json(SimilarImagesResponse {
        images: resolution.images,
        source: resolution.source,
        error: resolution.error,
    }))
}
