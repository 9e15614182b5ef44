//! Google Vision web-detection client.
//!
//! Primary similar-image provider. Sends the image bytes inline to
//! `images:annotate` with a `WEB_DETECTION` feature request and normalizes
//! `visuallySimilarImages` into the internal result shape.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::similar::{derive_title, SearchError, SimilarImage, SimilarImageProvider, MAX_RESULTS};
use crate::vision::token::{TokenError, TokenMinter};

/// Provider name reported as the result `source`.
pub const PROVIDER_NAME: &str = "google_vision";

/// Errors from the Vision API.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    /// Bearer-token minting failed.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The API returned a non-success status.
    #[error("Vision API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Provider error message (internal use only).
        message: String,
    },

    /// Network or protocol failure.
    #[error("Vision request failed: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResult {
    #[serde(default)]
    web_detection: Option<WebDetection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebDetection {
    #[serde(default)]
    visually_similar_images: Vec<WebImage>,
}

#[derive(Debug, Deserialize)]
struct WebImage {
    #[serde(default)]
    url: Option<String>,
}

/// Google Vision search client.
pub struct VisionClient {
    http: reqwest::Client,
    minter: TokenMinter,
    base_url: String,
}

impl VisionClient {
    /// Create a client against the given Vision API base URL.
    #[must_use]
    pub fn new(minter: TokenMinter, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            minter,
            base_url: base_url.into(),
        }
    }

    /// Run web detection over inline image bytes.
    ///
    /// A response without a web-detection block maps to an empty list; the
    /// resolver treats that as "try the next provider".
    ///
    /// # Errors
    ///
    /// Fails on token minting, network, or API errors.
    pub async fn search_similar(
        &self,
        image_base64: &str,
    ) -> Result<Vec<SimilarImage>, VisionError> {
        let token = self.minter.bearer_token().await?;

        let body = json!({
            "requests": [{
                "image": { "content": image_base64 },
                "features": [{ "type": "WEB_DETECTION", "maxResults": MAX_RESULTS }]
            }]
        });

        let response = self
            .http
            .post(format!("{}/v1/images:annotate", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let annotated: AnnotateResponse = response.json().await?;
        Ok(normalize(annotated))
    }
}

fn normalize(annotated: AnnotateResponse) -> Vec<SimilarImage> {
    annotated
        .responses
        .into_iter()
        .next()
        .and_then(|r| r.web_detection)
        .map(|w| w.visually_similar_images)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|img| img.url)
        .filter(|url| !url.is_empty())
        .map(|url| SimilarImage {
            title: derive_title(&url),
            source_url: url.clone(),
            url,
        })
        .collect()
}

#[async_trait]
impl SimilarImageProvider for VisionClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn search(&self, image_base64: &str) -> Result<Vec<SimilarImage>, SearchError> {
        self.search_similar(image_base64)
            .await
            .map_err(|e| SearchError {
                provider: PROVIDER_NAME,
                message: e.to_string(),
            })
    }
}
