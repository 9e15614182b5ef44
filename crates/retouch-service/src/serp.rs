//! SerpAPI Google Lens client.
//!
//! Fallback similar-image provider with plain key-based authentication.

use async_trait::async_trait;
use serde::Deserialize;

use crate::similar::{SearchError, SimilarImage, SimilarImageProvider};

/// Provider name reported as the result `source`.
pub const PROVIDER_NAME: &str = "serp_api";

/// Title used when a visual match carries none.
const FALLBACK_TITLE: &str = "Similar Object";

/// Errors from SerpAPI.
#[derive(Debug, thiserror::Error)]
pub enum SerpError {
    /// The API returned a non-success status.
    #[error("SerpAPI error: {status}")]
    Api {
        /// HTTP status code.
        status: u16,
    },

    /// Network or protocol failure.
    #[error("SerpAPI request failed: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct LensResponse {
    #[serde(default)]
    visual_matches: Vec<VisualMatch>,
}

#[derive(Debug, Deserialize)]
struct VisualMatch {
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

/// SerpAPI client.
pub struct SerpClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerpClient {
    /// Create a client against the given SerpAPI base URL.
    #[must_use]
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Search Google Lens visual matches for the given image payload.
    ///
    /// # Errors
    ///
    /// Fails on network or API errors. The API key travels as a query
    /// parameter; never log the request URL.
    pub async fn search_matches(&self, image: &str) -> Result<Vec<SimilarImage>, SerpError> {
        let response = self
            .http
            .get(format!("{}/search.json", self.base_url))
            .query(&[
                ("engine", "google_lens"),
                ("url", image),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SerpError::Api {
                status: status.as_u16(),
            });
        }

        let lens: LensResponse = response.json().await?;
        Ok(lens
            .visual_matches
            .into_iter()
            .filter_map(|m| {
                let url = m.thumbnail.filter(|t| !t.is_empty())?;
                Some(SimilarImage {
                    url,
                    title: m
                        .title
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| FALLBACK_TITLE.to_string()),
                    source_url: m.link.unwrap_or_default(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl SimilarImageProvider for SerpClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn search(&self, image_base64: &str) -> Result<Vec<SimilarImage>, SearchError> {
        self.search_matches(image_base64)
            .await
            .map_err(|e| SearchError {
                provider: PROVIDER_NAME,
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visual_matches_deserialize_with_defaults() {
        let lens: LensResponse = serde_json::from_str(
            r#"{"visual_matches":[
                {"thumbnail":"https://t.example.com/1.jpg","title":"Oak chair","link":"https://shop.example.com/1"},
                {"thumbnail":"https://t.example.com/2.jpg"},
                {"title":"no thumbnail"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(lens.visual_matches.len(), 3);
        assert_eq!(lens.visual_matches[1].title, None);
    }

    #[test]
    fn empty_response_deserializes() {
        let lens: LensResponse = serde_json::from_str(r"{}").unwrap();
        assert!(lens.visual_matches.is_empty());
    }
}
