//! Similar-image resolution with ordered provider fallback.
//!
//! The resolver tries each configured search provider in order and returns
//! the first non-empty, normalized result set. Provider failures are
//! accumulated for logging and never propagate past this boundary: when
//! every provider fails or comes back empty, the caller gets an empty list
//! plus a soft error string so the rest of the page can still render.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

/// Maximum results returned to the caller, regardless of provider.
pub const MAX_RESULTS: usize = 6;

/// Maximum length of a derived title.
const MAX_TITLE_CHARS: usize = 30;

/// Title used when nothing sensible can be derived from the result URL.
const FALLBACK_TITLE: &str = "Similar Image";

/// A single similar-image result. Ephemeral: produced per request, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarImage {
    /// Image URL.
    pub url: String,
    /// Display title.
    pub title: String,
    /// Page the image was found on.
    #[serde(rename = "sourceUrl")]
    pub source_url: String,
}

/// A provider failure, normalized to a loggable message.
#[derive(Debug, thiserror::Error)]
#[error("{provider}: {message}")]
pub struct SearchError {
    /// Provider name.
    pub provider: &'static str,
    /// Internal detail; logged, never returned to clients.
    pub message: String,
}

/// A visual search backend.
#[async_trait]
pub trait SimilarImageProvider: Send + Sync {
    /// Stable provider name, reported as the result `source`.
    fn name(&self) -> &'static str;

    /// Search for images visually similar to the given base64 payload.
    async fn search(&self, image_base64: &str) -> Result<Vec<SimilarImage>, SearchError>;
}

/// Outcome of one resolution.
#[derive(Debug)]
pub struct Resolution {
    /// Up to [`MAX_RESULTS`] normalized results.
    pub images: Vec<SimilarImage>,
    /// Name of the provider that produced the results.
    pub source: Option<&'static str>,
    /// Soft error set when every provider failed or returned nothing.
    pub error: Option<String>,
}

/// Ordered-fallback resolver over the configured providers.
pub struct Resolver {
    providers: Vec<Arc<dyn SimilarImageProvider>>,
}

impl Resolver {
    /// Build a resolver trying `providers` in order.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn SimilarImageProvider>>) -> Self {
        Self { providers }
    }

    /// Number of configured providers.
    #[must_use]
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Resolve similar images, falling back across providers.
    ///
    /// Never fails: total provider failure degrades to an empty result with
    /// a soft error message.
    pub async fn resolve(&self, image_base64: &str) -> Resolution {
        let mut failures: Vec<String> = Vec::new();

        for provider in &self.providers {
            match provider.search(image_base64).await {
                Ok(results) if !results.is_empty() => {
                    let mut images = results;
                    images.truncate(MAX_RESULTS);
                    tracing::debug!(
                        provider = provider.name(),
                        count = images.len(),
                        "similar-image search succeeded"
                    );
                    return Resolution {
                        images,
                        source: Some(provider.name()),
                        error: None,
                    };
                }
                Ok(_) => {
                    tracing::debug!(provider = provider.name(), "provider returned no results");
                    failures.push(format!("{}: no results", provider.name()));
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "provider failed");
                    failures.push(e.to_string());
                }
            }
        }

        tracing::info!(
            attempts = failures.len(),
            "similar-image search exhausted all providers"
        );
        Resolution {
            images: Vec::new(),
            source: None,
            error: Some("No similar images found".to_string()),
        }
    }
}

/// Derive a display title from a result URL.
///
/// Takes the last path segment, drops the file extension, replaces `-`/`_`
/// with spaces, and truncates to 30 characters; falls back to
/// `"Similar Image"` when nothing usable remains.
#[must_use]
pub fn derive_title(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");

    let stem = match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= 4 => stem,
        _ => segment,
    };

    let title: String = stem
        .replace(['-', '_'], " ")
        .trim()
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect();

    if title.trim().is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<SimilarImage>);

    #[async_trait]
    impl SimilarImageProvider for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn search(&self, _image: &str) -> Result<Vec<SimilarImage>, SearchError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl SimilarImageProvider for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn search(&self, _image: &str) -> Result<Vec<SimilarImage>, SearchError> {
            Err(SearchError {
                provider: "failing",
                message: "503 from upstream".into(),
            })
        }
    }

    fn image(n: usize) -> SimilarImage {
        SimilarImage {
            url: format!("https://img.example.com/{n}.png"),
            title: format!("image {n}"),
            source_url: format!("https://example.com/{n}"),
        }
    }

    #[tokio::test]
    async fn first_provider_wins_when_it_has_results() {
        let resolver = Resolver::new(vec![
            Arc::new(Fixed(vec![image(1)])),
            Arc::new(Failing),
        ]);

        let resolution = resolver.resolve("aW1n").await;
        assert_eq!(resolution.source, Some("fixed"));
        assert_eq!(resolution.images.len(), 1);
        assert!(resolution.error.is_none());
    }

    #[tokio::test]
    async fn empty_primary_falls_back_to_secondary() {
        struct Secondary;

        #[async_trait]
        impl SimilarImageProvider for Secondary {
            fn name(&self) -> &'static str {
                "secondary"
            }

            async fn search(&self, _image: &str) -> Result<Vec<SimilarImage>, SearchError> {
                Ok(vec![image(2)])
            }
        }

        let resolver = Resolver::new(vec![Arc::new(Fixed(vec![])), Arc::new(Secondary)]);

        let resolution = resolver.resolve("aW1n").await;
        assert_eq!(resolution.source, Some("secondary"));
        assert_eq!(resolution.images.len(), 1);
    }

    #[tokio::test]
    async fn failing_primary_falls_back_to_secondary() {
        let resolver = Resolver::new(vec![
            Arc::new(Failing),
            Arc::new(Fixed(vec![image(3)])),
        ]);

        let resolution = resolver.resolve("aW1n").await;
        assert_eq!(resolution.source, Some("fixed"));
        assert_eq!(resolution.images.len(), 1);
    }

    #[tokio::test]
    async fn total_failure_degrades_to_soft_error() {
        let resolver = Resolver::new(vec![Arc::new(Failing), Arc::new(Fixed(vec![]))]);

        let resolution = resolver.resolve("aW1n").await;
        assert!(resolution.images.is_empty());
        assert!(resolution.source.is_none());
        assert!(resolution.error.as_deref().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn results_are_truncated_to_six() {
        let many: Vec<SimilarImage> = (0..10).map(image).collect();
        let resolver = Resolver::new(vec![Arc::new(Fixed(many))]);

        let resolution = resolver.resolve("aW1n").await;
        assert_eq!(resolution.images.len(), MAX_RESULTS);
    }

    #[test]
    fn title_from_hyphenated_filename() {
        assert_eq!(
            derive_title("https://x.com/path/red-chair_2.png"),
            "red chair 2"
        );
    }

    #[test]
    fn title_truncates_to_thirty_chars() {
        let title = derive_title(
            "https://x.com/a-very-long-descriptive-file-name-for-a-product-photo.jpg",
        );
        assert!(title.chars().count() <= 30);
        assert!(title.starts_with("a very long"));
    }

    #[test]
    fn title_ignores_query_strings() {
        assert_eq!(
            derive_title("https://x.com/items/oak-table.jpg?w=400&h=300"),
            "oak table"
        );
    }

    #[test]
    fn unusable_urls_fall_back_to_default() {
        assert_eq!(derive_title("https://x.com/"), FALLBACK_TITLE);
        assert_eq!(derive_title(""), FALLBACK_TITLE);
        assert_eq!(derive_title("https://x.com/---"), FALLBACK_TITLE);
    }
}
