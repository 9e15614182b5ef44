//! Application state.
//!
//! Every external-service client is constructed exactly once at startup from
//! the immutable configuration and shared across handlers; no handler builds
//! its own client or reads the environment.

use std::sync::Arc;

use retouch_store::Store;

use crate::config::ServiceConfig;
use crate::openai::OpenAiClient;
use crate::serp::SerpClient;
use crate::similar::{Resolver, SimilarImageProvider};
use crate::storage::ArtifactStore;
use crate::stripe::StripeClient;
use crate::vision::{TokenMinter, VisionClient};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// OpenAI client for analysis, generation, and edits.
    pub openai: Arc<OpenAiClient>,

    /// Stripe client for payments (optional).
    pub stripe: Option<Arc<StripeClient>>,

    /// Object-storage client for image artifacts.
    pub artifacts: Arc<ArtifactStore>,

    /// Similar-image resolver over the configured search providers.
    pub resolver: Arc<Resolver>,
}

impl AppState {
    /// Create the application state, constructing one client per configured
    /// external service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let openai = Arc::new(OpenAiClient::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
        ));

        let stripe = config.stripe_api_key.as_ref().map(|key| {
            tracing::info!("Stripe integration enabled");
            Arc::new(StripeClient::new(
                key.clone(),
                config.stripe_webhook_secret.clone(),
                config.stripe_base_url.clone(),
            ))
        });
        if stripe.is_none() {
            tracing::warn!("Stripe not configured - checkout will not be available");
        }

        let artifacts = Arc::new(ArtifactStore::new(
            config.storage_base_url.clone(),
            config.storage_service_key.clone(),
            config.storage_bucket.clone(),
        ));

        let mut providers: Vec<Arc<dyn SimilarImageProvider>> = Vec::new();
        if let Some(google) = &config.google {
            tracing::info!(
                project_id = %google.project_id,
                "Google Vision search enabled"
            );
            let minter = TokenMinter::new(google.clone(), config.google_token_url.clone());
            providers.push(Arc::new(VisionClient::new(
                minter,
                config.vision_base_url.clone(),
            )));
        }
        if let Some(key) = &config.serpapi_key {
            tracing::info!("SerpAPI search enabled");
            providers.push(Arc::new(SerpClient::new(
                key.clone(),
                config.serpapi_base_url.clone(),
            )));
        }
        if providers.is_empty() {
            tracing::warn!("no similar-image providers configured - lookups will return empty");
        }
        let resolver = Arc::new(Resolver::new(providers));

        Self {
            store,
            config,
            openai,
            stripe,
            artifacts,
            resolver,
        }
    }

    /// Check if Stripe is configured.
    #[must_use]
    pub fn has_stripe(&self) -> bool {
        self.stripe.is_some()
    }
}
