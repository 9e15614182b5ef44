//! Stripe API client.
//!
//! The Stripe API is form-encoded; nested fields use bracket syntax
//! (`line_items[0][price]`). Only the operations this service needs are
//! implemented: creating checkout sessions and verifying webhook signatures.

use crate::crypto::{self, SignatureError};
use crate::stripe::types::{CheckoutSession, StripeErrorResponse};

/// Errors from the Stripe API.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// The API returned a non-success status.
    #[error("Stripe API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Provider error message (internal use only).
        message: String,
    },

    /// Network or protocol failure.
    #[error("Stripe request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Webhook signature verification failed.
    #[error("webhook signature verification failed: {0}")]
    Signature(#[from] SignatureError),

    /// Signature verification requested without a configured secret.
    #[error("webhook secret not configured")]
    NoWebhookSecret,
}

/// Stripe API client.
pub struct StripeClient {
    http: reqwest::Client,
    api_key: String,
    webhook_secret: Option<String>,
    base_url: String,
}

impl StripeClient {
    /// Create a client against the given Stripe API base URL.
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        webhook_secret: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            webhook_secret,
            base_url: base_url.into(),
        }
    }

    /// Whether a webhook signing secret is configured.
    #[must_use]
    pub fn has_webhook_secret(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// Create a hosted checkout session for a credit pack.
    ///
    /// `{userId, credits}` are embedded as session metadata so the webhook
    /// reconciler can credit the right account later.
    ///
    /// # Errors
    ///
    /// Fails on network or API errors.
    pub async fn create_checkout_session(
        &self,
        user_id: &str,
        price_id: &str,
        credits: i64,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let credits = credits.to_string();
        let params: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("client_reference_id", user_id),
            ("metadata[userId]", user_id),
            ("metadata[credits]", &credits),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.api_key)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorResponse>(&text)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(text);
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Verify a webhook signature header against the raw delivery body.
    ///
    /// # Errors
    ///
    /// Fails when no secret is configured or the signature does not check
    /// out; either way the delivery must be rejected with a 4xx.
    pub fn verify_webhook_signature(&self, body: &str, header: &str) -> Result<(), StripeError> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or(StripeError::NoWebhookSecret)?;

        crypto::verify_webhook_signature(body, header, secret)?;
        Ok(())
    }
}
