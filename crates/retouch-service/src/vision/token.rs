//! Bearer-token minting for the signed-request search provider.
//!
//! Google Cloud APIs authenticate service accounts via the OAuth JWT-bearer
//! grant: build a claim set, sign it with the account's RSA key (RS256), and
//! exchange the assertion for a short-lived bearer token. Tokens are valid
//! for exactly 3600 seconds; we cache them for their validity window and
//! refresh 60 seconds early so a token never expires mid-request.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::GoogleCredentials;

/// Token lifetime requested in the assertion, in seconds.
const TOKEN_TTL_SECONDS: i64 = 3600;

/// Refresh this many seconds before the cached token expires.
const REFRESH_MARGIN_SECONDS: i64 = 60;

/// OAuth scope for the Vision API.
const VISION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-vision";

/// JWT-bearer grant type.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Errors from token minting.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The configured private key is not a usable RSA PEM.
    #[error("invalid service-account key: {0}")]
    InvalidKey(String),

    /// Assertion signing failed.
    #[error("failed to sign assertion: {0}")]
    Signing(String),

    /// The token endpoint rejected the exchange.
    #[error("token exchange failed: {status} - {message}")]
    Exchange {
        /// HTTP status code.
        status: u16,
        /// Endpoint error message (internal use only).
        message: String,
    },

    /// Network or protocol failure.
    #[error("token request failed: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    sub: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Mints and caches bearer tokens from a service-account credential.
pub struct TokenMinter {
    http: reqwest::Client,
    credentials: GoogleCredentials,
    token_url: String,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenMinter {
    /// Create a minter for the given credential bundle.
    ///
    /// The credential bundle is validated for completeness at configuration
    /// load; a partially configured bundle never reaches this point.
    #[must_use]
    pub fn new(credentials: GoogleCredentials, token_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            token_url: token_url.into(),
            cached: RwLock::new(None),
        }
    }

    /// Return a bearer token, minting a fresh one if the cache is empty or
    /// inside the refresh margin.
    ///
    /// # Errors
    ///
    /// Fails when signing or the token exchange fails.
    pub async fn bearer_token(&self) -> Result<String, TokenError> {
        let now = Utc::now();

        if let Some(cached) = self.cached.read().await.as_ref() {
            if is_fresh(cached.expires_at, now) {
                return Ok(cached.token.clone());
            }
        }

        let minted = self.mint(now).await?;
        let token = minted.token.clone();
        *self.cached.write().await = Some(minted);

        tracing::debug!("minted fresh Vision bearer token");
        Ok(token)
    }

    async fn mint(&self, now: DateTime<Utc>) -> Result<CachedToken, TokenError> {
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;

        let claims = build_claims(&self.credentials.client_email, &self.token_url, now);
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        let response = self
            .http
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TokenError::Exchange {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response.json().await?;
        let ttl = token.expires_in.unwrap_or(TOKEN_TTL_SECONDS);

        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(ttl),
        })
    }
}

fn build_claims(client_email: &str, token_url: &str, now: DateTime<Utc>) -> Claims {
    Claims {
        iss: client_email.to_string(),
        sub: client_email.to_string(),
        scope: VISION_SCOPE.to_string(),
        aud: token_url.to_string(),
        iat: now.timestamp(),
        exp: now.timestamp() + TOKEN_TTL_SECONDS,
    }
}

fn is_fresh(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at - Duration::seconds(REFRESH_MARGIN_SECONDS) > now
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_carry_issuer_subject_and_audience() {
        let now = Utc::now();
        let claims = build_claims(
            "svc@project.iam.gserviceaccount.com",
            "https://oauth2.googleapis.com/token",
            now,
        );

        assert_eq!(claims.iss, claims.sub);
        assert_eq!(claims.iss, "svc@project.iam.gserviceaccount.com");
        assert_eq!(claims.aud, "https://oauth2.googleapis.com/token");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECONDS);
        assert_eq!(claims.scope, VISION_SCOPE);
    }

    #[test]
    fn token_is_stale_inside_refresh_margin() {
        let now = Utc::now();

        assert!(is_fresh(now + Duration::seconds(3600), now));
        assert!(is_fresh(now + Duration::seconds(61), now));
        assert!(!is_fresh(now + Duration::seconds(60), now));
        assert!(!is_fresh(now - Duration::seconds(1), now));
    }

    #[test]
    fn garbage_key_is_rejected_before_any_network_call() {
        let minter = TokenMinter::new(
            GoogleCredentials {
                client_email: "svc@project.iam.gserviceaccount.com".into(),
                private_key: "not a pem".into(),
                project_id: "project".into(),
            },
            "https://oauth2.googleapis.com/token",
        );

        let err = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(minter.bearer_token())
            .unwrap_err();
        assert!(matches!(err, TokenError::InvalidKey(_)));
    }
}
