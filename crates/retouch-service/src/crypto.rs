//! Cryptographic utilities for webhook verification.
//!
//! The payment provider signs webhook deliveries with HMAC-SHA256 over
//! `"{timestamp}.{body}"` and sends `t=<timestamp>,v1=<hex>` in the signature
//! header. Verification recomputes the MAC and compares in constant time.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Reject webhook timestamps older or newer than this many seconds.
const SIGNATURE_TOLERANCE_SECONDS: i64 = 300;

/// Signature verification failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The header carried no `t=` element.
    #[error("signature header missing timestamp")]
    MissingTimestamp,

    /// The header carried no `v1=` element.
    #[error("signature header missing signature")]
    MissingSignature,

    /// The timestamp is outside the accepted window.
    #[error("signature timestamp outside tolerance")]
    StaleTimestamp,

    /// No `v1` candidate matched the expected MAC.
    #[error("signature mismatch")]
    Mismatch,
}

/// Compute HMAC-SHA256 and return the hex-encoded result.
///
/// # Panics
///
/// Never panics in practice: HMAC-SHA256 accepts keys of any size per
/// RFC 2104, so `new_from_slice` only fails if the implementation is broken.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Verify a payment-provider webhook signature header against the raw body.
///
/// # Errors
///
/// Returns a [`SignatureError`] describing the first check that failed. The
/// caller maps any failure to an HTTP 400 and must not retry.
pub fn verify_webhook_signature(
    body: &str,
    header: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    verify_webhook_signature_at(body, header, secret, Utc::now().timestamp())
}

/// Timestamp-injectable form of [`verify_webhook_signature`].
pub fn verify_webhook_signature_at(
    body: &str,
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for element in header.split(',') {
        match element.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if candidates.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    let expected = hmac_sha256_hex(secret, &format!("{timestamp}.{body}"));
    if !candidates.iter().any(|c| constant_time_eq(c, &expected)) {
        return Err(SignatureError::Mismatch);
    }

    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECONDS {
        return Err(SignatureError::StaleTimestamp);
    }

    Ok(())
}
