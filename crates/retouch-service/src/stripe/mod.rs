//! Stripe integration for credit purchases.
//!
//! Stripe handles:
//! - Hosted checkout sessions for credit packs
//! - Payment-completion webhooks (verified and reconciled in
//!   [`crate::handlers::webhooks`])

pub mod client;
pub mod types;

pub use client::{StripeClient, StripeError};
