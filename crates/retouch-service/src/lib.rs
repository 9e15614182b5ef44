//! Retouch HTTP API service.
//!
//! This crate provides the HTTP API for the retouch service, including:
//!
//! - Credit-gated image generation (analyze, prompt-build, generate, caption)
//! - Similar-image lookup with ordered provider fallback
//! - Credit purchase checkout and payment-completion webhooks
//! - Account, balance, and history endpoints
//!
//! # External collaborators
//!
//! The UI layer is an external collaborator: it calls the JSON endpoints and
//! renders what comes back. Every third-party service (image provider, search
//! providers, payment provider, object storage) is reached through a
//! dedicated client adapter constructed once at startup and shared through
//! [`AppState`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Some handlers need async only for the router

pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod media;
pub mod openai;
pub mod pipeline;
pub mod routes;
pub mod serp;
pub mod similar;
pub mod state;
pub mod storage;
pub mod stripe;
pub mod vision;

pub use config::{GoogleCredentials, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
