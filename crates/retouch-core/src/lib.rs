//! Core types for the retouch platform.
//!
//! This crate provides the foundational types used throughout the retouch
//! service:
//!
//! - **Identifiers**: [`UserId`], [`TransactionId`], [`GenerationId`]
//! - **Accounts**: [`UserAccount`]
//! - **Credits**: [`CreditTransaction`], [`TransactionType`]
//! - **Generations**: [`GenerationRecord`], [`GenerationStatus`]
//!
//! # Credit unit
//!
//! **1 credit = 1 image generation.** Credits are purchased in packs via the
//! payment provider and stored as `i64` to keep ledger arithmetic exact.
//! The balance on the account is a cached value; the transaction log is the
//! source of truth for reconciliation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod credits;
pub mod generation;
pub mod ids;

pub use account::UserAccount;
pub use credits::{CreditTransaction, TransactionStatus, TransactionType};
pub use generation::{GenerationRecord, GenerationStatus};
pub use ids::{GenerationId, IdError, TransactionId, UserId};
