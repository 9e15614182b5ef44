//! Storage layer for the retouch service.
//!
//! This crate provides the [`Store`] trait — the credit ledger gate plus
//! account, generation, and transaction persistence — and two backends:
//!
//! - [`MemoryStore`]: always available; used by the test suite and the
//!   default service build.
//! - `RocksStore`: durable RocksDB backend behind the `rocksdb-backend`
//!   feature (requires libclang at build time).
//!
//! # Ledger semantics
//!
//! The balance cached on the account row is authoritative only together
//! with the transaction log: `settle` applies a signed delta and appends
//! exactly one transaction in a single atomic step. Callers follow the
//! authorize→settle pair: read the balance, build a transaction whose
//! `balance_after` reflects that read, then settle. If the account changed
//! in between, settle fails with [`StoreError::Conflict`] and the caller
//! retries the pair. Payment-backed credits are idempotent per session
//! reference: replaying a settled session fails with
//! [`StoreError::DuplicateSession`] and changes nothing.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use retouch_core::{CreditTransaction, GenerationRecord, UserAccount, UserId};

/// Storage operations shared by all backends.
pub trait Store: Send + Sync {
    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if the user already has one.
    fn create_account(&self, account: &UserAccount) -> Result<(), StoreError>;

    /// Fetch an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure; a missing account is `None`.
    fn get_account(&self, user_id: &UserId) -> Result<Option<UserAccount>, StoreError>;

    /// Check that the user can afford `required` credits and return the
    /// current balance. Performs no mutation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the account does not exist and
    /// [`StoreError::InsufficientCredits`] if the balance is too low.
    fn authorize(&self, user_id: &UserId, required: i64) -> Result<i64, StoreError>;

    /// Atomically apply a signed credit delta and append the transaction
    /// record. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the account balance no longer
    /// matches the transaction's expected `balance_after` (the caller must
    /// retry the authorize→settle pair), [`StoreError::InsufficientCredits`]
    /// when the delta would drive the balance negative, and
    /// [`StoreError::DuplicateSession`] when the transaction's payment
    /// session was already settled.
    fn settle(&self, tx: &CreditTransaction) -> Result<i64, StoreError>;

    /// Append a generation record.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    fn record_generation(&self, record: &GenerationRecord) -> Result<(), StoreError>;

    /// List a user's generation records in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    fn list_generations(&self, user_id: &UserId) -> Result<Vec<GenerationRecord>, StoreError>;

    /// List a user's ledger transactions in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    fn list_transactions(&self, user_id: &UserId) -> Result<Vec<CreditTransaction>, StoreError>;
}

/// Run the authorize→settle pair with bounded retries on ledger conflicts.
///
/// `build` receives the freshly read balance and must return a transaction
/// whose `balance_after` reflects it. Each conflict triggers a re-read; any
/// other outcome (success, insufficient credits, duplicate session) is
/// returned as-is.
///
/// # Errors
///
/// Propagates store errors; returns the last [`StoreError::Conflict`] when
/// every attempt lost its race.
pub fn settle_with_retry<F>(
    store: &dyn Store,
    user_id: &UserId,
    attempts: u32,
    build: F,
) -> Result<i64, StoreError>
where
    F: Fn(i64) -> CreditTransaction,
{
    for attempt in 0..attempts {
        let account = store
            .get_account(user_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "account",
                id: user_id.to_string(),
            })?;

        match store.settle(&build(account.credits)) {
            Err(StoreError::Conflict { .. }) => {
                tracing::debug!(user_id = %user_id, attempt, "settle conflict, retrying");
            }
            other => return other,
        }
    }

    Err(StoreError::Conflict {
        user_id: user_id.to_string(),
    })
}
