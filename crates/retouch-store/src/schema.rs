//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Account records, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Ledger transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by user, keyed by `user_id || transaction_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";

    /// Generation records, keyed by `generation_id` (ULID).
    pub const GENERATIONS: &str = "generations";

    /// Index: generations by user, keyed by `user_id || generation_id`.
    pub const GENERATIONS_BY_USER: &str = "generations_by_user";

    /// Settled payment sessions for idempotency, keyed by session reference.
    pub const PAYMENT_SESSIONS: &str = "payment_sessions";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
        cf::GENERATIONS,
        cf::GENERATIONS_BY_USER,
        cf::PAYMENT_SESSIONS,
    ]
}
