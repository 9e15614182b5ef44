//! Storage error types.

/// Errors produced by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("account", "generation", ...).
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// The account already exists.
    #[error("account already exists: {user_id}")]
    AlreadyExists {
        /// The user ID that already has an account.
        user_id: String,
    },

    /// Insufficient credits for a debit.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// The account changed between the authorize read and the settle write.
    #[error("ledger conflict for user {user_id}: balance moved during settle")]
    Conflict {
        /// The user whose settle lost the race.
        user_id: String,
    },

    /// The payment session was already settled (idempotent replay).
    #[error("payment session already settled: {session_id}")]
    DuplicateSession {
        /// The replayed session reference.
        session_id: String,
    },

    /// Backend failure.
    #[error("database error: {0}")]
    Database(String),

    /// Row encoding/decoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}
