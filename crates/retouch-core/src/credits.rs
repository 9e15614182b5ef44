//! Credit transaction types.
//!
//! Every balance change appends one transaction record. The records form an
//! append-only audit trail: `balance_after` on the newest record must equal
//! the account's cached balance, and the sum of deltas reconstructs it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TransactionId, UserId};

/// Cost of a single generation, in credits.
pub const GENERATION_COST_CREDITS: i64 = 1;

/// A ledger transaction representing one balance change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose balance was affected.
    pub user_id: UserId,

    /// Signed credit delta. Positive = credit, negative = debit.
    pub delta: i64,

    /// Balance after this transaction was applied.
    pub balance_after: i64,

    /// Monetary amount in cents, for payment-backed credits. `None` for
    /// generation debits and administrative grants.
    pub amount_cents: Option<i64>,

    /// External payment-session reference. Settles at most once per session:
    /// this is the idempotency key for webhook replays.
    pub session_id: Option<String>,

    /// Type of transaction.
    pub kind: TransactionType,

    /// Settlement status.
    pub status: TransactionStatus,

    /// Human-readable description.
    pub description: String,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    /// Create a debit transaction for one completed generation.
    #[must_use]
    pub fn generation_debit(user_id: UserId, balance_after: i64, prompt: &str) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            delta: -GENERATION_COST_CREDITS,
            balance_after,
            amount_cents: None,
            session_id: None,
            kind: TransactionType::GenerationDebit,
            status: TransactionStatus::Completed,
            description: format!("Image generation: {}", truncate(prompt, 80)),
            created_at: Utc::now(),
        }
    }

    /// Create a credit transaction for a completed payment session.
    #[must_use]
    pub fn purchase(
        user_id: UserId,
        credits: i64,
        balance_after: i64,
        amount_cents: i64,
        session_id: impl Into<String>,
    ) -> Self {
        let session_id = session_id.into();
        Self {
            id: TransactionId::generate(),
            user_id,
            delta: credits,
            balance_after,
            amount_cents: Some(amount_cents),
            session_id: Some(session_id),
            kind: TransactionType::Purchase,
            status: TransactionStatus::Completed,
            description: format!(
                "Purchased {credits} credits (${:.2})",
                cents_to_dollars(amount_cents)
            ),
            created_at: Utc::now(),
        }
    }

    /// Create an administrative credit grant.
    #[must_use]
    pub fn grant(user_id: UserId, credits: i64, balance_after: i64, reason: String) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            delta: credits,
            balance_after,
            amount_cents: None,
            session_id: None,
            kind: TransactionType::Grant,
            status: TransactionStatus::Completed,
            description: reason,
            created_at: Utc::now(),
        }
    }
}

/// Settlement status of a transaction.
///
/// The ledger only appends settled transactions, so records are `Completed`
/// at creation; `Reversed` is reserved for compensating entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// The transaction was applied to the balance.
    Completed,

    /// The transaction was compensated by a later reversal.
    Reversed,
}

/// Type of credit transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Credits deducted for a completed generation.
    GenerationDebit,

    /// User purchased credits through the payment provider.
    Purchase,

    /// Administrative/promotional credit grant.
    Grant,
}

impl TransactionType {
    /// Check whether this transaction type adds credits.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Purchase | Self::Grant)
    }

    /// Check whether this transaction type removes credits.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::GenerationDebit)
    }
}

#[allow(clippy::cast_precision_loss)]
fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
