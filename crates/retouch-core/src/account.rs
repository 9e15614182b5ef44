//! User account types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A user account with its cached credit balance.
///
/// The balance is mutated only through the ledger gate (generation debits)
/// and the payment reconciler (purchase credits); the transaction log is the
/// source of truth and the balance must always equal the sum of deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// The user ID.
    pub user_id: UserId,

    /// Contact email for the account.
    pub email: String,

    /// Current credit balance. One generation costs one credit.
    pub credits: i64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    /// Create a new account with zero credits.
    #[must_use]
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            email: email.into(),
            credits: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the account can afford a deduction.
    #[must_use]
    pub fn has_sufficient_credits(&self, required: i64) -> bool {
        self.credits >= required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_has_zero_credits() {
        let account = UserAccount::new(UserId::generate(), "user@example.com");
        assert_eq!(account.credits, 0);
        assert_eq!(account.email, "user@example.com");
    }

    #[test]
    fn sufficient_credits_boundary() {
        let mut account = UserAccount::new(UserId::generate(), "user@example.com");
        account.credits = 1;

        assert!(account.has_sufficient_credits(1));
        assert!(!account.has_sufficient_credits(2));
    }
}
