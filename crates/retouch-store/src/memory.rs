//! In-memory storage backend.
//!
//! Backs the default service build and the test suite. All ledger mutations
//! run under one mutex, so the authorize→settle conditional update is
//! trivially atomic.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;
use retouch_core::{CreditTransaction, GenerationRecord, UserAccount, UserId};

use crate::error::StoreError;
use crate::Store;

#[derive(Default)]
struct Inner {
    accounts: HashMap<UserId, UserAccount>,
    transactions: Vec<CreditTransaction>,
    generations: Vec<GenerationRecord>,
    settled_sessions: HashSet<String>,
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned mutex means a panic mid-mutation; recover the data
        // rather than cascading the panic into every handler.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Store for MemoryStore {
    fn create_account(&self, account: &UserAccount) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.accounts.contains_key(&account.user_id) {
            return Err(StoreError::AlreadyExists {
                user_id: account.user_id.to_string(),
            });
        }
        inner.accounts.insert(account.user_id, account.clone());
        Ok(())
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.lock().accounts.get(user_id).cloned())
    }

    fn authorize(&self, user_id: &UserId, required: i64) -> Result<i64, StoreError> {
        let inner = self.lock();
        let account = inner.accounts.get(user_id).ok_or_else(|| StoreError::NotFound {
            entity: "account",
            id: user_id.to_string(),
        })?;

        if account.credits < required {
            return Err(StoreError::InsufficientCredits {
                balance: account.credits,
                required,
            });
        }

        Ok(account.credits)
    }

    fn settle(&self, tx: &CreditTransaction) -> Result<i64, StoreError> {
        let mut inner = self.lock();

        if let Some(session_id) = &tx.session_id {
            if inner.settled_sessions.contains(session_id) {
                return Err(StoreError::DuplicateSession {
                    session_id: session_id.clone(),
                });
            }
        }

        let account =
            inner
                .accounts
                .get_mut(&tx.user_id)
                .ok_or_else(|| StoreError::NotFound {
                    entity: "account",
                    id: tx.user_id.to_string(),
                })?;

        let new_balance = account.credits + tx.delta;
        if new_balance < 0 {
            return Err(StoreError::InsufficientCredits {
                balance: account.credits,
                required: -tx.delta,
            });
        }
        if new_balance != tx.balance_after {
            // The balance moved since the caller's authorize read.
            return Err(StoreError::Conflict {
                user_id: tx.user_id.to_string(),
            });
        }

        account.credits = new_balance;
        account.updated_at = Utc::now();

        if let Some(session_id) = &tx.session_id {
            inner.settled_sessions.insert(session_id.clone());
        }
        inner.transactions.push(tx.clone());

        Ok(new_balance)
    }

    fn record_generation(&self, record: &GenerationRecord) -> Result<(), StoreError> {
        self.lock().generations.push(record.clone());
        Ok(())
    }

    fn list_generations(&self, user_id: &UserId) -> Result<Vec<GenerationRecord>, StoreError> {
        Ok(self
            .lock()
            .generations
            .iter()
            .filter(|g| g.user_id == *user_id)
            .cloned()
            .collect())
    }

    fn list_transactions(&self, user_id: &UserId) -> Result<Vec<CreditTransaction>, StoreError> {
        Ok(self
            .lock()
            .transactions
            .iter()
            .filter(|t| t.user_id == *user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded_account(store: &MemoryStore, credits: i64) -> UserId {
        let user_id = UserId::generate();
        let mut account = UserAccount::new(user_id, "test@example.com");
        account.credits = credits;
        store.create_account(&account).unwrap();
        user_id
    }

    #[test]
    fn authorize_rejects_missing_account() {
        let store = MemoryStore::new();
        let err = store.authorize(&UserId::generate(), 1).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn authorize_rejects_zero_balance() {
        let store = MemoryStore::new();
        let user_id = funded_account(&store, 0);

        let err = store.authorize(&user_id, 1).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientCredits {
                balance: 0,
                required: 1
            }
        ));
    }

    #[test]
    fn settle_debits_and_appends_transaction() {
        let store = MemoryStore::new();
        let user_id = funded_account(&store, 3);

        let tx = CreditTransaction::generation_debit(user_id, 2, "make the sky purple");
        let balance = store.settle(&tx).unwrap();

        assert_eq!(balance, 2);
        assert_eq!(store.get_account(&user_id).unwrap().unwrap().credits, 2);

        let txs = store.list_transactions(&user_id).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].delta, -1);
        assert_eq!(txs[0].balance_after, 2);
    }

    #[test]
    fn settle_rejects_stale_balance() {
        let store = MemoryStore::new();
        let user_id = funded_account(&store, 3);

        // Built against a stale read of the balance.
        let tx = CreditTransaction::generation_debit(user_id, 0, "prompt");
        let err = store.settle(&tx).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        // Nothing was applied.
        assert_eq!(store.get_account(&user_id).unwrap().unwrap().credits, 3);
        assert!(store.list_transactions(&user_id).unwrap().is_empty());
    }

    #[test]
    fn settle_rejects_overdraft() {
        let store = MemoryStore::new();
        let user_id = funded_account(&store, 0);

        let tx = CreditTransaction::generation_debit(user_id, -1, "prompt");
        let err = store.settle(&tx).unwrap_err();
        assert!(matches!(err, StoreError::InsufficientCredits { .. }));
    }

    #[test]
    fn only_one_of_two_competing_debits_succeeds() {
        let store = MemoryStore::new();
        let user_id = funded_account(&store, 1);

        // Two requests both authorized against balance 1.
        let first = CreditTransaction::generation_debit(user_id, 0, "first");
        let second = CreditTransaction::generation_debit(user_id, 0, "second");

        assert_eq!(store.settle(&first).unwrap(), 0);
        let err = store.settle(&second).unwrap_err();
        assert!(matches!(err, StoreError::InsufficientCredits { .. }));
        assert_eq!(store.list_transactions(&user_id).unwrap().len(), 1);
    }

    #[test]
    fn purchase_replay_settles_once() {
        let store = MemoryStore::new();
        let user_id = funded_account(&store, 0);

        let tx = CreditTransaction::purchase(user_id, 10, 10, 500, "cs_test_abc");
        assert_eq!(store.settle(&tx).unwrap(), 10);

        // Webhook redelivery: a fresh transaction for the same session.
        let replay = CreditTransaction::purchase(user_id, 10, 20, 500, "cs_test_abc");
        let err = store.settle(&replay).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSession { .. }));

        assert_eq!(store.get_account(&user_id).unwrap().unwrap().credits, 10);
        assert_eq!(store.list_transactions(&user_id).unwrap().len(), 1);
    }

    #[test]
    fn generations_are_listed_per_user() {
        let store = MemoryStore::new();
        let user_a = funded_account(&store, 0);
        let user_b = funded_account(&store, 0);

        store
            .record_generation(&GenerationRecord::failed(user_a, "one"))
            .unwrap();
        store
            .record_generation(&GenerationRecord::failed(user_b, "two"))
            .unwrap();

        assert_eq!(store.list_generations(&user_a).unwrap().len(), 1);
        assert_eq!(store.list_generations(&user_b).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_account_rejected() {
        let store = MemoryStore::new();
        let user_id = funded_account(&store, 0);

        let again = UserAccount::new(user_id, "other@example.com");
        let err = store.create_account(&again).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }
}
