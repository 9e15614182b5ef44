//! `RocksDB` storage backend.
//!
//! Rows are CBOR-encoded. Per-user history lives behind `user_id ||
//! record_id` index keys; record IDs are ULIDs, so a prefix scan yields
//! chronological order for free.
//!
//! `RocksDB` gives no multi-key transactions in the API surface we use, so
//! all ledger writes serialize behind one mutex; the conditional
//! balance-check update in [`RocksStore::settle`] is atomic with respect to
//! other settles.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;

use retouch_core::{CreditTransaction, GenerationRecord, UserAccount, UserId};

use crate::error::StoreError;
use crate::schema::{self, cf};
use crate::Store;

/// `RocksDB`-backed store.
pub struct RocksStore {
    db: DB,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open (or create) a database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs: Vec<ColumnFamilyDescriptor> = schema::all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path, cfs)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn cf(&self, name: &'static str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("missing column family: {name}")))
    }

    fn get<T: DeserializeOwned>(
        &self,
        cf_name: &'static str,
        key: &[u8],
    ) -> Result<Option<T>, StoreError> {
        let cf = self.cf(cf_name)?;
        match self
            .db
            .get_cf(cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
        {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan_by_user<T: DeserializeOwned>(
        &self,
        index_cf: &'static str,
        record_cf: &'static str,
        user_id: &UserId,
    ) -> Result<Vec<T>, StoreError> {
        let index = self.cf(index_cf)?;
        let prefix: &[u8] = user_id.as_ref();

        let mut out = Vec::new();
        for item in self
            .db
            .iterator_cf(index, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            let record_key = &key[prefix.len()..];
            if let Some(record) = self.get::<T>(record_cf, record_key)? {
                out.push(record);
            }
        }
        Ok(out)
    }

    fn put_account_row(&self, account: &UserAccount) -> Result<(), StoreError> {
        let cf = self.cf(cf::ACCOUNTS)?;
        self.db
            .put_cf(cf, account.user_id, encode(account)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl Store for RocksStore {
    fn create_account(&self, account: &UserAccount) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        if self
            .get::<UserAccount>(cf::ACCOUNTS, account.user_id.as_ref())?
            .is_some()
        {
            return Err(StoreError::AlreadyExists {
                user_id: account.user_id.to_string(),
            });
        }
        self.put_account_row(account)
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<UserAccount>, StoreError> {
        self.get(cf::ACCOUNTS, user_id.as_ref())
    }

    fn authorize(&self, user_id: &UserId, required: i64) -> Result<i64, StoreError> {
        let account = self
            .get_account(user_id)?
            .ok_or_else(|| StoreError::NotFound {
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
        let _guard = self.write_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(session_id) = &tx.session_id {
            let sessions = self.cf(cf::PAYMENT_SESSIONS)?;
            let seen = self
                .db
                .get_cf(sessions, session_id.as_bytes())
                .map_err(|e| StoreError::Database(e.to_string()))?;
            if seen.is_some() {
                return Err(StoreError::DuplicateSession {
                    session_id: session_id.clone(),
                });
            }
        }

        let mut account = self
            .get::<UserAccount>(cf::ACCOUNTS, tx.user_id.as_ref())?
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
            return Err(StoreError::Conflict {
                user_id: tx.user_id.to_string(),
            });
        }

        account.credits = new_balance;
        account.updated_at = Utc::now();

        let tx_key = tx.id.to_bytes();
        let mut index_key = Vec::with_capacity(32);
        index_key.extend_from_slice(tx.user_id.as_ref());
        index_key.extend_from_slice(&tx_key);

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(cf::ACCOUNTS)?, tx.user_id, encode(&account)?);
        batch.put_cf(self.cf(cf::TRANSACTIONS)?, tx_key, encode(tx)?);
        batch.put_cf(self.cf(cf::TRANSACTIONS_BY_USER)?, index_key, b"");
        if let Some(session_id) = &tx.session_id {
            batch.put_cf(self.cf(cf::PAYMENT_SESSIONS)?, session_id.as_bytes(), tx_key);
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(new_balance)
    }

    fn record_generation(&self, record: &GenerationRecord) -> Result<(), StoreError> {
        let record_key = record.id.to_bytes();
        let mut index_key = Vec::with_capacity(32);
        index_key.extend_from_slice(record.user_id.as_ref());
        index_key.extend_from_slice(&record_key);

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(cf::GENERATIONS)?, record_key, encode(record)?);
        batch.put_cf(self.cf(cf::GENERATIONS_BY_USER)?, index_key, b"");

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_generations(&self, user_id: &UserId) -> Result<Vec<GenerationRecord>, StoreError> {
        self.scan_by_user(cf::GENERATIONS_BY_USER, cf::GENERATIONS, user_id)
    }

    fn list_transactions(&self, user_id: &UserId) -> Result<Vec<CreditTransaction>, StoreError> {
        self.scan_by_user(cf::TRANSACTIONS_BY_USER, cf::TRANSACTIONS, user_id)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    ciborium::de::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let store = RocksStore::open(dir.path()).expect("open store");
        (store, dir)
    }

    #[test]
    fn account_roundtrip() {
        let (store, _dir) = open_store();
        let user_id = UserId::generate();
        let mut account = UserAccount::new(user_id, "rocks@example.com");
        account.credits = 5;

        store.create_account(&account).unwrap();
        let loaded = store.get_account(&user_id).unwrap().unwrap();
        assert_eq!(loaded.credits, 5);
        assert_eq!(loaded.email, "rocks@example.com");
    }

    #[test]
    fn settle_and_history() {
        let (store, _dir) = open_store();
        let user_id = UserId::generate();
        let mut account = UserAccount::new(user_id, "rocks@example.com");
        account.credits = 2;
        store.create_account(&account).unwrap();

        let tx = CreditTransaction::generation_debit(user_id, 1, "prompt");
        assert_eq!(store.settle(&tx).unwrap(), 1);

        let txs = store.list_transactions(&user_id).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].balance_after, 1);
    }

    #[test]
    fn session_idempotency_survives_reopen() {
        let dir = TempDir::new().expect("temp dir");
        let user_id = UserId::generate();

        {
            let store = RocksStore::open(dir.path()).unwrap();
            store
                .create_account(&UserAccount::new(user_id, "rocks@example.com"))
                .unwrap();
            let tx = CreditTransaction::purchase(user_id, 10, 10, 500, "cs_reopen");
            store.settle(&tx).unwrap();
        }

        let store = RocksStore::open(dir.path()).unwrap();
        let replay = CreditTransaction::purchase(user_id, 10, 20, 500, "cs_reopen");
        let err = store.settle(&replay).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSession { .. }));
    }
}
