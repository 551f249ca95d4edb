//! Traits for storage abstraction

use async_trait::async_trait;

use crate::types::*;

/// Storage abstraction for the ledger system
///
/// This trait allows the ledger to work with any transactional backend
/// (SQLite, in-memory, etc.). Reads outside a transaction see committed
/// state only; every mutation goes through [`StorageTransaction`].
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Transaction handle produced by [`LedgerStorage::begin`]
    type Transaction: StorageTransaction;

    /// Create the accounts table if it is missing. Returns whether it was created.
    async fn migrate(&self) -> LedgerResult<bool>;

    /// Open a new transaction
    async fn begin(&self) -> LedgerResult<Self::Transaction>;

    /// Get an account by surrogate id
    async fn get_account(&self, id: i64) -> LedgerResult<Option<Account>>;

    /// Get an account by its unique card number
    async fn find_by_number(&self, number: &str) -> LedgerResult<Option<Account>>;
}

/// A unit of work against the store.
///
/// Writes become visible to other readers only after [`commit`]. Dropping a
/// transaction without committing discards its writes.
///
/// [`commit`]: StorageTransaction::commit
#[async_trait]
pub trait StorageTransaction: Send {
    /// Insert a new zero-balance account. Fails with [`LedgerError::DuplicateKey`]
    /// when the number is already taken.
    async fn insert_account(&mut self, number: &str, pin: &str) -> LedgerResult<Account>;

    /// Get an account by card number, including writes made in this transaction
    async fn find_by_number(&mut self, number: &str) -> LedgerResult<Option<Account>>;

    /// Subtract `amount` from the account only if its balance still covers it.
    /// Returns the number of rows changed.
    async fn debit_if_covered(&mut self, number: &str, amount: i64) -> LedgerResult<u64>;

    /// Add `amount` to the account. Returns the number of rows changed.
    async fn credit(&mut self, number: &str, amount: i64) -> LedgerResult<u64>;

    /// Remove the account. Returns the number of rows removed.
    async fn delete_account(&mut self, id: i64) -> LedgerResult<u64>;

    /// Make every write of this transaction visible atomically
    async fn commit(self) -> LedgerResult<()>;

    /// Discard every write of this transaction
    async fn rollback(self) -> LedgerResult<()>;
}
