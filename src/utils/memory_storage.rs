//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::traits::*;
use crate::types::*;

/// Storage operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Insert,
    Debit,
    Credit,
    Delete,
    Commit,
}

/// Committed rows plus the id sequence
#[derive(Debug, Clone, Default)]
struct Snapshot {
    accounts: BTreeMap<i64, Account>,
    next_id: i64,
}

impl Snapshot {
    fn by_number(&self, number: &str) -> Option<&Account> {
        self.accounts.values().find(|account| account.number == number)
    }

    fn by_number_mut(&mut self, number: &str) -> Option<&mut Account> {
        self.accounts
            .values_mut()
            .find(|account| account.number == number)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    data: Snapshot,
    faults: HashSet<FailurePoint>,
}

/// In-memory storage implementation for testing and development
///
/// Clones share the same state. A transaction holds the state lock until it
/// commits or rolls back, so transactions are fully serialized.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.data = Snapshot::default();
        state.faults.clear();
    }

    /// Number of committed accounts
    pub async fn account_count(&self) -> usize {
        self.state.lock().await.data.accounts.len()
    }

    /// Make the next transactional call of this kind fail with a storage error
    pub async fn fail_on(&self, point: FailurePoint) {
        self.state.lock().await.faults.insert(point);
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    type Transaction = MemoryTransaction;

    async fn migrate(&self) -> LedgerResult<bool> {
        Ok(false)
    }

    async fn begin(&self) -> LedgerResult<MemoryTransaction> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.data.clone();
        Ok(MemoryTransaction { guard, staged })
    }

    async fn get_account(&self, id: i64) -> LedgerResult<Option<Account>> {
        Ok(self.state.lock().await.data.accounts.get(&id).cloned())
    }

    async fn find_by_number(&self, number: &str) -> LedgerResult<Option<Account>> {
        Ok(self.state.lock().await.data.by_number(number).cloned())
    }
}

/// Transaction over [`MemoryStorage`]: writes go to a staged copy that
/// replaces the committed state on commit
#[derive(Debug)]
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: Snapshot,
}

impl MemoryTransaction {
    fn trip(&mut self, point: FailurePoint) -> LedgerResult<()> {
        if self.guard.faults.remove(&point) {
            Err(LedgerError::Storage(format!("injected {point:?} failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StorageTransaction for MemoryTransaction {
    async fn insert_account(&mut self, number: &str, pin: &str) -> LedgerResult<Account> {
        self.trip(FailurePoint::Insert)?;

        if self.staged.by_number(number).is_some() {
            return Err(LedgerError::DuplicateKey(number.to_string()));
        }

        self.staged.next_id += 1;
        let account = Account::new(self.staged.next_id, number.to_string(), pin.to_string());
        self.staged.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_number(&mut self, number: &str) -> LedgerResult<Option<Account>> {
        Ok(self.staged.by_number(number).cloned())
    }

    async fn debit_if_covered(&mut self, number: &str, amount: i64) -> LedgerResult<u64> {
        self.trip(FailurePoint::Debit)?;

        match self.staged.by_number_mut(number) {
            Some(account) if account.balance >= amount => {
                account.balance -= amount;
                account.updated_at = chrono::Utc::now().naive_utc();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn credit(&mut self, number: &str, amount: i64) -> LedgerResult<u64> {
        self.trip(FailurePoint::Credit)?;

        match self.staged.by_number_mut(number) {
            Some(account) => {
                account.balance = account.balance.checked_add(amount).ok_or_else(|| {
                    LedgerError::Storage(format!("balance overflow on card {number}"))
                })?;
                account.updated_at = chrono::Utc::now().naive_utc();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_account(&mut self, id: i64) -> LedgerResult<u64> {
        self.trip(FailurePoint::Delete)?;
        Ok(u64::from(self.staged.accounts.remove(&id).is_some()))
    }

    async fn commit(self) -> LedgerResult<()> {
        let MemoryTransaction { mut guard, staged } = self;
        if guard.faults.remove(&FailurePoint::Commit) {
            return Err(LedgerError::Storage(
                "injected Commit failure".to_string(),
            ));
        }
        guard.data = staged;
        Ok(())
    }

    async fn rollback(self) -> LedgerResult<()> {
        Ok(())
    }
}
