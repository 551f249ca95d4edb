//! Main ledger orchestrator that coordinates accounts and transfers

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::LedgerConfig;
use crate::ledger::{AccountManager, TransferManager};
use crate::traits::*;
use crate::types::*;

/// Main ledger system that the interactive shell talks to
pub struct Ledger<S: LedgerStorage, R: Rng = StdRng> {
    account_manager: AccountManager<S, R>,
    transfer_manager: TransferManager<S>,
}

impl<S: LedgerStorage + Clone> Ledger<S, StdRng> {
    /// Create a new ledger with the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            account_manager: AccountManager::new(storage.clone()),
            transfer_manager: TransferManager::new(storage),
        }
    }

    /// Create a ledger and make sure the accounts table exists
    pub async fn open(storage: S) -> LedgerResult<Self> {
        let ledger = Self::new(storage);
        ledger.migrate().await?;
        Ok(ledger)
    }
}

impl<S: LedgerStorage + Clone, R: Rng + Send> Ledger<S, R> {
    /// Create a new ledger with custom configuration and random source
    pub fn with_config(storage: S, config: LedgerConfig, rng: R) -> LedgerResult<Self> {
        Ok(Self {
            account_manager: AccountManager::with_config(storage.clone(), &config, rng)?,
            transfer_manager: TransferManager::new(storage),
        })
    }

    /// Create the accounts table if it is missing
    pub async fn migrate(&self) -> LedgerResult<bool> {
        self.account_manager.storage.migrate().await
    }

    // Account operations
    /// Issue a new card with a zero balance
    pub async fn create_account(&mut self) -> LedgerResult<Account> {
        self.account_manager.create_account().await
    }

    /// Log in with card number and PIN
    pub async fn authenticate(&self, number: &str, pin: &str) -> LedgerResult<Account> {
        self.account_manager.authenticate(number, pin).await
    }

    /// Current committed balance of a card
    pub async fn balance(&self, number: &str) -> LedgerResult<i64> {
        self.account_manager.balance(number).await
    }

    /// Re-read an account from storage
    pub async fn refresh(&self, account: &Account) -> LedgerResult<Account> {
        self.account_manager.refresh(account).await
    }

    /// Add income to an account
    pub async fn deposit(&mut self, account: &Account, amount: i64) -> LedgerResult<Account> {
        self.account_manager.deposit(account, amount).await
    }

    /// Close an account, forfeiting any remaining balance
    pub async fn close_account(&mut self, account: &Account) -> LedgerResult<()> {
        self.account_manager.close_account(account).await
    }

    // Transfer operations
    /// Validate a prospective recipient without moving funds
    pub async fn check_recipient(
        &self,
        sender_number: &str,
        recipient_number: &str,
    ) -> LedgerResult<Account> {
        self.transfer_manager
            .check_recipient(sender_number, recipient_number)
            .await
    }

    /// Move funds between two cards atomically
    pub async fn transfer(
        &self,
        sender_number: &str,
        recipient_number: &str,
        amount: i64,
    ) -> LedgerResult<TransferReceipt> {
        self.transfer_manager
            .transfer(sender_number, recipient_number, amount)
            .await
    }
}
