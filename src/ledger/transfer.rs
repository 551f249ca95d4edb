//! The transfer protocol
//!
//! Checks run cheapest first: self-transfer, recipient checksum, recipient
//! existence, sender funds. Only then is a storage transaction opened, in
//! which the sender is debited conditionally and the recipient credited. If
//! either write touches no row the whole transaction is rolled back.

use tracing::{info, warn};

use crate::checksum;
use crate::ledger::rollback_quietly;
use crate::traits::*;
use crate::types::*;

/// Transfer manager moving funds between two cards
pub struct TransferManager<S: LedgerStorage> {
    storage: S,
}

impl<S: LedgerStorage> TransferManager<S> {
    /// Create a new transfer manager
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Run the recipient checks of the protocol without moving any money.
    ///
    /// Lets an interactive caller reject a bad card number before asking for
    /// an amount. [`TransferManager::transfer`] repeats these checks.
    pub async fn check_recipient(
        &self,
        sender_number: &str,
        recipient_number: &str,
    ) -> LedgerResult<Account> {
        if recipient_number == sender_number {
            return Err(TransferError::SameAccount.into());
        }

        if !checksum::is_valid(recipient_number) {
            return Err(TransferError::InvalidRecipientFormat.into());
        }

        self.storage
            .find_by_number(recipient_number)
            .await?
            .ok_or(LedgerError::Transfer(TransferError::RecipientNotFound))
    }

    /// Move `amount` from the sender card to the recipient card
    pub async fn transfer(
        &self,
        sender_number: &str,
        recipient_number: &str,
        amount: i64,
    ) -> LedgerResult<TransferReceipt> {
        let recipient = self
            .check_recipient(sender_number, recipient_number)
            .await?;

        let sender = self
            .storage
            .find_by_number(sender_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(sender_number.to_string()))?;

        if !sender.covers(amount) {
            return Err(TransferError::InsufficientFunds.into());
        }

        self.execute(&sender.number, &recipient.number, amount)
            .await?;

        info!(
            sender = %sender.number,
            recipient = %recipient.number,
            amount,
            "transfer committed"
        );

        Ok(TransferReceipt {
            sender: sender.number,
            recipient: recipient.number,
            amount,
            completed_at: chrono::Utc::now().naive_utc(),
        })
    }

    /// Debit and credit inside one transaction
    async fn execute(&self, sender: &str, recipient: &str, amount: i64) -> LedgerResult<()> {
        let mut tx = match self.storage.begin().await {
            Ok(tx) => tx,
            Err(err) => {
                warn!(error = %err, "cannot open transfer transaction");
                return Err(TransferError::TransferFailed.into());
            }
        };

        if let Err(err) = Self::move_funds(&mut tx, sender, recipient, amount).await {
            warn!(error = %err, %sender, %recipient, amount, "transfer rolled back");
            rollback_quietly(tx).await;
            return Err(TransferError::TransferFailed.into());
        }

        if let Err(err) = tx.commit().await {
            warn!(error = %err, %sender, %recipient, amount, "transfer commit failed");
            return Err(TransferError::TransferFailed.into());
        }

        Ok(())
    }

    async fn move_funds(
        tx: &mut S::Transaction,
        sender: &str,
        recipient: &str,
        amount: i64,
    ) -> LedgerResult<()> {
        if tx.debit_if_covered(sender, amount).await? == 0 {
            return Err(LedgerError::Validation(format!(
                "insufficient balance or sender {sender} not found"
            )));
        }

        if tx.credit(recipient, amount).await? == 0 {
            return Err(LedgerError::AccountNotFound(recipient.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::{FailurePoint, MemoryStorage, MemoryTransaction};
    use async_trait::async_trait;

    /// A write committed by another client between the transfer's prechecks
    /// and its transaction
    #[derive(Clone, Copy)]
    enum Interleaved {
        Debit(&'static str, i64),
        Delete(&'static str),
    }

    /// Storage that commits `interleaved` just before handing out a transaction
    #[derive(Clone)]
    struct InterleavingStorage {
        inner: MemoryStorage,
        interleaved: Interleaved,
    }

    #[async_trait]
    impl LedgerStorage for InterleavingStorage {
        type Transaction = MemoryTransaction;

        async fn migrate(&self) -> LedgerResult<bool> {
            self.inner.migrate().await
        }

        async fn begin(&self) -> LedgerResult<MemoryTransaction> {
            let mut other = self.inner.begin().await?;
            match self.interleaved {
                Interleaved::Debit(number, amount) => {
                    other.debit_if_covered(number, amount).await?;
                }
                Interleaved::Delete(number) => {
                    if let Some(account) = other.find_by_number(number).await? {
                        other.delete_account(account.id).await?;
                    }
                }
            }
            other.commit().await?;
            self.inner.begin().await
        }

        async fn get_account(&self, id: i64) -> LedgerResult<Option<Account>> {
            self.inner.get_account(id).await
        }

        async fn find_by_number(&self, number: &str) -> LedgerResult<Option<Account>> {
            self.inner.find_by_number(number).await
        }
    }

    async fn seed(storage: &MemoryStorage, number: &str, balance: i64) -> Account {
        let mut tx = storage.begin().await.unwrap();
        let account = tx.insert_account(number, "1234").await.unwrap();
        if balance > 0 {
            tx.credit(number, balance).await.unwrap();
        }
        tx.commit().await.unwrap();
        storage.find_by_number(&account.number).await.unwrap().unwrap()
    }

    async fn balance(storage: &MemoryStorage, number: &str) -> i64 {
        storage.find_by_number(number).await.unwrap().unwrap().balance
    }

    const ALICE: &str = "4000008449433403";
    const BOB: &str = "4000001234567899";

    #[tokio::test]
    async fn test_transfer_moves_funds() {
        let storage = MemoryStorage::new();
        seed(&storage, ALICE, 100).await;
        seed(&storage, BOB, 5).await;
        let transfers = TransferManager::new(storage.clone());

        let receipt = transfers.transfer(ALICE, BOB, 40).await.unwrap();
        assert_eq!(receipt.amount, 40);
        assert_eq!(receipt.sender, ALICE);
        assert_eq!(receipt.recipient, BOB);

        assert_eq!(balance(&storage, ALICE).await, 60);
        assert_eq!(balance(&storage, BOB).await, 45);
    }

    #[tokio::test]
    async fn test_whole_balance_can_be_sent() {
        let storage = MemoryStorage::new();
        seed(&storage, ALICE, 100).await;
        seed(&storage, BOB, 0).await;
        let transfers = TransferManager::new(storage.clone());

        transfers.transfer(ALICE, BOB, 100).await.unwrap();
        assert_eq!(balance(&storage, ALICE).await, 0);
        assert_eq!(balance(&storage, BOB).await, 100);
    }

    #[tokio::test]
    async fn test_same_account_rejected_regardless_of_balance() {
        let storage = MemoryStorage::new();
        seed(&storage, ALICE, 100).await;
        let transfers = TransferManager::new(storage.clone());

        for amount in [1, 100, 1_000] {
            let err = transfers.transfer(ALICE, ALICE, amount).await.unwrap_err();
            assert_eq!(err.transfer_reason(), Some(TransferError::SameAccount));
        }
        assert_eq!(balance(&storage, ALICE).await, 100);
    }

    #[tokio::test]
    async fn test_invalid_recipient_checksum() {
        let storage = MemoryStorage::new();
        seed(&storage, ALICE, 100).await;
        let transfers = TransferManager::new(storage.clone());

        for recipient in ["4000008449433404", "", "40000084494334x3"] {
            let err = transfers.transfer(ALICE, recipient, 10).await.unwrap_err();
            assert_eq!(
                err.transfer_reason(),
                Some(TransferError::InvalidRecipientFormat)
            );
        }
    }

    #[tokio::test]
    async fn test_recipient_not_found() {
        let storage = MemoryStorage::new();
        seed(&storage, ALICE, 100).await;
        let transfers = TransferManager::new(storage.clone());

        let err = transfers.transfer(ALICE, BOB, 10).await.unwrap_err();
        assert_eq!(err.transfer_reason(), Some(TransferError::RecipientNotFound));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(balance(&storage, ALICE).await, 100);
    }

    #[tokio::test]
    async fn test_insufficient_funds() {
        let storage = MemoryStorage::new();
        seed(&storage, ALICE, 30).await;
        seed(&storage, BOB, 0).await;
        let transfers = TransferManager::new(storage.clone());

        for amount in [31, 0, -5] {
            let err = transfers.transfer(ALICE, BOB, amount).await.unwrap_err();
            assert_eq!(err.transfer_reason(), Some(TransferError::InsufficientFunds));
        }
        assert_eq!(balance(&storage, ALICE).await, 30);
        assert_eq!(balance(&storage, BOB).await, 0);
    }

    #[tokio::test]
    async fn test_failed_credit_rolls_back_debit() {
        let storage = MemoryStorage::new();
        seed(&storage, ALICE, 100).await;
        seed(&storage, BOB, 0).await;
        let transfers = TransferManager::new(storage.clone());

        storage.fail_on(FailurePoint::Credit).await;
        let err = transfers.transfer(ALICE, BOB, 40).await.unwrap_err();
        assert_eq!(err.transfer_reason(), Some(TransferError::TransferFailed));
        assert!(err.is_retryable());

        assert_eq!(balance(&storage, ALICE).await, 100);
        assert_eq!(balance(&storage, BOB).await, 0);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_balances_unchanged() {
        let storage = MemoryStorage::new();
        seed(&storage, ALICE, 100).await;
        seed(&storage, BOB, 0).await;
        let transfers = TransferManager::new(storage.clone());

        storage.fail_on(FailurePoint::Commit).await;
        let err = transfers.transfer(ALICE, BOB, 40).await.unwrap_err();
        assert_eq!(err.transfer_reason(), Some(TransferError::TransferFailed));

        assert_eq!(balance(&storage, ALICE).await, 100);
        assert_eq!(balance(&storage, BOB).await, 0);

        // Nothing sticky: a retry from scratch succeeds
        transfers.transfer(ALICE, BOB, 40).await.unwrap();
        assert_eq!(balance(&storage, ALICE).await, 60);
        assert_eq!(balance(&storage, BOB).await, 40);
    }

    #[tokio::test]
    async fn test_sender_drained_after_precheck_rolls_back() {
        let storage = MemoryStorage::new();
        seed(&storage, ALICE, 100).await;
        seed(&storage, BOB, 0).await;
        let transfers = TransferManager::new(InterleavingStorage {
            inner: storage.clone(),
            interleaved: Interleaved::Debit(ALICE, 80),
        });

        // 100 covers 50 at precheck time, the conditional debit then sees 20
        let err = transfers.transfer(ALICE, BOB, 50).await.unwrap_err();
        assert_eq!(err.transfer_reason(), Some(TransferError::TransferFailed));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        assert_eq!(balance(&storage, ALICE).await, 20);
        assert_eq!(balance(&storage, BOB).await, 0);
    }

    #[tokio::test]
    async fn test_recipient_deleted_after_precheck_rolls_back_debit() {
        let storage = MemoryStorage::new();
        seed(&storage, ALICE, 100).await;
        seed(&storage, BOB, 0).await;
        let transfers = TransferManager::new(InterleavingStorage {
            inner: storage.clone(),
            interleaved: Interleaved::Delete(BOB),
        });

        let err = transfers.transfer(ALICE, BOB, 40).await.unwrap_err();
        assert_eq!(err.transfer_reason(), Some(TransferError::TransferFailed));

        // The debit ran before the credit found no row; it must not survive
        assert_eq!(balance(&storage, ALICE).await, 100);
        assert!(storage.find_by_number(BOB).await.unwrap().is_none());
        assert_eq!(storage.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_check_recipient() {
        let storage = MemoryStorage::new();
        seed(&storage, ALICE, 0).await;
        let bob = seed(&storage, BOB, 0).await;
        let transfers = TransferManager::new(storage.clone());

        assert_eq!(transfers.check_recipient(ALICE, BOB).await.unwrap(), bob);
        assert_eq!(
            transfers
                .check_recipient(ALICE, ALICE)
                .await
                .unwrap_err()
                .transfer_reason(),
            Some(TransferError::SameAccount)
        );
    }
}
