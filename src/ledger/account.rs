//! Account management: creation, authentication, deposits and closure

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::{LedgerConfig, DEFAULT_MAX_CREATE_ATTEMPTS};
use crate::identity::IdentityGenerator;
use crate::ledger::rollback_quietly;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{validate_numeric, validate_positive_amount};

/// Account manager for card lifecycle operations
pub struct AccountManager<S: LedgerStorage, R: Rng = StdRng> {
    pub(crate) storage: S,
    identities: IdentityGenerator,
    max_attempts: u32,
    rng: R,
}

impl<S: LedgerStorage> AccountManager<S, StdRng> {
    /// Create a new account manager with the default configuration and an
    /// entropy-seeded random source
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            identities: IdentityGenerator::default(),
            max_attempts: DEFAULT_MAX_CREATE_ATTEMPTS,
            rng: StdRng::from_entropy(),
        }
    }
}

impl<S: LedgerStorage, R: Rng + Send> AccountManager<S, R> {
    /// Create a new account manager with custom configuration and random source
    pub fn with_config(storage: S, config: &LedgerConfig, rng: R) -> LedgerResult<Self> {
        Ok(Self {
            storage,
            identities: IdentityGenerator::new(config)?,
            max_attempts: config.max_create_attempts,
            rng,
        })
    }

    /// Issue a new card with a zero balance.
    ///
    /// A number collision is retried with a fresh identity; only when every
    /// attempt collides is [`LedgerError::DuplicateKey`] returned.
    pub async fn create_account(&mut self) -> LedgerResult<Account> {
        let mut last_number = String::new();

        for attempt in 1..=self.max_attempts {
            let identity = self.identities.new_identity(&mut self.rng)?;
            let mut tx = self.storage.begin().await?;

            match tx.insert_account(&identity.number, &identity.pin).await {
                Ok(account) => {
                    tx.commit().await?;
                    info!(number = %account.number, id = account.id, "account created");
                    return Ok(account);
                }
                Err(LedgerError::DuplicateKey(number)) => {
                    rollback_quietly(tx).await;
                    debug!(%number, attempt, "card number collision, retrying");
                    last_number = number;
                }
                Err(err) => {
                    rollback_quietly(tx).await;
                    return Err(err);
                }
            }
        }

        Err(LedgerError::DuplicateKey(last_number))
    }

    /// Look up a card by number and PIN.
    ///
    /// A malformed number, an unknown number and a wrong PIN all produce the
    /// same [`LedgerError::AuthFailure`]. Lengths are not checked against the
    /// current configuration, so cards issued under an earlier one still work.
    pub async fn authenticate(&self, number: &str, pin: &str) -> LedgerResult<Account> {
        if validate_numeric(number, "Card number").is_err()
            || validate_numeric(pin, "PIN").is_err()
        {
            return Err(LedgerError::AuthFailure);
        }

        match self.storage.find_by_number(number).await? {
            Some(account) if account.pin == pin => {
                debug!(number = %account.number, "authenticated");
                Ok(account)
            }
            _ => Err(LedgerError::AuthFailure),
        }
    }

    /// Get an account by number, returning an error if not found
    pub async fn get_account_required(&self, number: &str) -> LedgerResult<Account> {
        self.storage
            .find_by_number(number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(number.to_string()))
    }

    /// Re-read an account from storage
    pub async fn refresh(&self, account: &Account) -> LedgerResult<Account> {
        self.get_account_required(&account.number).await
    }

    /// Current committed balance of a card
    pub async fn balance(&self, number: &str) -> LedgerResult<i64> {
        Ok(self.get_account_required(number).await?.balance)
    }

    /// Add income to an account. Returns the updated record.
    pub async fn deposit(&mut self, account: &Account, amount: i64) -> LedgerResult<Account> {
        validate_positive_amount(amount)?;

        let mut tx = self.storage.begin().await?;
        let updated = match Self::apply_deposit(&mut tx, &account.number, amount).await {
            Ok(updated) => updated,
            Err(err) => {
                rollback_quietly(tx).await;
                return Err(err);
            }
        };
        tx.commit().await?;

        info!(number = %updated.number, amount, balance = updated.balance, "income added");
        Ok(updated)
    }

    async fn apply_deposit(
        tx: &mut S::Transaction,
        number: &str,
        amount: i64,
    ) -> LedgerResult<Account> {
        if tx.credit(number, amount).await? == 0 {
            return Err(LedgerError::AccountNotFound(number.to_string()));
        }

        tx.find_by_number(number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(number.to_string()))
    }

    /// Close an account. Any remaining balance is forfeited.
    pub async fn close_account(&mut self, account: &Account) -> LedgerResult<()> {
        let mut tx = self.storage.begin().await?;

        let forfeited = match Self::apply_close(&mut tx, account).await {
            Ok(forfeited) => forfeited,
            Err(err) => {
                rollback_quietly(tx).await;
                return Err(err);
            }
        };
        tx.commit().await?;

        info!(number = %account.number, forfeited, "account closed");
        Ok(())
    }

    async fn apply_close(tx: &mut S::Transaction, account: &Account) -> LedgerResult<i64> {
        let current = tx
            .find_by_number(&account.number)
            .await?
            .filter(|current| current.id == account.id)
            .ok_or_else(|| LedgerError::AccountNotFound(account.number.clone()))?;

        if tx.delete_account(current.id).await? == 0 {
            return Err(LedgerError::AccountNotFound(account.number.clone()));
        }

        Ok(current.balance)
    }
}
