//! Core types and data structures for the card ledger

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A card account, the only persisted entity of the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Surrogate key assigned by storage
    pub id: i64,
    /// Card number: institutional prefix, random digits and a trailing check digit
    pub number: String,
    /// Fixed-length numeric PIN
    pub pin: String,
    /// Current balance in minor currency units, never negative
    pub balance: i64,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the balance last changed
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a fresh account record with a zero balance
    pub fn new(id: i64, number: String, pin: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            number,
            pin,
            balance: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this account can cover a debit of `amount`
    pub fn covers(&self, amount: i64) -> bool {
        amount > 0 && self.balance >= amount
    }
}

/// Outcome of a committed transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Card number that was debited
    pub sender: String,
    /// Card number that was credited
    pub recipient: String,
    /// Amount moved, in minor units
    pub amount: i64,
    /// When the transaction committed
    pub completed_at: NaiveDateTime,
}

/// Reasons a transfer can be rejected or abandoned.
///
/// The messages are the ones shown to the card holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("You can't transfer money to the same account!")]
    SameAccount,
    #[error("Probably you made a mistake in the card number. Please try again!")]
    InvalidRecipientFormat,
    #[error("Such a card does not exist.")]
    RecipientNotFound,
    #[error("Not enough money!")]
    InsufficientFunds,
    #[error("Transfer failed.")]
    TransferFailed,
}

/// Coarse classification of ledger errors, used by callers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range input; nothing was mutated
    Validation,
    /// No matching account
    NotFound,
    /// The sender cannot cover the amount
    InsufficientFunds,
    /// Duplicate key or a lost race; retry the whole operation
    Conflict,
    /// Infrastructure failure; re-fetch accounts before retrying
    Storage,
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Wrong card number or PIN")]
    AuthFailure,
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Duplicate card number: {0}")]
    DuplicateKey(String),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Map this error onto the recovery taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount(_) | LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::AuthFailure | LedgerError::AccountNotFound(_) => ErrorKind::NotFound,
            LedgerError::DuplicateKey(_) => ErrorKind::Conflict,
            LedgerError::Storage(_) => ErrorKind::Storage,
            LedgerError::Transfer(reason) => match reason {
                TransferError::SameAccount | TransferError::InvalidRecipientFormat => {
                    ErrorKind::Validation
                }
                TransferError::RecipientNotFound => ErrorKind::NotFound,
                TransferError::InsufficientFunds => ErrorKind::InsufficientFunds,
                TransferError::TransferFailed => ErrorKind::Conflict,
            },
        }
    }

    /// Whether retrying the whole operation from scratch may succeed
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// The transfer rejection reason, if this is one
    pub fn transfer_reason(&self) -> Option<TransferError> {
        match self {
            LedgerError::Transfer(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
