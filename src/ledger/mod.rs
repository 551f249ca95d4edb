//! Ledger module containing account management and the transfer protocol

pub mod account;
pub mod core;
pub mod transfer;

pub use self::account::*;
pub use self::core::*;
pub use self::transfer::*;

use tracing::warn;

use crate::traits::StorageTransaction;

/// Roll back `tx`, logging instead of failing if the rollback itself errors
pub(crate) async fn rollback_quietly<T: StorageTransaction>(tx: T) {
    if let Err(err) = tx.rollback().await {
        warn!(error = %err, "rollback failed; transaction discarded on drop");
    }
}
