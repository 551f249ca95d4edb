//! # Banking Core
//!
//! A card-based ledger: issue cards with Luhn-checked numbers, log in with
//! card number and PIN, add income, transfer between cards and close
//! accounts, each as one atomic unit against a transactional store.
//!
//! ## Features
//!
//! - **Card identities**: prefix + random digits + check digit, with an injectable random source
//! - **Atomic transfers**: conditional debit and credit commit together or not at all
//! - **Storage abstraction**: backend-agnostic design with trait-based storage
//! - **Backends**: in-memory (with failure injection for tests) and SQLite
//!
//! ## Quick Start
//!
//! ```rust
//! use banking_core::{Ledger, utils::MemoryStorage};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut ledger = Ledger::open(MemoryStorage::new()).await.unwrap();
//!
//! let alice = ledger.create_account().await.unwrap();
//! let bob = ledger.create_account().await.unwrap();
//!
//! let alice = ledger.deposit(&alice, 100).await.unwrap();
//! ledger.transfer(&alice.number, &bob.number, 40).await.unwrap();
//!
//! assert_eq!(ledger.balance(&alice.number).await.unwrap(), 60);
//! assert_eq!(ledger.balance(&bob.number).await.unwrap(), 40);
//! # }
//! ```

pub mod checksum;
pub mod config;
pub mod identity;
pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use identity::{CardIdentity, IdentityGenerator};
pub use ledger::*;
pub use traits::*;
pub use types::*;
