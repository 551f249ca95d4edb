//! SQLite storage backend
//!
//! One table, `cards`, keyed by a surrogate rowid with a unique card number.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::traits::*;
use crate::types::*;

/// Name of the accounts table
pub const TABLE_NAME: &str = "cards";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS cards (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        number TEXT NOT NULL UNIQUE,
        pin TEXT NOT NULL,
        balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const SELECT_COLUMNS: &str = "SELECT id, number, pin, balance, created_at, updated_at FROM cards";

/// Row type for the `cards` table
#[derive(Debug, Clone, sqlx::FromRow)]
struct AccountRow {
    id: i64,
    number: String,
    pin: String,
    balance: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            number: row.number,
            pin: row.pin,
            balance: row.balance,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// SQLite-backed ledger storage
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (and create if missing) the database file at `path`
    pub async fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl LedgerStorage for SqliteStorage {
    type Transaction = SqliteTransaction;

    async fn migrate(&self) -> LedgerResult<bool> {
        let existing: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(TABLE_NAME)
                .fetch_optional(&self.pool)
                .await?;

        if existing.is_some() {
            return Ok(false);
        }

        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        info!(table = TABLE_NAME, "created accounts table");
        Ok(true)
    }

    async fn begin(&self) -> LedgerResult<SqliteTransaction> {
        // Take the write lock up front: a deferred transaction that reads
        // before writing gets SQLITE_BUSY without waiting on busy_timeout
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(SqliteTransaction { tx })
    }

    async fn get_account(&self, id: i64) -> LedgerResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Account::from))
    }

    async fn find_by_number(&self, number: &str) -> LedgerResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{SELECT_COLUMNS} WHERE number = ?"))
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Account::from))
    }
}

/// An open SQLite transaction
pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl StorageTransaction for SqliteTransaction {
    async fn insert_account(&mut self, number: &str, pin: &str) -> LedgerResult<Account> {
        let now = chrono::Utc::now().naive_utc();
        let result = sqlx::query(
            "INSERT INTO cards (number, pin, balance, created_at, updated_at) VALUES (?, ?, 0, ?, ?)",
        )
        .bind(number)
        .bind(pin)
        .bind(now)
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                LedgerError::DuplicateKey(number.to_string())
            } else {
                LedgerError::from(err)
            }
        })?;

        Ok(Account {
            id: result.last_insert_rowid(),
            number: number.to_string(),
            pin: pin.to_string(),
            balance: 0,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_number(&mut self, number: &str) -> LedgerResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{SELECT_COLUMNS} WHERE number = ?"))
            .bind(number)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Account::from))
    }

    async fn debit_if_covered(&mut self, number: &str, amount: i64) -> LedgerResult<u64> {
        let result = sqlx::query(
            "UPDATE cards SET balance = balance - ?, updated_at = ? WHERE number = ? AND balance >= ?",
        )
        .bind(amount)
        .bind(chrono::Utc::now().naive_utc())
        .bind(number)
        .bind(amount)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn credit(&mut self, number: &str, amount: i64) -> LedgerResult<u64> {
        // SQLite silently widens overflowing integers to REAL, so cap explicitly
        let ceiling = i64::MAX.saturating_sub(amount);
        let result = sqlx::query(
            "UPDATE cards SET balance = balance + ?, updated_at = ? WHERE number = ? AND balance <= ?",
        )
        .bind(amount)
        .bind(chrono::Utc::now().naive_utc())
        .bind(number)
        .bind(ceiling)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 && self.find_by_number(number).await?.is_some() {
            return Err(LedgerError::Storage(format!(
                "balance overflow on card {number}"
            )));
        }
        Ok(result.rows_affected())
    }

    async fn delete_account(&mut self, id: i64) -> LedgerResult<u64> {
        let result = sqlx::query("DELETE FROM cards WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self) -> LedgerResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> LedgerResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
