use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_core::{
    AccountId, BankAccount, Direction, LedgerStore, LedgerTransaction, Money,
    PendingTransaction, StoreError,
};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    connect(&format!("sqlite:{}?mode=rwc", path.display())).await
}

/// Private in-memory database, one per call. Used by tests and dry runs.
pub async fn create_db_in_memory() -> Result<DbPool, sqlx::Error> {
    connect("sqlite::memory:").await
}

async fn connect(url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(url)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bank_accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            number_suffix TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bank_account_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            direction TEXT NOT NULL,
            category TEXT,
            is_reconciled INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (bank_account_id) REFERENCES bank_accounts(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_account_date
         ON transactions(bank_account_id, date)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_account(pool: &DbPool, account: &BankAccount) -> Result<BankAccount, sqlx::Error> {
    let row = sqlx::query(
        "INSERT INTO bank_accounts (name, number_suffix) VALUES (?, ?)
         RETURNING id, name, number_suffix, created_at",
    )
    .bind(&account.name)
    .bind(&account.number_suffix)
    .fetch_one(pool)
    .await?;

    Ok(account_from_row(&row)?)
}

pub async fn get_account(pool: &DbPool, id: AccountId) -> Result<Option<BankAccount>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, name, number_suffix, created_at FROM bank_accounts WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    row.map(|r| account_from_row(&r)).transpose()
}

fn account_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<BankAccount, sqlx::Error> {
    let created: String = row.get("created_at");
    Ok(BankAccount {
        id: Some(AccountId(row.get("id"))),
        name: row.get("name"),
        number_suffix: row.get("number_suffix"),
        // SQLite's datetime('now') has no offset; treat it as UTC.
        created_at: DateTime::parse_from_rfc3339(&created)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                chrono::NaiveDateTime::parse_from_str(&created, "%Y-%m-%d %H:%M:%S")
                    .map(|naive| naive.and_utc())
                    .ok()
            }),
    })
}

/// SQLite-backed ledger store. Cheap to clone; all clones share the pool.
#[derive(Clone)]
pub struct SqliteLedger {
    pool: DbPool,
}

impl SqliteLedger {
    pub fn new(pool: DbPool) -> Self {
        SqliteLedger { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn transaction_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<LedgerTransaction, StoreError> {
    let date: String = row.get("date");
    let direction: String = row.get("direction");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let reconciled: i64 = row.get("is_reconciled");

    Ok(LedgerTransaction {
        id: row.get("id"),
        account_id: AccountId(row.get("bank_account_id")),
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(StoreError::backend)?,
        description: row.get("description"),
        amount: Money::from_cents(row.get("amount_cents")),
        direction: Direction::from_str(&direction).map_err(StoreError::Backend)?,
        category: row.get("category"),
        is_reconciled: reconciled != 0,
        created_at: parse_stamp(&created_at)?,
        updated_at: parse_stamp(&updated_at)?,
    })
}

fn parse_stamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(StoreError::backend)
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn account_exists(&self, account: AccountId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM bank_accounts WHERE id = ?")
            .bind(account.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(row.is_some())
    }

    async fn list_transactions(
        &self,
        account: AccountId,
    ) -> Result<Vec<LedgerTransaction>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, bank_account_id, date, description, amount_cents, direction,
                    category, is_reconciled, created_at, updated_at
             FROM transactions WHERE bank_account_id = ?
             ORDER BY date, id",
        )
        .bind(account.0)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn insert_batch(
        &self,
        account: AccountId,
        rows: &[PendingTransaction],
    ) -> Result<Vec<LedgerTransaction>, StoreError> {
        let mut db_tx = self.pool.begin().await.map_err(StoreError::backend)?;
        let now = Utc::now().to_rfc3339();
        let mut stored = Vec::with_capacity(rows.len());

        // Single SQL transaction: an error on any row rolls back every
        // prior insert when `db_tx` drops.
        for row in rows {
            let inserted = sqlx::query(
                "INSERT INTO transactions
                     (bank_account_id, date, description, amount_cents, direction,
                      category, is_reconciled, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
                 RETURNING id, bank_account_id, date, description, amount_cents,
                           direction, category, is_reconciled, created_at, updated_at",
            )
            .bind(account.0)
            .bind(row.date.to_string())
            .bind(&row.description)
            .bind(row.amount.to_cents())
            .bind(row.direction.to_string())
            .bind(&row.category)
            .bind(&now)
            .bind(&now)
            .fetch_one(&mut *db_tx)
            .await
            .map_err(StoreError::backend)?;

            stored.push(transaction_from_row(&inserted)?);
        }

        db_tx.commit().await.map_err(StoreError::backend)?;
        tracing::debug!(account = %account, rows = stored.len(), "batch persisted");

        Ok(stored)
    }
}
