use async_trait::async_trait;
use thiserror::Error;

use super::account::AccountId;
use super::transaction::{LedgerTransaction, PendingTransaction};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bank account not found: {0}")]
    AccountNotFound(AccountId),
    #[error("storage backend: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// The ledger persistence seam. The import engine only ever talks to the
/// store through this trait, so tests run against a fixed in-memory fixture
/// and the server runs against SQLite.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn account_exists(&self, account: AccountId) -> Result<bool, StoreError>;

    /// Every committed transaction for the account, the comparison window
    /// for duplicate detection.
    async fn list_transactions(
        &self,
        account: AccountId,
    ) -> Result<Vec<LedgerTransaction>, StoreError>;

    /// Persist the batch all-or-nothing: on any failure no row is recorded
    /// and the error is returned. Returns the stored rows with ids and
    /// timestamps assigned, in input order.
    async fn insert_batch(
        &self,
        account: AccountId,
        rows: &[PendingTransaction],
    ) -> Result<Vec<LedgerTransaction>, StoreError>;
}
