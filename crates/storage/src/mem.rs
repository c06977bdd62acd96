use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use ledgerline_core::{
    AccountId, BankAccount, LedgerStore, LedgerTransaction, PendingTransaction, StoreError,
};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, BankAccount>,
    transactions: Vec<LedgerTransaction>,
    next_account_id: i64,
    next_transaction_id: i64,
    fail_inserts: bool,
}

/// In-memory ledger store. The deterministic fixture for engine tests and
/// dry runs; behaves like the SQLite store, including all-or-nothing
/// batches.
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        MemoryLedger::default()
    }

    pub async fn add_account(&self, name: &str) -> AccountId {
        let mut inner = self.inner.write().await;
        inner.next_account_id += 1;
        let id = AccountId(inner.next_account_id);
        inner.accounts.insert(
            id,
            BankAccount {
                id: Some(id),
                name: name.to_string(),
                number_suffix: None,
                created_at: Some(Utc::now()),
            },
        );
        id
    }

    /// Make every subsequent `insert_batch` fail with a backend error,
    /// persisting nothing. For exercising commit-failure paths.
    pub async fn fail_inserts(&self, fail: bool) {
        self.inner.write().await.fail_inserts = fail;
    }

    pub async fn transaction_count(&self, account: AccountId) -> usize {
        self.inner
            .read()
            .await
            .transactions
            .iter()
            .filter(|tx| tx.account_id == account)
            .count()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn account_exists(&self, account: AccountId) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.accounts.contains_key(&account))
    }

    async fn list_transactions(
        &self,
        account: AccountId,
    ) -> Result<Vec<LedgerTransaction>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .transactions
            .iter()
            .filter(|tx| tx.account_id == account)
            .cloned()
            .collect())
    }

    async fn insert_batch(
        &self,
        account: AccountId,
        rows: &[PendingTransaction],
    ) -> Result<Vec<LedgerTransaction>, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.fail_inserts {
            return Err(StoreError::Backend("simulated write failure".to_string()));
        }
        if !inner.accounts.contains_key(&account) {
            return Err(StoreError::AccountNotFound(account));
        }

        let now = Utc::now();
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            inner.next_transaction_id += 1;
            stored.push(LedgerTransaction {
                id: inner.next_transaction_id,
                account_id: account,
                date: row.date,
                description: row.description.clone(),
                amount: row.amount,
                direction: row.direction,
                category: row.category.clone(),
                is_reconciled: false,
                created_at: now,
                updated_at: now,
            });
        }

        // Single write-lock scope: either the whole batch lands or none of it.
        inner.transactions.extend(stored.iter().cloned());
        Ok(stored)
    }
}
