use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ledgerline_core::{
    AccountId, LedgerStore, LedgerTransaction, StatementRow, StoreError, ValidationError,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::categorize::{categorize_rows, CategoryRuleSet};
use crate::dedupe::{detect_duplicates, DedupeOptions};
use crate::validate::{screen_rows, Screened};

#[derive(Debug, Error)]
pub enum ImportError {
    /// Caller error: nothing to import. Rejected before any work happens.
    #[error("import batch is empty")]
    EmptyBatch,
    /// Caller error: the target account does not exist.
    #[error("bank account not found: {0}")]
    AccountNotFound(AccountId),
    /// Fatal: the batch commit (or the snapshot read before it) failed.
    /// Nothing was persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The atomic outcome of one import run. `success` is true iff every row
/// cleared validation; duplicates are skips, not failures.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub success: bool,
    pub imported_count: usize,
    pub duplicates_skipped: usize,
    pub errors: Vec<ValidationError>,
    pub transactions: Vec<LedgerTransaction>,
}

/// One async mutex per account, created on first use. Serializes the
/// snapshot→detect→commit window per account so two concurrent imports
/// cannot both clear duplicate detection against a stale ledger; imports
/// against different accounts proceed concurrently.
#[derive(Default)]
struct AccountLocks {
    locks: std::sync::Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    async fn acquire(&self, account: AccountId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = match self.locks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            locks.entry(account).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Runs the whole pipeline: normalize → validate → categorize → duplicate
/// check → commit, one batch per call, one account per batch.
pub struct Importer<S> {
    store: S,
    rules: CategoryRuleSet,
    locks: AccountLocks,
}

impl<S: LedgerStore> Importer<S> {
    pub fn new(store: S) -> Self {
        Importer::with_rules(store, CategoryRuleSet::standard())
    }

    pub fn with_rules(store: S, rules: CategoryRuleSet) -> Self {
        Importer {
            store,
            rules,
            locks: AccountLocks::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rules(&self) -> &CategoryRuleSet {
        &self.rules
    }

    /// Import one batch into one account. Row-level validation failures are
    /// reported in the result, not raised; a storage failure aborts the
    /// whole batch with nothing persisted. Re-running an identical batch
    /// imports nothing and counts every row as a duplicate.
    pub async fn run(
        &self,
        account: AccountId,
        rows: &[StatementRow],
        options: &DedupeOptions,
    ) -> Result<ImportResult, ImportError> {
        if rows.is_empty() {
            return Err(ImportError::EmptyBatch);
        }
        if !self.store.account_exists(account).await? {
            return Err(ImportError::AccountNotFound(account));
        }

        let Screened { valid, errors } = screen_rows(rows);
        let pending: Vec<_> = valid.into_iter().map(|(_, tx)| tx).collect();
        let categorized = categorize_rows(&pending, &self.rules);

        // Hold the account lock across snapshot, detection, and commit so
        // the comparison window cannot go stale under a concurrent import.
        let _guard = self.locks.acquire(account).await;

        let existing = self.store.list_transactions(account).await?;
        let duplicate_indices = detect_duplicates(&categorized, &existing, options);
        let duplicates: HashSet<usize> = duplicate_indices.iter().copied().collect();

        let survivors: Vec<_> = categorized
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| !duplicates.contains(idx))
            .map(|(_, tx)| tx)
            .collect();

        let transactions = if survivors.is_empty() {
            Vec::new()
        } else {
            self.store.insert_batch(account, &survivors).await?
        };

        tracing::info!(
            account = %account,
            imported = transactions.len(),
            duplicates = duplicates.len(),
            rejected = errors.len(),
            "import batch committed"
        );

        Ok(ImportResult {
            success: errors.is_empty(),
            imported_count: transactions.len(),
            duplicates_skipped: duplicates.len(),
            errors,
            transactions,
        })
    }
}
