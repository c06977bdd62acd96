use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::account::AccountId;
use super::money::Money;

/// Whether a statement row moves money out of (debit) or into (credit)
/// the bank account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Debit => write!(f, "debit"),
            Direction::Credit => write!(f, "credit"),
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(Direction::Debit),
            "credit" => Ok(Direction::Credit),
            other => Err(format!("unknown direction: '{other}'")),
        }
    }
}

/// One tabular row as handed over by the statement extractor. The date is
/// whatever text the export contained; nothing here is trusted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementRow {
    pub date: String,
    pub description: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub direction: Direction,
}

/// A statement row after normalization: trimmed text, magnitude-only amount,
/// date re-rendered to ISO when it parses (malformed text passes through so
/// the validator can report it at the original row index).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub date: String,
    pub description: String,
    pub amount: Money,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub category: Option<String>,
}

/// A row that cleared validation: fully typed, ready for categorization,
/// duplicate detection, and commit. Lives only for the duration of one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub category: Option<String>,
}

/// A committed transaction as the ledger stores it. Never mutated by the
/// import engine after creation; reconciliation happens elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: i64,
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub category: Option<String>,
    pub is_reconciled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which field of a statement row failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowField {
    Date,
    Amount,
    Description,
}

impl fmt::Display for RowField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowField::Date => write!(f, "date"),
            RowField::Amount => write!(f, "amount"),
            RowField::Description => write!(f, "description"),
        }
    }
}

/// One rule violation on one row. Reported, never thrown: offending rows are
/// dropped from the batch while the rest import normally.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("row {row}: {field}: {message}")]
pub struct ValidationError {
    pub row: usize,
    pub field: RowField,
    pub message: String,
}

impl ValidationError {
    pub fn new(row: usize, field: RowField, message: &str) -> Self {
        ValidationError {
            row,
            field,
            message: message.to_string(),
        }
    }
}
