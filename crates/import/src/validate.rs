use ledgerline_core::{NormalizedRow, PendingTransaction, RowField, StatementRow, ValidationError};
use serde::Serialize;

use crate::normalize::{normalize_rows, parse_date};

/// The complete rule report for one batch. `is_valid` is true iff no row
/// violated any rule; the error list covers every violation on every row so
/// a single preview round-trip shows the caller everything to fix.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Outcome of screening a batch: the typed rows that cleared all three
/// rules, paired with their original input indices, plus every violation
/// found.
pub struct Screened {
    pub valid: Vec<(usize, PendingTransaction)>,
    pub errors: Vec<ValidationError>,
}

/// Validate a raw batch for preview. Pure; nothing is persisted.
pub fn validate_rows(rows: &[StatementRow]) -> ValidationReport {
    let screened = screen_rows(rows);
    ValidationReport {
        is_valid: screened.errors.is_empty(),
        errors: screened.errors,
    }
}

/// Normalize and screen a raw batch in one pass.
pub fn screen_rows(rows: &[StatementRow]) -> Screened {
    screen_normalized(&normalize_rows(rows))
}

/// Evaluate all three rules independently on every row. A row with any
/// violation is excluded from the valid subset but never stops the batch.
pub(crate) fn screen_normalized(rows: &[NormalizedRow]) -> Screened {
    let mut valid = Vec::new();
    let mut errors = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        let date = parse_date(&row.date);
        if date.is_none() {
            errors.push(ValidationError::new(idx, RowField::Date, "Invalid date format"));
        }
        if !row.amount.is_positive() {
            errors.push(ValidationError::new(
                idx,
                RowField::Amount,
                "Amount must be greater than zero",
            ));
        }
        if row.description.trim().is_empty() {
            errors.push(ValidationError::new(
                idx,
                RowField::Description,
                "Description is required",
            ));
        }

        if let Some(date) = date {
            if row.amount.is_positive() && !row.description.trim().is_empty() {
                valid.push((
                    idx,
                    PendingTransaction {
                        date,
                        description: row.description.clone(),
                        amount: row.amount,
                        direction: row.direction,
                        category: row.category.clone(),
                    },
                ));
            }
        }
    }

    Screened { valid, errors }
}
