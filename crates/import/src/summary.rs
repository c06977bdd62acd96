use std::collections::HashSet;

use ledgerline_core::DateRange;
use serde::Serialize;

use crate::pipeline::ImportResult;

/// Read-only reporting view over one import result. Every input row lands
/// in exactly one bucket (imported, duplicate, or rejected), so with zero
/// errors `total_processed == successful_imports + duplicates_skipped`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub total_processed: usize,
    pub successful_imports: usize,
    pub duplicates_skipped: usize,
    pub errors_count: usize,
    pub categorized_count: usize,
    /// Span of the imported transactions only; `None` when nothing imported.
    pub date_range: Option<DateRange>,
}

impl ImportSummary {
    pub fn from_result(result: &ImportResult) -> Self {
        // A row can carry several violations; it is still one rejected row.
        let rejected_rows: HashSet<usize> = result.errors.iter().map(|e| e.row).collect();

        ImportSummary {
            total_processed: result.imported_count
                + result.duplicates_skipped
                + rejected_rows.len(),
            successful_imports: result.imported_count,
            duplicates_skipped: result.duplicates_skipped,
            errors_count: result.errors.len(),
            categorized_count: result
                .transactions
                .iter()
                .filter(|tx| tx.category.is_some())
                .count(),
            date_range: DateRange::spanning(result.transactions.iter().map(|tx| tx.date)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use ledgerline_core::{
        AccountId, Direction, LedgerTransaction, Money, RowField, ValidationError,
    };

    fn stored(id: i64, date: (i32, u32, u32), category: Option<&str>) -> LedgerTransaction {
        let stamp = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        LedgerTransaction {
            id,
            account_id: AccountId(1),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            description: "tx".to_string(),
            amount: Money::from_cents(1000),
            direction: Direction::Debit,
            category: category.map(String::from),
            is_reconciled: false,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    fn result(
        transactions: Vec<LedgerTransaction>,
        duplicates_skipped: usize,
        errors: Vec<ValidationError>,
    ) -> ImportResult {
        ImportResult {
            success: errors.is_empty(),
            imported_count: transactions.len(),
            duplicates_skipped,
            errors,
            transactions,
        }
    }

    #[test]
    fn clean_result_partitions_exactly() {
        let summary = ImportSummary::from_result(&result(
            vec![stored(1, (2024, 1, 15), Some("Food & Dining")), stored(2, (2024, 1, 16), None)],
            3,
            vec![],
        ));
        assert_eq!(summary.total_processed, 5);
        assert_eq!(
            summary.total_processed,
            summary.successful_imports + summary.duplicates_skipped
        );
        assert_eq!(summary.categorized_count, 1);
        assert_eq!(summary.errors_count, 0);
    }

    #[test]
    fn multi_error_row_counts_once_in_total() {
        let errors = vec![
            ValidationError::new(0, RowField::Date, "Invalid date format"),
            ValidationError::new(0, RowField::Amount, "Amount must be greater than zero"),
            ValidationError::new(2, RowField::Description, "Description is required"),
        ];
        let summary = ImportSummary::from_result(&result(vec![stored(1, (2024, 1, 15), None)], 1, errors));
        // 1 imported + 1 duplicate + 2 distinct rejected rows.
        assert_eq!(summary.total_processed, 4);
        assert_eq!(summary.errors_count, 3);
    }

    #[test]
    fn date_range_covers_imported_rows_only() {
        let summary = ImportSummary::from_result(&result(
            vec![stored(1, (2024, 3, 10), None), stored(2, (2024, 1, 5), None)],
            0,
            vec![],
        ));
        let range = summary.date_range.unwrap();
        assert_eq!(range.earliest, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(range.latest, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn date_range_empty_when_nothing_imported() {
        let summary = ImportSummary::from_result(&result(vec![], 2, vec![]));
        assert_eq!(summary.date_range, None);
    }
}
