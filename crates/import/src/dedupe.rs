use ledgerline_core::{LedgerTransaction, PendingTransaction};
use serde::{Deserialize, Serialize};

use crate::util::levenshtein_distance;

/// Descriptions scoring at or above this are treated as the same merchant
/// string when fuzzy matching is on.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DedupeOptions {
    /// Also treat same-date same-amount rows with merely similar
    /// descriptions as duplicates. Off by default: exact matching alone can
    /// never skip a legitimately distinct transaction.
    pub fuzzy_match: bool,
    pub similarity_threshold: f32,
}

impl Default for DedupeOptions {
    fn default() -> Self {
        DedupeOptions {
            fuzzy_match: false,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl DedupeOptions {
    pub fn fuzzy() -> Self {
        DedupeOptions {
            fuzzy_match: true,
            ..DedupeOptions::default()
        }
    }
}

/// Indices (ascending, each at most once) of incoming rows already present
/// in the existing window. The caller supplies `existing` scoped to one
/// bank account; rows from other accounts must not be in the slice.
pub fn detect_duplicates(
    incoming: &[PendingTransaction],
    existing: &[LedgerTransaction],
    options: &DedupeOptions,
) -> Vec<usize> {
    incoming
        .iter()
        .enumerate()
        .filter(|(_, row)| existing.iter().any(|prior| is_duplicate(row, prior, options)))
        .map(|(idx, _)| idx)
        .collect()
}

fn is_duplicate(
    row: &PendingTransaction,
    prior: &LedgerTransaction,
    options: &DedupeOptions,
) -> bool {
    // Date and amount must match exactly in both modes; fuzziness only ever
    // applies to the description text.
    if prior.date != row.date || prior.amount != row.amount {
        return false;
    }
    if prior.description == row.description {
        return true;
    }
    options.fuzzy_match
        && description_similarity(&row.description, &prior.description)
            >= options.similarity_threshold
}

/// Similarity of two merchant strings in [0.0, 1.0], after normalization.
/// Takes the better of edit-distance similarity and token overlap, since
/// statement truncation hurts the former and token reordering the latter.
pub(crate) fn description_similarity(s1: &str, s2: &str) -> f32 {
    let a = normalize_merchant(s1);
    let b = normalize_merchant(s2);

    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    edit_similarity(&a, &b).max(token_overlap(&a, &b))
}

/// Lowercase, split on non-alphanumerics, drop pure-digit tokens (statement
/// reference numbers like "#123" vary per export and say nothing about the
/// merchant), rejoin with single spaces.
fn normalize_merchant(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !w.chars().all(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn edit_similarity(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein_distance(a, b) as f32 / max_len as f32)
}

/// Overlap coefficient over whitespace tokens: |A ∩ B| / min(|A|, |B|).
fn token_overlap(a: &str, b: &str) -> f32 {
    let ta: std::collections::HashSet<&str> = a.split_whitespace().collect();
    let tb: std::collections::HashSet<&str> = b.split_whitespace().collect();
    let min = ta.len().min(tb.len());
    if min == 0 {
        return 0.0;
    }
    ta.intersection(&tb).count() as f32 / min as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use ledgerline_core::{AccountId, Direction, Money};

    fn incoming(date: (i32, u32, u32), desc: &str, cents: i64) -> PendingTransaction {
        PendingTransaction {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            description: desc.to_string(),
            amount: Money::from_cents(cents),
            direction: Direction::Debit,
            category: None,
        }
    }

    fn prior(id: i64, date: (i32, u32, u32), desc: &str, cents: i64) -> LedgerTransaction {
        let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        LedgerTransaction {
            id,
            account_id: AccountId(1),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            description: desc.to_string(),
            amount: Money::from_cents(cents),
            direction: Direction::Debit,
            category: None,
            is_reconciled: false,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn exact_duplicate_detected() {
        let dups = detect_duplicates(
            &[incoming((2024, 1, 15), "Coffee Shop Purchase", 450)],
            &[prior(100, (2024, 1, 15), "Coffee Shop Purchase", 450)],
            &DedupeOptions::default(),
        );
        assert_eq!(dups, vec![0]);
    }

    #[test]
    fn amount_must_match_even_in_fuzzy_mode() {
        let rows = [incoming((2024, 1, 15), "Coffee Shop Purchase", 450)];
        let existing = [prior(100, (2024, 1, 15), "Coffee Shop Purchase", 550)];
        assert!(detect_duplicates(&rows, &existing, &DedupeOptions::default()).is_empty());
        assert!(detect_duplicates(&rows, &existing, &DedupeOptions::fuzzy()).is_empty());
    }

    #[test]
    fn date_must_match_even_in_fuzzy_mode() {
        let rows = [incoming((2024, 1, 16), "Coffee Shop Purchase", 450)];
        let existing = [prior(100, (2024, 1, 15), "Coffee Shop Purchase", 450)];
        assert!(detect_duplicates(&rows, &existing, &DedupeOptions::fuzzy()).is_empty());
    }

    #[test]
    fn exact_description_match_is_case_sensitive() {
        let rows = [incoming((2024, 1, 15), "coffee shop purchase", 450)];
        let existing = [prior(100, (2024, 1, 15), "Coffee Shop Purchase", 450)];
        assert!(detect_duplicates(&rows, &existing, &DedupeOptions::default()).is_empty());
        // Case folds away under fuzzy normalization.
        assert_eq!(
            detect_duplicates(&rows, &existing, &DedupeOptions::fuzzy()),
            vec![0]
        );
    }

    #[test]
    fn truncated_merchant_string_needs_fuzzy_mode() {
        let rows = [incoming((2024, 1, 15), "STARBUCKS #123 MAIN ST", 450)];
        let existing = [prior(100, (2024, 1, 15), "STARBUCKS MAIN STREET", 450)];
        assert!(detect_duplicates(&rows, &existing, &DedupeOptions::default()).is_empty());
        assert_eq!(detect_duplicates(&rows, &existing, &DedupeOptions::fuzzy()), vec![0]);
    }

    #[test]
    fn unrelated_merchants_never_fuzzy_match() {
        let rows = [incoming((2024, 1, 15), "WHOLE FOODS MARKET", 450)];
        let existing = [prior(100, (2024, 1, 15), "SHELL GAS STATION", 450)];
        assert!(detect_duplicates(&rows, &existing, &DedupeOptions::fuzzy()).is_empty());
    }

    #[test]
    fn row_matching_many_priors_counted_once() {
        let rows = [incoming((2024, 1, 15), "STARBUCKS", 450)];
        let existing = [
            prior(100, (2024, 1, 15), "STARBUCKS", 450),
            prior(101, (2024, 1, 15), "STARBUCKS", 450),
        ];
        assert_eq!(
            detect_duplicates(&rows, &existing, &DedupeOptions::default()),
            vec![0]
        );
    }

    #[test]
    fn indices_are_ascending_and_sparse() {
        let rows = [
            incoming((2024, 1, 15), "STARBUCKS", 450),
            incoming((2024, 1, 16), "NEW MERCHANT", 1000),
            incoming((2024, 1, 17), "SHELL", 3000),
        ];
        let existing = [
            prior(100, (2024, 1, 17), "SHELL", 3000),
            prior(101, (2024, 1, 15), "STARBUCKS", 450),
        ];
        assert_eq!(
            detect_duplicates(&rows, &existing, &DedupeOptions::default()),
            vec![0, 2]
        );
    }

    #[test]
    fn fuzzy_results_are_a_superset_of_exact() {
        let rows = [
            incoming((2024, 1, 15), "STARBUCKS #123 MAIN ST", 450),
            incoming((2024, 1, 15), "AMAZON MARKETPLACE", 1999),
            incoming((2024, 1, 16), "SHELL GAS", 3000),
        ];
        let existing = [
            prior(100, (2024, 1, 15), "STARBUCKS MAIN STREET", 450),
            prior(101, (2024, 1, 15), "AMAZON MARKETPLACE", 1999),
        ];
        let exact = detect_duplicates(&rows, &existing, &DedupeOptions::default());
        let fuzzy = detect_duplicates(&rows, &existing, &DedupeOptions::fuzzy());
        assert!(exact.iter().all(|i| fuzzy.contains(i)));
        assert_eq!(exact, vec![1]);
        assert_eq!(fuzzy, vec![0, 1]);
    }

    #[test]
    fn similarity_ignores_reference_numbers() {
        let score = description_similarity("STARBUCKS #123 MAIN ST", "STARBUCKS MAIN STREET");
        assert!(score >= DEFAULT_SIMILARITY_THRESHOLD, "score was {score}");
    }

    #[test]
    fn similarity_of_unrelated_strings_is_low() {
        let score = description_similarity("STARBUCKS", "SHELL GAS STATION");
        assert!(score < 0.5, "score was {score}");
    }

    #[test]
    fn threshold_is_tunable() {
        let rows = [incoming((2024, 1, 15), "STARBUCKS #123 MAIN ST", 450)];
        let existing = [prior(100, (2024, 1, 15), "STARBUCKS MAIN STREET", 450)];
        let strict = DedupeOptions {
            fuzzy_match: true,
            similarity_threshold: 0.95,
        };
        assert!(detect_duplicates(&rows, &existing, &strict).is_empty());
    }
}
