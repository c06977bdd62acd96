use chrono::NaiveDate;
use ledgerline_core::{Money, NormalizedRow, StatementRow};

/// Date formats seen in real statement exports, tried in order. ISO first;
/// US-style slashes before day-first to match the banks we actually ingest.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y",
];

pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Coerce extracted rows into canonical shape, 1:1 and in order. Never
/// rejects anything: a malformed date keeps its original text so the
/// validator can report it against the same row index the caller submitted.
pub fn normalize_rows(rows: &[StatementRow]) -> Vec<NormalizedRow> {
    rows.iter().map(normalize_row).collect()
}

fn normalize_row(row: &StatementRow) -> NormalizedRow {
    let date = match parse_date(&row.date) {
        Some(d) => d.to_string(),
        None => row.date.trim().to_string(),
    };

    NormalizedRow {
        date,
        description: row.description.trim().to_string(),
        // Sign is carried by the debit/credit marker; keep the magnitude.
        amount: Money::from_decimal(row.amount).abs(),
        direction: row.direction,
        category: None,
    }
}
