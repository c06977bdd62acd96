use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive span of calendar dates covered by a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.earliest, self.latest)
    }
}

impl DateRange {
    pub fn new(earliest: NaiveDate, latest: NaiveDate) -> Self {
        DateRange { earliest, latest }
    }

    /// Smallest range covering every date in the iterator; `None` when empty.
    pub fn spanning<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Option<Self> {
        dates.into_iter().fold(None, |range, date| match range {
            None => Some(DateRange::new(date, date)),
            Some(r) => Some(DateRange::new(r.earliest.min(date), r.latest.max(date))),
        })
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.earliest && date <= self.latest
    }
}
