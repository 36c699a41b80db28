use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// First year the tracker accepts ledgers for.
pub const EPOCH_YEAR: i32 = 2020;

/// A calendar month, with both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    pub year: i32,
    pub month: u32,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

impl MonthWindow {
    /// Returns `None` when `month` is not in 1..=12 or the year is out of
    /// chrono's range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month_start = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let last_day = next_month_start.pred_opt()?;

        Some(Self {
            year,
            month,
            first_day,
            last_day,
        })
    }

    /// The month a given day falls in.
    pub fn containing(date: NaiveDate) -> Self {
        let first_day = date.with_day(1).unwrap_or(date);
        // Every valid date's month can be rebuilt.
        Self::new(first_day.year(), first_day.month()).unwrap_or(Self {
            year: first_day.year(),
            month: first_day.month(),
            first_day,
            last_day: date,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_day <= date && date <= self.last_day
    }
}

impl std::fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
