//! Date windows, reporting periods and calendar quarters.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Inclusive date range `[start, end]`.
///
/// Used both for the reclassifier's output window and for each reporting
/// period handed to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Build from `(year, month, day)` triples. Panics on an invalid calendar date.
    pub fn ymd(start: (i32, u32, u32), end: (i32, u32, u32)) -> Self {
        let date = |(y, m, d): (i32, u32, u32)| {
            NaiveDate::from_ymd_opt(y, m, d).unwrap_or_else(|| panic!("invalid date {y}-{m}-{d}"))
        };
        Self::new(date(start), date(end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn validate(&self) -> Result<(), PeriodError> {
        if self.start > self.end {
            return Err(PeriodError::Inverted {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// First and last calendar quarter touched by the window.
    pub fn quarters(&self) -> (Quarter, Quarter) {
        (Quarter::from_date(self.start), Quarter::from_date(self.end))
    }

    /// Year span label used in published tables, e.g. `1980-1984`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.start.year(), self.end.year())
    }

    /// Filesystem-safe identifier, e.g. `1980-01-01_1984-12-31`.
    pub fn slug(&self) -> String {
        format!("{}_{}", self.start, self.end)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Errors for malformed windows and period lists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("window start {start} is after its end {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("no reporting periods supplied")]
    Empty,

    #[error("period {next} overlaps or precedes period {previous}")]
    Overlapping { previous: DateWindow, next: DateWindow },
}

/// Check that periods are non-empty, individually valid, ordered and non-overlapping.
pub fn check_periods(periods: &[DateWindow]) -> Result<(), PeriodError> {
    if periods.is_empty() {
        return Err(PeriodError::Empty);
    }
    for period in periods {
        period.validate()?;
    }
    for pair in periods.windows(2) {
        if pair[1].start <= pair[0].end {
            return Err(PeriodError::Overlapping {
                previous: pair[0],
                next: pair[1],
            });
        }
    }
    Ok(())
}

/// Calendar quarter, stored as `year * 4 + (quarter - 1)` so that
/// consecutive quarters differ by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quarter(i32);

impl Quarter {
    pub const fn from_index(index: i32) -> Self {
        Self(index)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.year() * 4 + (date.month0() / 3) as i32)
    }

    pub fn new(year: i32, quarter: u32) -> Option<Self> {
        (1..=4)
            .contains(&quarter)
            .then(|| Self(year * 4 + quarter as i32 - 1))
    }

    pub const fn index(self) -> i32 {
        self.0
    }

    pub const fn year(self) -> i32 {
        self.0.div_euclid(4)
    }

    /// Quarter number within the year, 1 through 4.
    pub const fn number(self) -> u32 {
        self.0.rem_euclid(4) as u32 + 1
    }

    pub fn start_date(self) -> NaiveDate {
        let month = (self.number() - 1) * 3 + 1;
        NaiveDate::from_ymd_opt(self.year(), month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last calendar day of the quarter (the usual 13F report date).
    pub fn end_date(self) -> NaiveDate {
        Quarter(self.0 + 1)
            .start_date()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year(), self.number())
    }
}
