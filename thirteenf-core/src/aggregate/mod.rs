//! Period Aggregator: per-period, per-category summary statistics.
//!
//! The cleaned panel is restricted to the span of all requested periods and
//! bucketed into calendar quarters. Per identity and quarter: AUM, distinct
//! securities and the trailing universe. Per quarter: market value of the
//! distinct securities reported. Each period then summarizes the quarters it
//! covers, one row per category.

pub mod managers;
pub mod market;
pub mod stats;
pub mod summary;
pub mod universe;

pub use managers::{manager_quarters, ManagerQuarter};
pub use market::market_totals;
pub use stats::{percentile, Rounding};
pub use summary::{summarize_period, PeriodSummaryRow, PeriodSummaryTable};

use crate::data::schema::columns::*;
use crate::data::{CleanedSchema, SchemaError};
use crate::domain::{check_periods, DateWindow, PeriodError};
use crate::reclassify::CleanedPanel;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("invalid periods: {0}")]
    InvalidPeriods(#[from] PeriodError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("null {0} in cleaned panel")]
    NullKey(&'static str),

    #[error("typecode {0} is not a category")]
    UnknownCategory(i64),

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Aggregation knobs. Defaults reproduce the published tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateOptions {
    /// Reported quarters in the trailing universe, current one included.
    pub universe_window: usize,
    /// Divisor applied to AUM percentiles (dollars to millions).
    pub aum_scale: f64,
    /// Multiplier applied to `shrout1`, which is reported in millions.
    pub shrout_multiplier: f64,
    /// Upper percentile reported next to the median.
    pub upper_percentile: f64,
    pub rounding: Rounding,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            universe_window: 12,
            aum_scale: 1e6,
            shrout_multiplier: 1e6,
            upper_percentile: 0.9,
            rounding: Rounding::HalfEven,
        }
    }
}

/// Summary tables keyed by period, in the order the periods were given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummaries {
    tables: Vec<PeriodSummaryTable>,
}

impl PeriodSummaries {
    pub fn get(&self, period: &DateWindow) -> Option<&PeriodSummaryTable> {
        self.tables.iter().find(|t| &t.period == period)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeriodSummaryTable> {
        self.tables.iter()
    }

    pub fn periods(&self) -> impl Iterator<Item = DateWindow> + '_ {
        self.tables.iter().map(|t| t.period)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<PeriodSummaryTable> for PeriodSummaries {
    fn from_iter<I: IntoIterator<Item = PeriodSummaryTable>>(iter: I) -> Self {
        Self {
            tables: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PeriodSummaries {
    type Item = PeriodSummaryTable;
    type IntoIter = std::vec::IntoIter<PeriodSummaryTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}

/// Summarize a cleaned panel over ordered, non-overlapping periods.
pub fn aggregate(
    panel: &CleanedPanel,
    periods: &[DateWindow],
    options: &AggregateOptions,
) -> Result<PeriodSummaries, AggregateError> {
    aggregate_frame(panel.frame(), periods, options)
}

/// [`aggregate`] over a bare frame with the cleaned-panel columns.
pub fn aggregate_frame(
    frame: &DataFrame,
    periods: &[DateWindow],
    options: &AggregateOptions,
) -> Result<PeriodSummaries, AggregateError> {
    check_periods(periods)?;
    CleanedSchema::validate(&frame.schema())?;

    let (span_start, span_end) = match (periods.first(), periods.last()) {
        (Some(first), Some(last)) => (first.start, last.end),
        _ => return Err(PeriodError::Empty.into()),
    };
    let lf = frame.clone().lazy().filter(
        col(FDATE)
            .gt_eq(lit(span_start))
            .and(col(FDATE).lt_eq(lit(span_end))),
    );

    let managers = manager_quarters(lf.clone(), options.universe_window)?;
    let market = market_totals(lf, options.shrout_multiplier)?;
    debug!(
        manager_quarters = managers.len(),
        quarters = market.len(),
        "per-quarter statistics ready"
    );

    let tables: Vec<PeriodSummaryTable> = periods
        .iter()
        .map(|period| summarize_period(*period, &managers, &market, options))
        .collect();

    info!(periods = tables.len(), "period summaries ready");
    Ok(PeriodSummaries { tables })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cleaned_to_frame;

    #[test]
    fn empty_period_list_is_rejected() {
        let frame = cleaned_to_frame(&[]).unwrap();
        let err = aggregate_frame(&frame, &[], &AggregateOptions::default()).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidPeriods(PeriodError::Empty)));
    }

    #[test]
    fn empty_panel_gives_zero_tables() {
        let frame = cleaned_to_frame(&[]).unwrap();
        let periods = [
            DateWindow::ymd((1980, 1, 1), (1984, 12, 31)),
            DateWindow::ymd((1985, 1, 1), (1989, 12, 31)),
        ];
        let out = aggregate_frame(&frame, &periods, &AggregateOptions::default()).unwrap();
        assert_eq!(out.len(), 2);
        for table in out.iter() {
            assert_eq!(table.rows.len(), 6);
            assert!(table.rows.iter().all(|r| r.count == 0));
        }
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let frame = cleaned_to_frame(&[]).unwrap().drop(SHROUT1).unwrap();
        let periods = [DateWindow::ymd((1980, 1, 1), (1984, 12, 31))];
        let err = aggregate_frame(&frame, &periods, &AggregateOptions::default()).unwrap_err();
        assert!(matches!(err, AggregateError::Schema(_)));
    }
}
