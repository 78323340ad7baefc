//! Per-manager, per-quarter statistics.

use super::universe::trailing_counts;
use super::AggregateError;
use crate::data::frame::quarter_index;
use crate::data::schema::columns::*;
use crate::domain::{Category, ManagerId, Quarter};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

const QTR: &str = "qtr";
const AUM: &str = "aum";
const STOCKS: &str = "stocks";
const HELD: &str = "held";

/// One Manager Identity in one calendar quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerQuarter {
    pub manager: ManagerId,
    pub quarter: Quarter,
    pub category: Category,
    /// Sum of shares x price.
    pub aum: f64,
    /// Distinct securities held this quarter.
    pub securities: usize,
    /// Distinct securities held over the trailing window of reported quarters.
    pub universe: usize,
}

/// Aggregate cleaned holdings to one row per identity and quarter, ordered
/// by identity then quarter.
pub fn manager_quarters(
    lf: LazyFrame,
    universe_window: usize,
) -> Result<Vec<ManagerQuarter>, AggregateError> {
    let df = lf
        .with_column(quarter_index(col(FDATE)).alias(QTR))
        .group_by([col(MGRNO), col(MGRNAME), col(QTR)])
        .agg([
            (col(SHARES) * col(PRC)).sum().alias(AUM),
            col(CUSIP).drop_nulls().n_unique().cast(DataType::UInt64).alias(STOCKS),
            col(TYPECODE)
                .sort_by(
                    [col(FDATE)],
                    SortMultipleOptions::default().with_maintain_order(true),
                )
                .last()
                .alias(TYPECODE),
            col(CUSIP).drop_nulls().unique_stable().alias(HELD),
        ])
        .sort(
            [MGRNO, MGRNAME, QTR],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    let mgrno = df.column(MGRNO)?.i64()?;
    let mgrname = df.column(MGRNAME)?.str()?;
    let qtr = df.column(QTR)?.i32()?;
    let aum = df.column(AUM)?.f64()?;
    let stocks = df.column(STOCKS)?.u64()?;
    let typecode = df.column(TYPECODE)?.i64()?;
    let held = df.column(HELD)?.list()?;

    let mut rows = Vec::with_capacity(df.height());
    let mut holdings: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for (i, securities) in held.into_iter().enumerate() {
        let number = mgrno.get(i).ok_or(AggregateError::NullKey(MGRNO))?;
        let quarter = qtr.get(i).ok_or(AggregateError::NullKey(FDATE))?;
        let code = typecode.get(i).unwrap_or(Category::Other.code());
        let category =
            Category::from_code(code).ok_or(AggregateError::UnknownCategory(code))?;

        let list = match securities {
            Some(series) => series
                .str()?
                .into_iter()
                .flatten()
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };
        holdings.push(list);

        rows.push(ManagerQuarter {
            manager: ManagerId::new(number, mgrname.get(i).unwrap_or_default()),
            quarter: Quarter::from_index(quarter),
            category,
            aum: aum.get(i).unwrap_or(0.0),
            securities: stocks.get(i).unwrap_or(0) as usize,
            universe: 0,
        });
    }

    // Rows are sorted by identity, so each identity is a contiguous run.
    let mut start = 0;
    while start < rows.len() {
        let mut end = start + 1;
        while end < rows.len() && rows[end].manager == rows[start].manager {
            end += 1;
        }
        let universe = trailing_counts(&holdings[start..end], universe_window);
        for (row, count) in rows[start..end].iter_mut().zip(universe) {
            row.universe = count;
        }
        start = end;
    }

    Ok(rows)
}
