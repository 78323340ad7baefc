//! Total market value of the reported universe per quarter.

use super::AggregateError;
use crate::data::frame::quarter_index;
use crate::data::schema::columns::*;
use crate::domain::Quarter;
use polars::prelude::*;
use std::collections::BTreeMap;

const QTR: &str = "qtr";
const VALUE: &str = "market_value";

/// Sum of `prc * shrout1 * shrout_multiplier` over the distinct securities
/// reported in each quarter.
///
/// A security held by several managers counts once; the kept row is the
/// first after sorting by date, manager number, manager name, price and
/// shares outstanding. Rows without a security identifier are ignored.
pub fn market_totals(
    lf: LazyFrame,
    shrout_multiplier: f64,
) -> Result<BTreeMap<Quarter, f64>, AggregateError> {
    let df = lf
        .filter(col(CUSIP).is_not_null())
        .with_column(quarter_index(col(FDATE)).alias(QTR))
        .sort(
            [QTR, CUSIP, FDATE, MGRNO, MGRNAME, PRC, SHROUT1],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .unique_stable(
            Some(vec![QTR.into(), CUSIP.into()]),
            UniqueKeepStrategy::First,
        )
        .group_by([col(QTR)])
        .agg([(col(PRC) * col(SHROUT1) * lit(shrout_multiplier))
            .sum()
            .alias(VALUE)])
        .sort([QTR], SortMultipleOptions::default())
        .collect()?;

    let qtr = df.column(QTR)?.i32()?;
    let value = df.column(VALUE)?.f64()?;
    Ok(qtr
        .into_iter()
        .zip(value.into_iter())
        .filter_map(|(q, v)| Some((Quarter::from_index(q?), v.unwrap_or(0.0))))
        .collect())
}
