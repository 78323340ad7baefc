//! Row-level filters applied before any group-wise relabeling.

use crate::data::schema::columns::*;
use polars::prelude::*;

/// `true` when `column` equals any of `values`. An empty set matches nothing.
pub(crate) fn one_of<T>(column: &str, values: &[T]) -> Expr
where
    T: Clone + Literal,
{
    values
        .iter()
        .fold(lit(false), |acc, v| acc.or(col(column).eq(lit(v.clone()))))
}

/// Drop records without a price or shares outstanding.
pub fn drop_unpriced(lf: LazyFrame) -> LazyFrame {
    lf.filter(col(PRC).is_not_null().and(col(SHROUT1).is_not_null()))
}

/// Keep common domestic issues on admissible exchanges. A null code passes.
pub fn admissible(lf: LazyFrame, stock_codes: &[String], exchange_codes: &[String]) -> LazyFrame {
    let passes = |column: &str, codes: &[String]| {
        when(col(column).is_null())
            .then(lit(true))
            .otherwise(one_of(column, codes))
    };
    lf.filter(passes(STKCD, stock_codes).and(passes(EXCHCD, exchange_codes)))
}
