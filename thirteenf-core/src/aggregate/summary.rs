//! Period Summary Tables.

use super::managers::ManagerQuarter;
use super::stats::{percentile, Rounding};
use super::AggregateOptions;
use crate::domain::{Category, DateWindow, ManagerId, Quarter};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One category's statistics for one reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummaryRow {
    pub category: Category,
    /// Distinct Manager Identities.
    pub count: usize,
    /// Category holdings value as a percentage of the period's market value.
    pub market_held_pct: i64,
    /// Median AUM in millions.
    pub aum_median: i64,
    /// 90th-percentile AUM in millions.
    pub aum_p90: i64,
    pub securities_median: i64,
    pub securities_p90: i64,
    pub universe_median: i64,
    pub universe_p90: i64,
}

impl PeriodSummaryRow {
    pub fn zero(category: Category) -> Self {
        Self {
            category,
            count: 0,
            market_held_pct: 0,
            aum_median: 0,
            aum_p90: 0,
            securities_median: 0,
            securities_p90: 0,
            universe_median: 0,
            universe_p90: 0,
        }
    }
}

/// Summary for one reporting period: exactly one row per category, in
/// typecode order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummaryTable {
    pub period: DateWindow,
    pub rows: Vec<PeriodSummaryRow>,
}

impl PeriodSummaryTable {
    pub const COLUMNS: [&'static str; 10] = [
        "typecode",
        "category",
        "count",
        "market_held",
        "aum_median",
        "aum_90",
        "stocks_median",
        "stocks_90",
        "universe_median",
        "universe_90",
    ];

    pub fn row(&self, category: Category) -> Option<&PeriodSummaryRow> {
        self.rows.iter().find(|r| r.category == category)
    }

    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let pick = |f: fn(&PeriodSummaryRow) -> i64| self.rows.iter().map(f).collect::<Vec<_>>();
        let [code, label, count, held, aum_m, aum_p, stk_m, stk_p, uni_m, uni_p] = Self::COLUMNS;
        DataFrame::new(vec![
            Column::new(code.into(), pick(|r| r.category.code())),
            Column::new(
                label.into(),
                self.rows.iter().map(|r| r.category.label()).collect::<Vec<_>>(),
            ),
            Column::new(count.into(), pick(|r| r.count as i64)),
            Column::new(held.into(), pick(|r| r.market_held_pct)),
            Column::new(aum_m.into(), pick(|r| r.aum_median)),
            Column::new(aum_p.into(), pick(|r| r.aum_p90)),
            Column::new(stk_m.into(), pick(|r| r.securities_median)),
            Column::new(stk_p.into(), pick(|r| r.securities_p90)),
            Column::new(uni_m.into(), pick(|r| r.universe_median)),
            Column::new(uni_p.into(), pick(|r| r.universe_p90)),
        ])
    }
}

/// Summarize the manager-quarters and market totals falling in `period`.
pub fn summarize_period(
    period: DateWindow,
    managers: &[ManagerQuarter],
    market: &BTreeMap<Quarter, f64>,
    options: &AggregateOptions,
) -> PeriodSummaryTable {
    let (first, last) = period.quarters();
    let market_total: f64 = market.range(first..=last).map(|(_, v)| v).sum();
    let in_period: Vec<&ManagerQuarter> = managers
        .iter()
        .filter(|m| m.quarter >= first && m.quarter <= last)
        .collect();

    let rows = Category::ALL
        .into_iter()
        .map(|category| {
            let members: Vec<&ManagerQuarter> = in_period
                .iter()
                .copied()
                .filter(|m| m.category == category)
                .collect();
            summarize_category(category, &members, market_total, options)
        })
        .collect();

    PeriodSummaryTable { period, rows }
}

fn summarize_category(
    category: Category,
    members: &[&ManagerQuarter],
    market_total: f64,
    options: &AggregateOptions,
) -> PeriodSummaryRow {
    if members.is_empty() {
        return PeriodSummaryRow::zero(category);
    }
    let rounding: Rounding = options.rounding;
    let q = options.upper_percentile;

    let identities: HashSet<&ManagerId> = members.iter().map(|m| &m.manager).collect();
    let aum: Vec<f64> = members.iter().map(|m| m.aum).collect();
    let securities: Vec<f64> = members.iter().map(|m| m.securities as f64).collect();
    let universe: Vec<f64> = members.iter().map(|m| m.universe as f64).collect();

    let market_held = if market_total > 0.0 {
        aum.iter().sum::<f64>() / market_total * 100.0
    } else {
        0.0
    };
    let stat = |values: &[f64], q: f64, scale: f64| {
        rounding.to_i64(percentile(values, q).unwrap_or(0.0) / scale)
    };

    PeriodSummaryRow {
        category,
        count: identities.len(),
        market_held_pct: rounding.to_i64(market_held),
        aum_median: stat(&aum, 0.5, options.aum_scale),
        aum_p90: stat(&aum, q, options.aum_scale),
        securities_median: stat(&securities, 0.5, 1.0),
        securities_p90: stat(&securities, q, 1.0),
        universe_median: stat(&universe, 0.5, 1.0),
        universe_p90: stat(&universe, q, 1.0),
    }
}
