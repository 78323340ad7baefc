//! Per-filing-date statistics by category, used for the report figures.
//!
//! Each series is computed as a long frame (`fdate`, `typecode`, `value`)
//! and can be pivoted to one zero-filled column per category.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thirteenf_core::data::frame::{date_to_days, days_to_date};
use thirteenf_core::data::schema::columns::{FDATE, MGRNAME, MGRNO, PRC, SHARES, TYPECODE};
use thirteenf_core::{Category, CleanedPanel};

pub const VALUE: &str = "value";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Distinct Manager Identities filing on a date.
    TypeCounts,
    /// Total holdings value (shares x price).
    AumTotals,
    /// Distinct (number, name) pairs within a date and category.
    ManagerCounts,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 3] = [
        SeriesKind::TypeCounts,
        SeriesKind::AumTotals,
        SeriesKind::ManagerCounts,
    ];

    pub const fn file_stem(self) -> &'static str {
        match self {
            SeriesKind::TypeCounts => "type_counts",
            SeriesKind::AumTotals => "aum_totals",
            SeriesKind::ManagerCounts => "manager_counts",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            SeriesKind::TypeCounts => "Number of Institutions by Type over Time",
            SeriesKind::AumTotals => "Total AUM by Institution Type over Time",
            SeriesKind::ManagerCounts => "Number of Unique Managers over Time",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub fdate: NaiveDate,
    pub category: Category,
    pub value: f64,
}

/// One statistic over time, in long form sorted by date then typecode.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    pub kind: SeriesKind,
    pub long: DataFrame,
}

impl TimeSeries {
    pub fn points(&self) -> PolarsResult<Vec<SeriesPoint>> {
        let days = self.long.column(FDATE)?.cast(&DataType::Int32)?;
        let days = days.i32()?;
        let codes = self.long.column(TYPECODE)?.i64()?;
        let values = self.long.column(VALUE)?.f64()?;

        let mut points = Vec::with_capacity(self.long.height());
        for ((day, code), value) in days.into_iter().zip(codes).zip(values) {
            let (Some(day), Some(code)) = (day, code) else {
                continue;
            };
            let Some(category) = Category::from_code(code) else {
                return Err(PolarsError::ComputeError(
                    format!("typecode {code} outside 1..=6").into(),
                ));
            };
            points.push(SeriesPoint {
                fdate: days_to_date(day),
                category,
                value: value.unwrap_or(0.0),
            });
        }
        Ok(points)
    }

    /// One row per filing date, one zero-filled column per category label.
    pub fn wide(&self) -> PolarsResult<DataFrame> {
        let mut rows: BTreeMap<NaiveDate, [f64; 6]> = BTreeMap::new();
        for point in self.points()? {
            let slot = (point.category.code() - 1) as usize;
            rows.entry(point.fdate).or_insert([0.0; 6])[slot] += point.value;
        }

        let days: Vec<i32> = rows.keys().copied().map(date_to_days).collect();
        let mut columns = vec![Column::new(FDATE.into(), days).cast(&DataType::Date)?];
        for category in Category::ALL {
            let slot = (category.code() - 1) as usize;
            columns.push(Column::new(
                category.label().into(),
                rows.values().map(|r| r[slot]).collect::<Vec<f64>>(),
            ));
        }
        DataFrame::new(columns)
    }
}

fn finish(kind: SeriesKind, lf: LazyFrame) -> PolarsResult<TimeSeries> {
    let long = lf
        .sort(
            [FDATE, TYPECODE],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;
    Ok(TimeSeries { kind, long })
}

pub fn type_counts(panel: &CleanedPanel) -> PolarsResult<TimeSeries> {
    let lf = panel
        .frame()
        .clone()
        .lazy()
        .select([col(FDATE), col(MGRNO), col(MGRNAME), col(TYPECODE)])
        .unique_stable(None, UniqueKeepStrategy::First)
        .group_by([col(FDATE), col(TYPECODE)])
        .agg([col(MGRNO).count().cast(DataType::Float64).alias(VALUE)]);
    finish(SeriesKind::TypeCounts, lf)
}

pub fn aum_totals(panel: &CleanedPanel) -> PolarsResult<TimeSeries> {
    let lf = panel
        .frame()
        .clone()
        .lazy()
        .group_by([col(FDATE), col(TYPECODE)])
        .agg([(col(SHARES) * col(PRC)).sum().alias(VALUE)]);
    finish(SeriesKind::AumTotals, lf)
}

pub fn manager_counts(panel: &CleanedPanel) -> PolarsResult<TimeSeries> {
    let lf = panel
        .frame()
        .clone()
        .lazy()
        .select([col(FDATE), col(TYPECODE), col(MGRNO), col(MGRNAME)])
        .unique_stable(None, UniqueKeepStrategy::First)
        .group_by([col(FDATE), col(TYPECODE)])
        .agg([col(MGRNAME).count().cast(DataType::Float64).alias(VALUE)]);
    finish(SeriesKind::ManagerCounts, lf)
}

/// All three series, in [`SeriesKind::ALL`] order.
pub fn build_series(panel: &CleanedPanel) -> PolarsResult<Vec<TimeSeries>> {
    Ok(vec![
        type_counts(panel)?,
        aum_totals(panel)?,
        manager_counts(panel)?,
    ])
}
