//! Typed rows and their DataFrame conversions, plus Parquet I/O helpers.
//!
//! The reclassifier and aggregator work on polars frames; these row types
//! exist for fixtures, the synthetic store and callers that want to walk the
//! cleaned panel record by record.

use super::schema::columns::*;
use super::StoreError;
use crate::domain::{Category, ManagerId};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One row of the Holdings Panel as deposited by the pull job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingRecord {
    pub fdate: NaiveDate,
    pub mgrno: i64,
    pub mgrname: String,
    pub typecode: Option<i64>,
    pub cusip: String,
    pub shares: f64,
    pub prc: Option<f64>,
    pub shrout1: Option<f64>,
    pub stkcd: Option<String>,
    pub exchcd: Option<String>,
}

/// One row of the Fund Registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub fdate: NaiveDate,
    pub mgrco: String,
}

/// One row of the Cleaned Panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub fdate: NaiveDate,
    pub manager: ManagerId,
    pub category: Category,
    pub cusip: String,
    pub shares: f64,
    pub prc: f64,
    pub shrout1: f64,
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Days since the Unix epoch, the physical representation of polars `Date`.
pub fn date_to_days(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

pub fn days_to_date(days: i32) -> NaiveDate {
    epoch() + chrono::Duration::days(days as i64)
}

/// Calendar-quarter index (`year * 4 + quarter - 1`) of a date expression.
///
/// Matches [`crate::domain::Quarter::index`].
pub fn quarter_index(date: Expr) -> Expr {
    (date.clone().dt().year().cast(DataType::Int32) * lit(4i32)
        + date.dt().quarter().cast(DataType::Int32)
        - lit(1i32))
    .cast(DataType::Int32)
}

fn date_column(name: &str, dates: impl Iterator<Item = NaiveDate>) -> PolarsResult<Column> {
    let days: Vec<i32> = dates.map(date_to_days).collect();
    Column::new(name.into(), days).cast(&DataType::Date)
}

pub fn holdings_to_frame(rows: &[HoldingRecord]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        date_column(FDATE, rows.iter().map(|r| r.fdate))?,
        Column::new(MGRNO.into(), rows.iter().map(|r| r.mgrno).collect::<Vec<_>>()),
        Column::new(
            MGRNAME.into(),
            rows.iter().map(|r| r.mgrname.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            TYPECODE.into(),
            rows.iter().map(|r| r.typecode).collect::<Vec<_>>(),
        ),
        Column::new(
            CUSIP.into(),
            rows.iter().map(|r| r.cusip.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(SHARES.into(), rows.iter().map(|r| r.shares).collect::<Vec<_>>()),
        Column::new(PRC.into(), rows.iter().map(|r| r.prc).collect::<Vec<_>>()),
        Column::new(SHROUT1.into(), rows.iter().map(|r| r.shrout1).collect::<Vec<_>>()),
        Column::new(
            STKCD.into(),
            rows.iter().map(|r| r.stkcd.as_deref()).collect::<Vec<_>>(),
        ),
        Column::new(
            EXCHCD.into(),
            rows.iter().map(|r| r.exchcd.as_deref()).collect::<Vec<_>>(),
        ),
    ])
}

pub fn registry_to_frame(rows: &[RegistryRecord]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        date_column(FDATE, rows.iter().map(|r| r.fdate))?,
        Column::new(
            MGRCO.into(),
            rows.iter().map(|r| r.mgrco.as_str()).collect::<Vec<_>>(),
        ),
    ])
}

pub fn cleaned_to_frame(rows: &[CleanedRecord]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        date_column(FDATE, rows.iter().map(|r| r.fdate))?,
        Column::new(
            MGRNO.into(),
            rows.iter().map(|r| r.manager.number).collect::<Vec<_>>(),
        ),
        Column::new(
            MGRNAME.into(),
            rows.iter()
                .map(|r| r.manager.name.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            TYPECODE.into(),
            rows.iter().map(|r| r.category.code()).collect::<Vec<_>>(),
        ),
        Column::new(
            CUSIP.into(),
            rows.iter().map(|r| r.cusip.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(SHARES.into(), rows.iter().map(|r| r.shares).collect::<Vec<_>>()),
        Column::new(PRC.into(), rows.iter().map(|r| r.prc).collect::<Vec<_>>()),
        Column::new(SHROUT1.into(), rows.iter().map(|r| r.shrout1).collect::<Vec<_>>()),
    ])
}

/// Convert a cleaned-panel frame back to records.
///
/// Fails on nulls in any column other than `cusip`/`shares` (which default
/// to empty and zero) and on typecodes outside 1..=6.
pub fn frame_to_cleaned(df: &DataFrame) -> Result<Vec<CleanedRecord>, StoreError> {
    let map_err = |e: PolarsError| StoreError::Parquet(format!("column read: {e}"));

    let days = df.column(FDATE).map_err(map_err)?.cast(&DataType::Int32).map_err(map_err)?;
    let days = days.i32().map_err(map_err)?;
    let mgrno = df.column(MGRNO).map_err(map_err)?.i64().map_err(map_err)?;
    let mgrname = df.column(MGRNAME).map_err(map_err)?.str().map_err(map_err)?;
    let typecode = df.column(TYPECODE).map_err(map_err)?.i64().map_err(map_err)?;
    let cusip = df.column(CUSIP).map_err(map_err)?.str().map_err(map_err)?;
    let shares = df.column(SHARES).map_err(map_err)?.f64().map_err(map_err)?;
    let prc = df.column(PRC).map_err(map_err)?.f64().map_err(map_err)?;
    let shrout1 = df.column(SHROUT1).map_err(map_err)?.f64().map_err(map_err)?;

    let null_at = |column: &str, row: usize| {
        StoreError::Validation(format!("null {column} at row {row}"))
    };

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let code = typecode.get(i).ok_or_else(|| null_at(TYPECODE, i))?;
        let category = Category::from_code(code)
            .ok_or_else(|| StoreError::Validation(format!("typecode {code} at row {i}")))?;
        records.push(CleanedRecord {
            fdate: days_to_date(days.get(i).ok_or_else(|| null_at(FDATE, i))?),
            manager: ManagerId::new(
                mgrno.get(i).ok_or_else(|| null_at(MGRNO, i))?,
                mgrname.get(i).unwrap_or_default(),
            ),
            category,
            cusip: cusip.get(i).unwrap_or_default().to_string(),
            shares: shares.get(i).unwrap_or(0.0),
            prc: prc.get(i).ok_or_else(|| null_at(PRC, i))?,
            shrout1: shrout1.get(i).ok_or_else(|| null_at(SHROUT1, i))?,
        });
    }
    Ok(records)
}

/// Write a DataFrame to a Parquet file atomically (temp file, then rename).
pub fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp_path)?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| StoreError::Parquet(format!("write parquet: {e}")))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StoreError::Io(e)
    })?;
    Ok(())
}

/// Read a whole Parquet file eagerly.
pub fn read_parquet(path: &Path) -> Result<DataFrame, StoreError> {
    if !path.exists() {
        return Err(StoreError::MissingSnapshot {
            path: path.to_path_buf(),
        });
    }
    let file = fs::File::open(path)?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| StoreError::Parquet(format!("read: {e}")))
}
