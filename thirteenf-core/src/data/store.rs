//! Raw Store: the snapshots deposited by the external pull jobs.
//!
//! Layout under `data_dir`:
//! - `pulled/13f.parquet`: Holdings Panel
//! - `pulled/Mutual_Fund.parquet`: Fund Registry
//! - `manual/PF_names.csv`: Manual Pension-Fund List (single `PF_name` column)
//!
//! The store is read-only to the pipeline. Every load re-reads from disk;
//! nothing is cached between calls.

use super::frame::{
    days_to_date, holdings_to_frame, registry_to_frame, write_parquet, HoldingRecord,
    RegistryRecord,
};
use super::schema::columns::*;
use super::schema::{HoldingsSchema, RegistrySchema, SchemaError};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const HOLDINGS_FILE: &str = "pulled/13f.parquet";
pub const REGISTRY_FILE: &str = "pulled/Mutual_Fund.parquet";
pub const PENSION_FILE: &str = "manual/PF_names.csv";

/// Errors from Raw Store access.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot not found: {path} (run the pull job first)")]
    MissingSnapshot { path: PathBuf },

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("parquet I/O error: {0}")]
    Parquet(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Manually curated pension-fund institution names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PensionList {
    names: BTreeSet<String>,
}

impl PensionList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Single-column frame keyed by `mgrname`, for joining against holdings.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![Column::new(
            MGRNAME.into(),
            self.iter().collect::<Vec<_>>(),
        )])
    }
}

/// Row counts and date coverage of the Raw Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStatus {
    pub holdings_rows: usize,
    pub holdings_first: Option<NaiveDate>,
    pub holdings_last: Option<NaiveDate>,
    pub managers: usize,
    pub registry_rows: usize,
    pub registry_first: Option<NaiveDate>,
    pub registry_last: Option<NaiveDate>,
    pub pension_names: usize,
}

/// Handle to the three raw snapshots.
#[derive(Debug, Clone)]
pub struct RawStore {
    holdings_path: PathBuf,
    registry_path: PathBuf,
    pension_path: PathBuf,
}

impl RawStore {
    /// Store rooted at `data_dir` with the default layout.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            holdings_path: dir.join(HOLDINGS_FILE),
            registry_path: dir.join(REGISTRY_FILE),
            pension_path: dir.join(PENSION_FILE),
        }
    }

    pub fn with_paths(
        holdings: impl Into<PathBuf>,
        registry: impl Into<PathBuf>,
        pension: impl Into<PathBuf>,
    ) -> Self {
        Self {
            holdings_path: holdings.into(),
            registry_path: registry.into(),
            pension_path: pension.into(),
        }
    }

    pub fn holdings_path(&self) -> &Path {
        &self.holdings_path
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    pub fn pension_path(&self) -> &Path {
        &self.pension_path
    }

    /// Scan the Holdings Panel, validated and cast to canonical dtypes.
    pub fn load_holdings(&self) -> Result<LazyFrame, StoreError> {
        let lf = scan_parquet(&self.holdings_path)?;
        Ok(HoldingsSchema::prepare(lf)?)
    }

    /// Scan the Fund Registry, validated and cast to canonical dtypes.
    pub fn load_registry(&self) -> Result<LazyFrame, StoreError> {
        let lf = scan_parquet(&self.registry_path)?;
        Ok(RegistrySchema::prepare(lf)?)
    }

    /// Read the Manual Pension-Fund List.
    pub fn load_pension_list(&self) -> Result<PensionList, StoreError> {
        let path = &self.pension_path;
        if !path.exists() {
            return Err(StoreError::MissingSnapshot {
                path: path.to_path_buf(),
            });
        }
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| StoreError::Csv(e.to_string()))?;
        let column = df.column(PF_NAME).map_err(|_| SchemaError::MissingColumn {
            table: "pension list",
            column: PF_NAME.to_string(),
        })?;
        let names = column
            .cast(&DataType::String)
            .map_err(|e| StoreError::Csv(e.to_string()))?;
        let names = names.str().map_err(|e| StoreError::Csv(e.to_string()))?;
        Ok(PensionList::new(names.into_iter().flatten()))
    }

    /// Row counts and date coverage, for `check`-style diagnostics.
    pub fn status(&self) -> Result<StoreStatus, StoreError> {
        let holdings = self
            .load_holdings()?
            .select([
                len().alias("rows"),
                col(FDATE).min().alias("first"),
                col(FDATE).max().alias("last"),
            ])
            .collect()
            .map_err(|e| StoreError::Parquet(e.to_string()))?;
        let managers = self
            .load_holdings()?
            .select([col(MGRNO), col(MGRNAME)])
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()
            .map_err(|e| StoreError::Parquet(e.to_string()))?
            .height();
        let registry = self
            .load_registry()?
            .select([
                len().alias("rows"),
                col(FDATE).min().alias("first"),
                col(FDATE).max().alias("last"),
            ])
            .collect()
            .map_err(|e| StoreError::Parquet(e.to_string()))?;
        let pension = self.load_pension_list()?;

        Ok(StoreStatus {
            holdings_rows: scalar_count(&holdings, "rows")?,
            holdings_first: scalar_date(&holdings, "first")?,
            holdings_last: scalar_date(&holdings, "last")?,
            managers,
            registry_rows: scalar_count(&registry, "rows")?,
            registry_first: scalar_date(&registry, "first")?,
            registry_last: scalar_date(&registry, "last")?,
            pension_names: pension.len(),
        })
    }

    pub fn write_holdings(&self, rows: &[HoldingRecord]) -> Result<(), StoreError> {
        let df = holdings_to_frame(rows).map_err(|e| StoreError::Parquet(e.to_string()))?;
        write_parquet(&df, &self.holdings_path)
    }

    pub fn write_registry(&self, rows: &[RegistryRecord]) -> Result<(), StoreError> {
        let df = registry_to_frame(rows).map_err(|e| StoreError::Parquet(e.to_string()))?;
        write_parquet(&df, &self.registry_path)
    }

    pub fn write_pension_list(&self, list: &PensionList) -> Result<(), StoreError> {
        if let Some(parent) = self.pension_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut df = DataFrame::new(vec![Column::new(
            PF_NAME.into(),
            list.iter().collect::<Vec<_>>(),
        )])
        .map_err(|e| StoreError::Csv(e.to_string()))?;
        let file = fs::File::create(&self.pension_path)?;
        CsvWriter::new(file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| StoreError::Csv(e.to_string()))
    }
}

fn scan_parquet(path: &Path) -> Result<LazyFrame, StoreError> {
    if !path.exists() {
        return Err(StoreError::MissingSnapshot {
            path: path.to_path_buf(),
        });
    }
    LazyFrame::scan_parquet(path, Default::default())
        .map_err(|e| StoreError::Parquet(format!("scan {}: {e}", path.display())))
}

fn scalar_count(df: &DataFrame, name: &str) -> Result<usize, StoreError> {
    let value = df
        .column(name)
        .and_then(|c| c.cast(&DataType::UInt64))
        .map_err(|e| StoreError::Parquet(e.to_string()))?;
    let value = value
        .u64()
        .map_err(|e| StoreError::Parquet(e.to_string()))?
        .get(0)
        .unwrap_or(0);
    Ok(value as usize)
}

fn scalar_date(df: &DataFrame, name: &str) -> Result<Option<NaiveDate>, StoreError> {
    let days = df
        .column(name)
        .and_then(|c| c.cast(&DataType::Int32))
        .map_err(|e| StoreError::Parquet(e.to_string()))?;
    let days = days.i32().map_err(|e| StoreError::Parquet(e.to_string()))?;
    Ok(days.get(0).map(days_to_date))
}
