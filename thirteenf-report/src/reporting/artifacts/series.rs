//! Time-series export (CSV, wide form).

use anyhow::{Context, Result};
use polars::prelude::{CsvWriter, SerWriter};

use crate::timeseries::TimeSeries;

pub fn series_csv(series: &TimeSeries) -> Result<Vec<u8>> {
    let mut wide = series
        .wide()
        .with_context(|| format!("Failed to pivot {} series", series.kind.file_stem()))?;
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut wide)
        .context("Failed to write series CSV")?;
    Ok(buf)
}
