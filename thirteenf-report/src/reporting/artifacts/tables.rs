//! Period summary table export (CSV).

use anyhow::{Context, Result};
use thirteenf_core::aggregate::PeriodSummaryTable;

/// One header row, then one row per category in typecode order.
pub fn summary_csv(table: &PeriodSummaryTable) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(PeriodSummaryTable::COLUMNS)?;
    for row in &table.rows {
        writer.write_record([
            row.category.code().to_string(),
            row.category.label().to_string(),
            row.count.to_string(),
            row.market_held_pct.to_string(),
            row.aum_median.to_string(),
            row.aum_p90.to_string(),
            row.securities_median.to_string(),
            row.securities_p90.to_string(),
            row.universe_median.to_string(),
            row.universe_p90.to_string(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush summary CSV")?;
    String::from_utf8(bytes).context("Summary CSV is not UTF-8")
}
