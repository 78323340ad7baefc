//! Reclassifier: filters, backfills and relabels the Holdings Panel.
//!
//! Order of operations:
//! 1. optional history bound, then drop rows without price or shares outstanding
//! 2. stock-code / exchange-code admissibility filter
//! 3. backfill post-cutoff typecodes from the last pre-cutoff value
//! 4. broadcast each identity's latest typecode over its whole history
//! 5. category remap with the mutual-fund and pension-fund overrides
//! 6. restrict to the window, project and sort
//!
//! Steps 3 to 5 run on the full history; only step 6 applies the window.

pub mod backfill;
pub mod categorize;
pub mod filter;
pub mod policy;

pub use policy::{FundMatch, HistoryBound, OverridePrecedence, ReclassifyPolicy};

use crate::data::schema::columns::*;
use crate::data::{
    frame_to_cleaned, write_parquet, CleanedRecord, CleanedSchema, HoldingsSchema, PensionList,
    RawStore, RegistrySchema, SchemaError, StoreError,
};
use crate::domain::{DateWindow, PeriodError};
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ReclassifyError {
    #[error("invalid window: {0}")]
    InvalidWindow(#[from] PeriodError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Reclassified holdings for one date window.
///
/// Columns: `fdate, mgrno, mgrname, typecode, cusip, shares, prc, shrout1`,
/// with `typecode` holding the final category code (1 through 6). Rows are
/// sorted by every column, so two runs over the same inputs produce
/// identical frames.
#[derive(Debug, Clone)]
pub struct CleanedPanel {
    window: DateWindow,
    frame: DataFrame,
}

impl CleanedPanel {
    /// Wrap an existing frame after checking its columns.
    pub fn from_frame(window: DateWindow, frame: DataFrame) -> Result<Self, SchemaError> {
        CleanedSchema::validate(&frame.schema())?;
        Ok(Self { window, frame })
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn records(&self) -> Result<Vec<CleanedRecord>, StoreError> {
        frame_to_cleaned(&self.frame)
    }

    pub fn write_parquet(&self, path: &Path) -> Result<(), StoreError> {
        write_parquet(&self.frame, path)
    }
}

/// Reclassify the Raw Store's holdings and keep the rows inside `window`.
pub fn reclassify(
    window: DateWindow,
    store: &RawStore,
    policy: &ReclassifyPolicy,
) -> Result<CleanedPanel, ReclassifyError> {
    window.validate()?;
    let holdings = store.load_holdings()?;
    let registry = store.load_registry()?;
    let pension = store.load_pension_list()?;
    run(window, holdings, registry, &pension, policy)
}

/// Reclassify in-memory snapshots. The frames are validated and coerced
/// exactly as if they had been read from the Raw Store.
pub fn reclassify_frames(
    window: DateWindow,
    holdings: LazyFrame,
    registry: LazyFrame,
    pension: &PensionList,
    policy: &ReclassifyPolicy,
) -> Result<CleanedPanel, ReclassifyError> {
    window.validate()?;
    let holdings = HoldingsSchema::prepare(holdings)?;
    let registry = RegistrySchema::prepare(registry)?;
    run(window, holdings, registry, pension, policy)
}

fn run(
    window: DateWindow,
    holdings: LazyFrame,
    registry: LazyFrame,
    pension: &PensionList,
    policy: &ReclassifyPolicy,
) -> Result<CleanedPanel, ReclassifyError> {
    debug!(
        %window,
        cutoff = %policy.backfill_cutoff,
        fund_match = ?policy.fund_match,
        precedence = ?policy.precedence,
        history = ?policy.history,
        "reclassifying holdings"
    );

    let lf = match policy.history {
        HistoryBound::Full => holdings,
        HistoryBound::ThroughWindowEnd => holdings.filter(col(FDATE).lt_eq(lit(window.end))),
    };
    let lf = filter::drop_unpriced(lf);
    let lf = filter::admissible(lf, &policy.stock_codes, &policy.exchange_codes);
    let lf = backfill::backfill_pre_cutoff(lf, policy.backfill_cutoff);
    let lf = backfill::canonicalize_latest(lf);
    let lf = categorize::categorize(lf, registry, pension, policy)?;

    let names = CleanedSchema::names();
    let frame = lf
        .filter(
            col(FDATE)
                .gt_eq(lit(window.start))
                .and(col(FDATE).lt_eq(lit(window.end))),
        )
        .select(names.iter().map(|name| col(*name)).collect::<Vec<_>>())
        .sort(
            names.clone(),
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    info!(%window, rows = frame.height(), "cleaned panel ready");
    Ok(CleanedPanel { window, frame })
}
