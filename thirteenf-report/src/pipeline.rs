//! Report pipeline: reclassify and aggregate every window, then build the
//! time series from the first window's cleaned panel.
//!
//! Any failure aborts the whole build; there is no partial report.

use chrono::{DateTime, Utc};
use polars::prelude::PolarsError;
use std::path::PathBuf;
use std::time::Instant;
use thirteenf_core::fingerprint::{ConfigHash, PanelFingerprint};
use thirteenf_core::{
    aggregate, reclassify, AggregateError, CleanedPanel, DateWindow, PeriodSummaries, RawStore,
    ReclassifyError, StoreError,
};
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, ReportConfig, WindowConfig};
use crate::timeseries::{build_series, TimeSeries};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("window '{window}': {source}")]
    Reclassify {
        window: String,
        #[source]
        source: ReclassifyError,
    },

    #[error("window '{window}': {source}")]
    Aggregate {
        window: String,
        #[source]
        source: AggregateError,
    },

    #[error("polars: {0}")]
    Polars(#[from] PolarsError),

    #[error("read introduction {path}: {source}")]
    Intro {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("hash config: {0}")]
    Hash(#[from] serde_json::Error),
}

/// Everything produced for one reporting window.
#[derive(Debug, Clone)]
pub struct WindowReport {
    pub name: String,
    pub range: DateWindow,
    pub fingerprint: PanelFingerprint,
    pub summaries: PeriodSummaries,
}

#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub config_hash: ConfigHash,
    pub generated_at: DateTime<Utc>,
    pub windows: Vec<WindowReport>,
    /// Built from the first window's panel.
    pub series: Vec<TimeSeries>,
    pub intro_markdown: Option<String>,
}

pub fn build_report(config: &ReportConfig) -> Result<ReportOutput, ReportError> {
    let store = RawStore::new(&config.data_dir);
    build_report_from_store(config, &store)
}

pub fn build_report_from_store(
    config: &ReportConfig,
    store: &RawStore,
) -> Result<ReportOutput, ReportError> {
    config.validate()?;
    let config_hash = config.config_hash()?;
    info!(
        data_dir = %config.data_dir.display(),
        windows = config.windows.len(),
        config_hash = %config_hash,
        "building report"
    );

    let intro_markdown = match &config.intro_markdown {
        Some(path) => Some(std::fs::read_to_string(path).map_err(|source| {
            ReportError::Intro {
                path: path.clone(),
                source,
            }
        })?),
        None => None,
    };

    let mut windows = Vec::with_capacity(config.windows.len());
    let mut series = Vec::new();
    for (i, window) in config.windows.iter().enumerate() {
        let started = Instant::now();
        let panel = clean_window(window, store, config)?;
        if i == 0 {
            series = build_series(&panel)?;
        }
        let summaries = aggregate(&panel, &window.periods, &config.aggregate).map_err(|source| {
            ReportError::Aggregate {
                window: window.name.clone(),
                source,
            }
        })?;
        let fingerprint = PanelFingerprint::of(&panel)?;
        info!(
            window = %window.name,
            rows = fingerprint.rows,
            periods = summaries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "window complete"
        );
        windows.push(WindowReport {
            name: window.name.clone(),
            range: window.range,
            fingerprint,
            summaries,
        });
    }

    Ok(ReportOutput {
        config_hash,
        generated_at: Utc::now(),
        windows,
        series,
        intro_markdown,
    })
}

fn clean_window(
    window: &WindowConfig,
    store: &RawStore,
    config: &ReportConfig,
) -> Result<CleanedPanel, ReportError> {
    reclassify(window.range, store, &config.policy).map_err(|source| ReportError::Reclassify {
        window: window.name.clone(),
        source,
    })
}
