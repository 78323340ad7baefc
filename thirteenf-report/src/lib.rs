//! 13F Report: configuration, pipeline orchestration and artifact export.
//!
//! This crate builds on `thirteenf-core` to provide:
//! - TOML report configuration with the published window and period grids
//! - The report pipeline (reclassify, aggregate, time series) per window
//! - Per-filing-date series by institution type
//! - LaTeX and Markdown rendering of Table D1
//! - Atomic export of tables, series, `.tex`, `.bib` and a JSON manifest

pub mod config;
pub mod pipeline;
pub mod reporting;
pub mod timeseries;

pub use config::{default_windows, ConfigError, ReportConfig, WindowConfig};
pub use pipeline::{build_report, build_report_from_store, ReportError, ReportOutput, WindowReport};
pub use reporting::{build_and_export, export_report, ArtifactManager, ArtifactPaths};
pub use timeseries::{build_series, SeriesKind, SeriesPoint, TimeSeries};
