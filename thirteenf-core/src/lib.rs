//! 13F Core: raw store access, institution-type reclassification and period aggregation.
//!
//! This crate contains the computational heart of the report:
//! - Domain types (categories, manager identities, date windows, quarters)
//! - Raw Store access with schema validation and dtype coercion
//! - Reclassifier: backfill, canonical typecode, fund and pension overrides
//! - Period Aggregator: AUM, holdings counts, trailing universe, market share
//! - Dataset fingerprints and a seeded synthetic Raw Store

pub mod aggregate;
pub mod data;
pub mod domain;
pub mod fingerprint;
pub mod reclassify;

pub use aggregate::{aggregate, AggregateError, AggregateOptions, PeriodSummaries};
pub use data::{PensionList, RawStore, StoreError};
pub use domain::{Category, DateWindow, ManagerId, Quarter};
pub use reclassify::{reclassify, CleanedPanel, ReclassifyError, ReclassifyPolicy};
