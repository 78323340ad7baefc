//! Classification policy.
//!
//! The historical pipeline changed its join keys, trigger sets and override
//! order several times. Each of those choices is a field here so that a run
//! states exactly which variant produced its tables.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How a Manager Identity is matched against the Fund Registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FundMatch {
    /// Match the manager number against registry identifiers quarter by
    /// quarter. With `clamp_early`, filings earlier than the registry's first
    /// quarter are tested against that first quarter instead of never matching.
    NumberByQuarter { clamp_early: bool },
    /// Match the manager name against registry identifiers from any quarter,
    /// optionally ignoring registry rows after `registry_cutoff`.
    NameAnyQuarter { registry_cutoff: Option<NaiveDate> },
}

impl Default for FundMatch {
    fn default() -> Self {
        FundMatch::NumberByQuarter { clamp_early: true }
    }
}

/// Which override wins when an identity qualifies as both a mutual fund and
/// a pension fund.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePrecedence {
    /// Pension-fund override is applied last and wins.
    #[default]
    PensionOverFund,
    FundOverPension,
}

/// How much filing history feeds the backfill and canonical typecode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryBound {
    /// Every filing in the Raw Store.
    #[default]
    Full,
    /// Only filings dated on or before the window end.
    ThroughWindowEnd,
}

/// All reclassification knobs. Defaults reproduce the published tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclassifyPolicy {
    /// Filings on or after this date get the last typecode recorded before it.
    pub backfill_cutoff: NaiveDate,
    /// Raw typecodes mapped to Investment Advisor.
    pub advisor_codes: Vec<i64>,
    /// Raw typecodes eligible for the mutual-fund and pension-fund overrides.
    pub override_codes: Vec<i64>,
    pub fund_match: FundMatch,
    pub precedence: OverridePrecedence,
    /// Admissible `stkcd` values; a null code is always admissible.
    pub stock_codes: Vec<String>,
    /// Admissible `exchcd` values; a null code is always admissible.
    pub exchange_codes: Vec<String>,
    pub history: HistoryBound,
}

impl Default for ReclassifyPolicy {
    fn default() -> Self {
        Self {
            backfill_cutoff: NaiveDate::from_ymd_opt(1998, 12, 1).unwrap_or_default(),
            advisor_codes: vec![3, 4],
            override_codes: vec![3, 4, 5],
            fund_match: FundMatch::default(),
            precedence: OverridePrecedence::default(),
            stock_codes: vec!["0".into()],
            exchange_codes: vec!["A".into(), "B".into(), "V".into()],
            history: HistoryBound::default(),
        }
    }
}
