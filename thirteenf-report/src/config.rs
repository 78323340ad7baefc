//! Serializable report configuration.
//!
//! A `ReportConfig` captures everything needed to reproduce a report:
//! - Raw Store location and output directory
//! - Reporting windows, each with its ordered period grid
//! - Reclassification policy and aggregation options
//!
//! Every field has a default, so an empty TOML file yields the published
//! 1980-2017 and 2018-2023 tables.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thirteenf_core::domain::{check_periods, PeriodError};
use thirteenf_core::fingerprint::ConfigHash;
use thirteenf_core::{AggregateOptions, DateWindow, ReclassifyPolicy};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("window '{window}': {source}")]
    Period {
        window: String,
        #[source]
        source: PeriodError,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One reporting window: the reclassifier's output range plus the periods
/// summarized inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Short name used for output directories, e.g. `1980-2017`.
    pub name: String,
    pub range: DateWindow,
    pub periods: Vec<DateWindow>,
}

impl WindowConfig {
    pub fn new(name: impl Into<String>, range: DateWindow, periods: Vec<DateWindow>) -> Self {
        Self {
            name: name.into(),
            range,
            periods,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let wrap = |source| ConfigError::Period {
            window: self.name.clone(),
            source,
        };
        self.range.validate().map_err(wrap)?;
        check_periods(&self.periods).map_err(wrap)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Optional Markdown introduction rendered ahead of the tables.
    pub intro_markdown: Option<PathBuf>,
    pub windows: Vec<WindowConfig>,
    pub policy: ReclassifyPolicy,
    pub aggregate: AggregateOptions,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            intro_markdown: None,
            windows: default_windows(),
            policy: ReclassifyPolicy::default(),
            aggregate: AggregateOptions::default(),
        }
    }
}

/// The two published tables: five-year periods through 2017, then the
/// 2018-2022 block and 2023 alone.
pub fn default_windows() -> Vec<WindowConfig> {
    let five_year = |from: i32, to: i32| DateWindow::ymd((from, 1, 1), (to, 12, 31));
    vec![
        WindowConfig::new(
            "1980-2017",
            five_year(1980, 2017),
            vec![
                five_year(1980, 1984),
                five_year(1985, 1989),
                five_year(1990, 1994),
                five_year(1995, 1999),
                five_year(2000, 2004),
                five_year(2005, 2009),
                five_year(2010, 2014),
                five_year(2015, 2017),
            ],
        ),
        WindowConfig::new(
            "2018-2023",
            five_year(2018, 2023),
            vec![five_year(2018, 2022), five_year(2023, 2023)],
        ),
    ]
}

impl ReportConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.windows.is_empty() {
            return Err(ConfigError::Invalid("no reporting windows".into()));
        }
        let mut seen = HashSet::new();
        for window in &self.windows {
            if window.name.trim().is_empty() {
                return Err(ConfigError::Invalid("window with empty name".into()));
            }
            if !seen.insert(window.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate window name '{}'",
                    window.name
                )));
            }
            window.validate()?;
        }
        if self.aggregate.universe_window == 0 {
            return Err(ConfigError::Invalid("universe_window must be at least 1".into()));
        }
        Ok(())
    }

    /// Deterministic hash of the parts that change the numbers: windows,
    /// policy and aggregation options. Paths are excluded.
    pub fn config_hash(&self) -> Result<ConfigHash, serde_json::Error> {
        #[derive(Serialize)]
        struct Hashed<'a> {
            windows: &'a [WindowConfig],
            policy: &'a ReclassifyPolicy,
            aggregate: &'a AggregateOptions,
        }
        ConfigHash::of(&Hashed {
            windows: &self.windows,
            policy: &self.policy,
            aggregate: &self.aggregate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thirteenf_core::reclassify::FundMatch;

    #[test]
    fn defaults_match_published_grids() {
        let config = ReportConfig::default();
        config.validate().unwrap();
        assert_eq!(config.windows.len(), 2);

        let old = &config.windows[0];
        assert_eq!(old.range, DateWindow::ymd((1980, 1, 1), (2017, 12, 31)));
        assert_eq!(old.periods.len(), 8);
        assert_eq!(old.periods[7], DateWindow::ymd((2015, 1, 1), (2017, 12, 31)));

        let new = &config.windows[1];
        assert_eq!(
            new.periods,
            vec![
                DateWindow::ymd((2018, 1, 1), (2022, 12, 31)),
                DateWindow::ymd((2023, 1, 1), (2023, 12, 31)),
            ]
        );
    }

    #[test]
    fn toml_roundtrip() {
        let config = ReportConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = ReportConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(ReportConfig::from_toml("").unwrap(), ReportConfig::default());
    }

    #[test]
    fn partial_toml_overrides_policy() {
        let config = ReportConfig::from_toml(
            r#"
            data_dir = "/srv/13f"

            [policy]
            advisor_codes = [3]

            [policy.fund_match]
            mode = "name_any_quarter"
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/13f"));
        assert_eq!(config.policy.advisor_codes, vec![3]);
        assert!(matches!(config.policy.fund_match, FundMatch::NameAnyQuarter { .. }));
        assert_eq!(config.windows, default_windows());
    }

    #[test]
    fn overlapping_periods_rejected() {
        let err = ReportConfig::from_toml(
            r#"
            [[windows]]
            name = "bad"
            range = { start = "2000-01-01", end = "2005-12-31" }
            periods = [
                { start = "2000-01-01", end = "2003-12-31" },
                { start = "2003-01-01", end = "2005-12-31" },
            ]
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Period { ref window, source: PeriodError::Overlapping { .. } } if window == "bad"
        ));
    }

    #[test]
    fn duplicate_window_names_rejected() {
        let mut config = ReportConfig::default();
        config.windows[1].name = config.windows[0].name.clone();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn config_hash_ignores_paths() {
        let a = ReportConfig::default();
        let b = ReportConfig {
            data_dir: PathBuf::from("/elsewhere"),
            ..ReportConfig::default()
        };
        assert_eq!(a.config_hash().unwrap(), b.config_hash().unwrap());

        let mut c = ReportConfig::default();
        c.policy.advisor_codes = vec![3];
        assert_ne!(a.config_hash().unwrap(), c.config_hash().unwrap());
    }
}
