//! Percentiles and rounding for the published summary columns.

use serde::{Deserialize, Serialize};

/// Rounding applied to every published statistic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Banker's rounding: 0.5 -> 0, 1.5 -> 2, 2.5 -> 2.
    #[default]
    HalfEven,
    /// 0.5 -> 1, 2.5 -> 3, -0.5 -> -1.
    HalfAwayFromZero,
}

impl Rounding {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Rounding::HalfEven => value.round_ties_even(),
            Rounding::HalfAwayFromZero => value.round(),
        }
    }

    /// Round and convert to an integer. Non-finite values become zero.
    pub fn to_i64(self, value: f64) -> i64 {
        if value.is_finite() {
            self.apply(value) as i64
        } else {
            0
        }
    }
}

/// Linear-interpolation percentile of an ascending slice.
///
/// `q` is in `[0, 1]`; the rank is `q * (n - 1)`. Returns `None` for an
/// empty slice.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Percentile of unsorted values.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, q)
}

pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 0.5)
}
