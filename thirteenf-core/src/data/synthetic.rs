//! Deterministic synthetic Raw Store.
//!
//! Produces holdings, registry and pension-list snapshots that exercise every
//! reclassification rule: the late-1998 typecode defect, manager numbers
//! reused by unrelated institutions, missing prices, inadmissible stock and
//! exchange codes, registry and pension-list members.
//!
//! Each manager draws from its own `StdRng` whose seed is derived from the
//! master seed and the manager index via BLAKE3, so changing the manager
//! count does not perturb the managers that were already there.

use super::frame::{HoldingRecord, RegistryRecord};
use super::store::{PensionList, RawStore, StoreError};
use crate::domain::Quarter;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Parameters for [`generate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub managers: usize,
    pub securities: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Upper bound on positions per manager per quarter.
    pub max_positions: usize,
    pub missing_price_rate: f64,
    pub inadmissible_rate: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            managers: 60,
            securities: 120,
            start: NaiveDate::from_ymd_opt(1994, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2004, 12, 31).unwrap_or_default(),
            max_positions: 15,
            missing_price_rate: 0.02,
            inadmissible_rate: 0.03,
        }
    }
}

/// Generated snapshots, ready to be written to a [`RawStore`].
#[derive(Debug, Clone)]
pub struct SyntheticStore {
    pub holdings: Vec<HoldingRecord>,
    pub registry: Vec<RegistryRecord>,
    pub pension: PensionList,
}

impl SyntheticStore {
    pub fn write_to(&self, store: &RawStore) -> Result<(), StoreError> {
        store.write_holdings(&self.holdings)?;
        store.write_registry(&self.registry)?;
        store.write_pension_list(&self.pension)?;
        Ok(())
    }
}

struct Security {
    cusip: String,
    base_price: f64,
    shrout1: f64,
}

fn defect_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1998, 12, 1).unwrap_or_default()
}

/// Per-manager sub-seed, independent of generation order.
fn sub_seed(master: u64, manager: usize) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&master.to_le_bytes());
    hasher.update(b"manager");
    hasher.update(&(manager as u64).to_le_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Generate a synthetic Raw Store.
pub fn generate(config: &SyntheticConfig) -> SyntheticStore {
    let mut market_rng = StdRng::seed_from_u64(config.seed);
    let securities: Vec<Security> = (0..config.securities.max(1))
        .map(|i| Security {
            cusip: format!("{:08}", 10_000_000 + i * 7),
            base_price: market_rng.gen_range(5.0..200.0),
            shrout1: market_rng.gen_range(1.0..500.0),
        })
        .collect();

    let first = Quarter::from_date(config.start).index();
    let last = Quarter::from_date(config.end).index().max(first);
    let span = last - first + 1;

    let mut holdings = Vec::new();
    let mut registry = Vec::new();
    let mut pension_names = Vec::new();

    for m in 0..config.managers {
        let mut rng = StdRng::seed_from_u64(sub_seed(config.seed, m));

        // Every fifth manager reuses the number of the manager before it.
        let mgrno = if m % 5 == 4 { 1000 + m as i64 - 1 } else { 1000 + m as i64 };
        let mgrname = format!("SYNTHETIC MANAGER {m:04}");

        let typecode: i64 = rng.gen_range(1..=5);
        let defect_typecode: i64 = rng.gen_range(1..=5);
        let has_missing_typecode = rng.gen_bool(0.05);

        let begin = first + rng.gen_range(0..span.max(1));
        let finish = (begin + rng.gen_range(4..=span.max(4))).min(last);

        let is_fund = matches!(typecode, 3 | 4) && m % 3 == 0;
        let is_pension = m % 7 == 0;
        if is_pension {
            pension_names.push(mgrname.clone());
        }

        for q in begin..=finish {
            let fdate = Quarter::from_index(q).end_date();
            let code = if has_missing_typecode {
                None
            } else if fdate >= defect_date() {
                Some(defect_typecode)
            } else {
                Some(typecode)
            };

            if is_fund {
                registry.push(RegistryRecord {
                    fdate,
                    mgrco: mgrno.to_string(),
                });
            }

            let positions = rng.gen_range(1..=config.max_positions.max(1)).min(securities.len());
            for idx in sample(&mut rng, securities.len(), positions).into_iter() {
                let security = &securities[idx];
                let drift = 1.0 + 0.02 * (q - first) as f64;
                let prc = if rng.gen_bool(config.missing_price_rate) {
                    None
                } else {
                    Some((security.base_price * drift * rng.gen_range(0.9..1.1) * 100.0).round() / 100.0)
                };
                let (stkcd, exchcd) = if rng.gen_bool(config.inadmissible_rate) {
                    if rng.gen_bool(0.5) {
                        (Some("1".to_string()), Some("A".to_string()))
                    } else {
                        (Some("0".to_string()), Some("X".to_string()))
                    }
                } else {
                    let exchange = ["A", "B", "V"][rng.gen_range(0..3)];
                    (Some("0".to_string()), Some(exchange.to_string()))
                };

                holdings.push(HoldingRecord {
                    fdate,
                    mgrno,
                    mgrname: mgrname.clone(),
                    typecode: code,
                    cusip: security.cusip.clone(),
                    shares: (rng.gen_range(0.0001..0.01) * security.shrout1 * 1e6).round(),
                    prc,
                    shrout1: Some(security.shrout1),
                    stkcd,
                    exchcd,
                });
            }
        }
    }

    SyntheticStore {
        holdings,
        registry,
        pension: PensionList::new(pension_names),
    }
}
