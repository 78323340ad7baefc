//! End-to-end scenario: Raw Store -> reclassify -> aggregate, checked against
//! hand-computed values.
//!
//! Fixture (all filings on December 31, prices constant):
//!
//! | security | prc | shrout1 (m) |
//! |----------|-----|-------------|
//! | S1       | 10  | 1           |
//! | S2       | 20  | 2           |
//! | S3       | 5   | 4           |
//!
//! ALPHA (1, typecode 3, in the fund registry -> Mutual Fund)
//!   2000: S1 100k, S2 50k  -> AUM 2m, 2 stocks, universe 2
//!   2001: S1 200k          -> AUM 2m, 1 stock,  universe 2
//!   2002: S3 800k          -> AUM 4m, 1 stock,  universe 3
//! BETA (2, typecode 1 -> Bank)
//!   2000: S3 2000k         -> AUM 10m, 1 stock, universe 1
//!   2002: S1 300k, S3 200k -> AUM 4m,  2 stocks, universe 2
//!
//! Market value: 2000 = 70m, 2001 = 10m, 2002 = 30m.

use chrono::NaiveDate;
use thirteenf_core::aggregate::{aggregate, AggregateError, AggregateOptions, PeriodSummaryRow};
use thirteenf_core::data::{HoldingRecord, RegistryRecord};
use thirteenf_core::domain::PeriodError;
use thirteenf_core::reclassify::{reclassify, ReclassifyPolicy};
use thirteenf_core::{Category, CleanedPanel, DateWindow, PensionList, RawStore};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn holding(year: i32, mgrno: i64, name: &str, typecode: i64, cusip: &str, shares: f64) -> HoldingRecord {
    let (prc, shrout1) = match cusip {
        "S1" => (10.0, 1.0),
        "S2" => (20.0, 2.0),
        _ => (5.0, 4.0),
    };
    HoldingRecord {
        fdate: d(year, 12, 31),
        mgrno,
        mgrname: name.into(),
        typecode: Some(typecode),
        cusip: cusip.into(),
        shares,
        prc: Some(prc),
        shrout1: Some(shrout1),
        stkcd: Some("0".into()),
        exchcd: Some("A".into()),
    }
}

fn panel() -> (tempfile::TempDir, CleanedPanel) {
    let dir = tempfile::tempdir().unwrap();
    let store = RawStore::new(dir.path());
    store
        .write_holdings(&[
            holding(2000, 1, "ALPHA", 3, "S1", 100_000.0),
            holding(2000, 1, "ALPHA", 3, "S2", 50_000.0),
            holding(2001, 1, "ALPHA", 3, "S1", 200_000.0),
            holding(2002, 1, "ALPHA", 3, "S3", 800_000.0),
            holding(2000, 2, "BETA", 1, "S3", 2_000_000.0),
            holding(2002, 2, "BETA", 1, "S1", 300_000.0),
            holding(2002, 2, "BETA", 1, "S3", 200_000.0),
        ])
        .unwrap();
    store
        .write_registry(&[RegistryRecord {
            fdate: d(2001, 12, 31),
            mgrco: "1".into(),
        }])
        .unwrap();
    store.write_pension_list(&PensionList::default()).unwrap();

    let window = DateWindow::ymd((2000, 1, 1), (2002, 12, 31));
    let panel = reclassify(window, &store, &ReclassifyPolicy::default()).unwrap();
    (dir, panel)
}

fn row(
    category: Category,
    count: usize,
    market_held_pct: i64,
    aum: (i64, i64),
    securities: (i64, i64),
    universe: (i64, i64),
) -> PeriodSummaryRow {
    PeriodSummaryRow {
        category,
        count,
        market_held_pct,
        aum_median: aum.0,
        aum_p90: aum.1,
        securities_median: securities.0,
        securities_p90: securities.1,
        universe_median: universe.0,
        universe_p90: universe.1,
    }
}

#[test]
fn single_period_matches_hand_computed_values() {
    let (_dir, panel) = panel();
    let period = DateWindow::ymd((2000, 1, 1), (2002, 12, 31));
    let out = aggregate(&panel, &[period], &AggregateOptions::default()).unwrap();
    let table = out.get(&period).unwrap();

    assert_eq!(table.rows.len(), 6);
    assert_eq!(
        table.row(Category::Bank).unwrap(),
        // 14m / 110m = 12.7%; AUM [4m, 10m]; stocks [1, 2]; universe [1, 2]
        &row(Category::Bank, 1, 13, (7, 9), (2, 2), (2, 2))
    );
    assert_eq!(
        table.row(Category::MutualFund).unwrap(),
        // 8m / 110m = 7.3%; AUM [2m, 2m, 4m]; stocks [1, 1, 2]; universe [2, 2, 3]
        &row(Category::MutualFund, 1, 7, (2, 4), (1, 2), (2, 3))
    );
    for category in [
        Category::Insurance,
        Category::InvestmentAdvisor,
        Category::PensionFund,
        Category::Other,
    ] {
        assert_eq!(
            table.row(category).unwrap(),
            &PeriodSummaryRow::zero(category)
        );
    }
}

#[test]
fn multiple_periods_keep_order_and_trailing_universe() {
    let (_dir, panel) = panel();
    let early = DateWindow::ymd((2000, 1, 1), (2001, 12, 31));
    let late = DateWindow::ymd((2002, 1, 1), (2002, 12, 31));
    let out = aggregate(&panel, &[early, late], &AggregateOptions::default()).unwrap();

    let periods: Vec<DateWindow> = out.periods().collect();
    assert_eq!(periods, vec![early, late]);

    let late_table = out.get(&late).unwrap();
    // The 2002 universe still counts securities held in 2000 and 2001.
    assert_eq!(
        late_table.row(Category::MutualFund).unwrap(),
        &row(Category::MutualFund, 1, 13, (4, 4), (1, 1), (3, 3))
    );
    assert_eq!(
        late_table.row(Category::Bank).unwrap(),
        &row(Category::Bank, 1, 13, (4, 4), (2, 2), (2, 2))
    );

    let early_table = out.get(&early).unwrap();
    // 10m / 80m = 12.5%, rounded half to even
    assert_eq!(early_table.row(Category::Bank).unwrap().market_held_pct, 12);
    assert_eq!(early_table.row(Category::Bank).unwrap().count, 1);
}

#[test]
fn period_without_pension_funds_has_zero_pension_row() {
    let (_dir, panel) = panel();
    let period = DateWindow::ymd((2000, 1, 1), (2002, 12, 31));
    let out = aggregate(&panel, &[period], &AggregateOptions::default()).unwrap();
    let pension = out.get(&period).unwrap().row(Category::PensionFund).unwrap();
    assert_eq!(pension.count, 0);
}

#[test]
fn period_outside_panel_yields_six_zero_rows() {
    let (_dir, panel) = panel();
    let period = DateWindow::ymd((1990, 1, 1), (1994, 12, 31));
    let out = aggregate(&panel, &[period], &AggregateOptions::default()).unwrap();
    let table = out.get(&period).unwrap();
    assert_eq!(table.rows.len(), 6);
    assert!(table.rows.iter().all(|r| r.count == 0 && r.market_held_pct == 0));
}

#[test]
fn overlapping_periods_are_rejected() {
    let (_dir, panel) = panel();
    let periods = [
        DateWindow::ymd((2000, 1, 1), (2001, 6, 30)),
        DateWindow::ymd((2001, 1, 1), (2002, 12, 31)),
    ];
    let err = aggregate(&panel, &periods, &AggregateOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        AggregateError::InvalidPeriods(PeriodError::Overlapping { .. })
    ));
}

#[test]
fn shorter_universe_window_narrows_universe() {
    let (_dir, panel) = panel();
    let period = DateWindow::ymd((2000, 1, 1), (2002, 12, 31));
    let options = AggregateOptions {
        universe_window: 1,
        ..AggregateOptions::default()
    };
    // With a one-quarter window the universe equals the quarter's own
    // holdings: ALPHA [2, 1, 1] instead of [2, 2, 3].
    let out = aggregate(&panel, &[period], &options).unwrap();
    let mf = out.get(&period).unwrap().row(Category::MutualFund).unwrap();
    assert_eq!(mf.universe_median, 1);
    assert_eq!(mf.universe_p90, 2);
}
