//! Group-wise typecode relabeling.
//!
//! Both passes compute one value per Manager Identity and broadcast it back
//! onto every row of that identity with a left join.

use crate::data::schema::columns::*;
use chrono::NaiveDate;
use polars::prelude::*;

const BACKFILL: &str = "__backfill_typecode";
const CANONICAL: &str = "__canonical_typecode";

pub(crate) fn identity() -> [Expr; 2] {
    [col(MGRNO), col(MGRNAME)]
}

/// Last non-null typecode by filing date. Ties on the same date resolve to
/// the larger code so the result does not depend on input row order.
pub(crate) fn last_typecode() -> Expr {
    col(TYPECODE)
        .sort_by(
            [col(FDATE), col(TYPECODE)],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .drop_nulls()
        .last()
}

/// Replace the typecode of every filing dated on or after `cutoff` with the
/// identity's last typecode recorded before `cutoff`, when there is one.
pub fn backfill_pre_cutoff(lf: LazyFrame, cutoff: NaiveDate) -> LazyFrame {
    let anchors = lf
        .clone()
        .filter(col(FDATE).lt(lit(cutoff)))
        .group_by(identity())
        .agg([last_typecode().alias(BACKFILL)]);

    lf.join(
        anchors,
        identity(),
        identity(),
        JoinArgs::new(JoinType::Left),
    )
    .with_column(
        when(
            col(FDATE)
                .gt_eq(lit(cutoff))
                .and(col(BACKFILL).is_not_null()),
        )
        .then(col(BACKFILL))
        .otherwise(col(TYPECODE))
        .alias(TYPECODE),
    )
    .select([all().exclude([BACKFILL])])
}

/// Apply each identity's latest typecode to its whole history. Identities
/// that never reported a typecode end up with a null.
pub fn canonicalize_latest(lf: LazyFrame) -> LazyFrame {
    let latest = lf
        .clone()
        .group_by(identity())
        .agg([last_typecode().alias(CANONICAL)]);

    lf.join(
        latest,
        identity(),
        identity(),
        JoinArgs::new(JoinType::Left),
    )
    .with_column(col(CANONICAL).alias(TYPECODE))
    .select([all().exclude([CANONICAL])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{holdings_to_frame, HoldingRecord};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(date: NaiveDate, mgrno: i64, name: &str, typecode: Option<i64>) -> HoldingRecord {
        HoldingRecord {
            fdate: date,
            mgrno,
            mgrname: name.into(),
            typecode,
            cusip: "00000001".into(),
            shares: 1.0,
            prc: Some(1.0),
            shrout1: Some(1.0),
            stkcd: None,
            exchcd: None,
        }
    }

    fn typecodes(lf: LazyFrame) -> Vec<(String, Option<i64>)> {
        let df = lf
            .sort(
                [MGRNAME, FDATE],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()
            .unwrap();
        let names = df.column(MGRNAME).unwrap().str().unwrap();
        let codes = df.column(TYPECODE).unwrap().i64().unwrap();
        names
            .into_iter()
            .zip(codes.into_iter())
            .map(|(n, c)| (n.unwrap_or_default().to_string(), c))
            .collect()
    }

    #[test]
    fn post_cutoff_rows_take_pre_cutoff_code() {
        let rows = vec![
            row(d(1997, 12, 31), 1, "A", Some(3)),
            row(d(1998, 9, 30), 1, "A", Some(3)),
            row(d(1998, 12, 31), 1, "A", Some(4)),
            row(d(1999, 3, 31), 1, "A", Some(4)),
        ];
        let lf = holdings_to_frame(&rows).unwrap().lazy();
        let out = typecodes(backfill_pre_cutoff(lf, d(1998, 12, 1)));
        assert!(out.iter().all(|(_, c)| *c == Some(3)));
    }

    #[test]
    fn identity_without_early_history_keeps_own_code() {
        let rows = vec![
            row(d(1999, 3, 31), 2, "B", Some(4)),
            row(d(1999, 6, 30), 2, "B", Some(5)),
        ];
        let lf = holdings_to_frame(&rows).unwrap().lazy();
        let out = typecodes(backfill_pre_cutoff(lf, d(1998, 12, 1)));
        assert_eq!(out, vec![("B".into(), Some(4)), ("B".into(), Some(5))]);
    }

    #[test]
    fn backfill_skips_null_codes() {
        let rows = vec![
            row(d(1997, 3, 31), 1, "A", Some(2)),
            row(d(1998, 6, 30), 1, "A", None),
            row(d(1999, 3, 31), 1, "A", Some(4)),
        ];
        let lf = holdings_to_frame(&rows).unwrap().lazy();
        let out = typecodes(backfill_pre_cutoff(lf, d(1998, 12, 1)));
        assert_eq!(out[2], ("A".into(), Some(2)));
        // Pre-cutoff rows are never rewritten.
        assert_eq!(out[1], ("A".into(), None));
    }

    #[test]
    fn same_number_different_name_is_a_different_identity() {
        let rows = vec![
            row(d(1990, 3, 31), 7, "OLD FIRM", Some(1)),
            row(d(2005, 3, 31), 7, "NEW FIRM", Some(3)),
        ];
        let lf = holdings_to_frame(&rows).unwrap().lazy();
        let out = typecodes(canonicalize_latest(backfill_pre_cutoff(lf, d(1998, 12, 1))));
        assert_eq!(
            out,
            vec![("NEW FIRM".into(), Some(3)), ("OLD FIRM".into(), Some(1))]
        );
    }

    #[test]
    fn canonical_code_is_latest_non_null() {
        let rows = vec![
            row(d(2000, 3, 31), 1, "A", Some(1)),
            row(d(2000, 6, 30), 1, "A", Some(2)),
            row(d(2000, 9, 30), 1, "A", None),
            row(d(2001, 3, 31), 2, "B", None),
        ];
        let lf = holdings_to_frame(&rows).unwrap().lazy();
        let out = typecodes(canonicalize_latest(lf));
        assert_eq!(
            out,
            vec![
                ("A".into(), Some(2)),
                ("A".into(), Some(2)),
                ("A".into(), Some(2)),
                ("B".into(), None),
            ]
        );
    }
}
