//! Final category assignment.

use super::backfill::identity;
use super::filter::one_of;
use super::policy::{FundMatch, OverridePrecedence, ReclassifyPolicy};
use crate::data::frame::quarter_index;
use crate::data::schema::columns::*;
use crate::data::PensionList;
use crate::domain::Category;
use polars::prelude::*;
use tracing::{debug, warn};

const FUND: &str = "__is_fund";
const PENSION: &str = "__is_pension";
const QTR: &str = "__qtr";

/// Mark every row whose Manager Identity matches the Fund Registry.
///
/// The flag is identity-wide: a single matching filing marks all filings of
/// that identity.
pub fn flag_fund_members(
    lf: LazyFrame,
    registry: LazyFrame,
    fund_match: FundMatch,
) -> PolarsResult<LazyFrame> {
    let registry = match fund_match {
        FundMatch::NumberByQuarter { .. } => registry
            .select([col(MGRCO), quarter_index(col(FDATE)).alias(QTR)])
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?,
        FundMatch::NameAnyQuarter { registry_cutoff } => {
            let registry = match registry_cutoff {
                Some(cutoff) => registry.filter(col(FDATE).lt_eq(lit(cutoff))),
                None => registry,
            };
            registry
                .select([col(MGRCO)])
                .unique_stable(None, UniqueKeepStrategy::First)
                .collect()?
        }
    };

    if registry.height() == 0 {
        warn!("fund registry is empty; no manager will be classified as a mutual fund");
        return Ok(lf.with_column(lit(false).alias(FUND)));
    }

    let members = match fund_match {
        FundMatch::NumberByQuarter { clamp_early } => {
            let mut qtr = quarter_index(col(FDATE));
            if clamp_early {
                if let Some(earliest) = registry.column(QTR)?.i32()?.min() {
                    debug!(earliest_quarter = earliest, "clamping early filings to registry start");
                    qtr = when(qtr.clone().lt(lit(earliest)))
                        .then(lit(earliest))
                        .otherwise(qtr);
                }
            }
            lf.clone()
                .select([
                    col(MGRNO),
                    col(MGRNAME),
                    col(MGRNO).cast(DataType::String).alias(MGRCO),
                    qtr.alias(QTR),
                ])
                .join(
                    registry.lazy(),
                    [col(MGRCO), col(QTR)],
                    [col(MGRCO), col(QTR)],
                    JoinArgs::new(JoinType::Inner),
                )
                .select(identity())
        }
        FundMatch::NameAnyQuarter { .. } => lf
            .clone()
            .select(identity())
            .unique_stable(None, UniqueKeepStrategy::First)
            .join(
                registry.lazy().select([col(MGRCO).alias(MGRNAME)]),
                [col(MGRNAME)],
                [col(MGRNAME)],
                JoinArgs::new(JoinType::Inner),
            ),
    }
    .unique_stable(None, UniqueKeepStrategy::First)
    .with_column(lit(true).alias(FUND));

    Ok(lf
        .join(
            members,
            identity(),
            identity(),
            JoinArgs::new(JoinType::Left),
        )
        .with_column(col(FUND).fill_null(lit(false))))
}

/// Mark every row whose manager name is on the pension-fund list.
pub fn flag_pension_members(lf: LazyFrame, pension: &PensionList) -> PolarsResult<LazyFrame> {
    if pension.is_empty() {
        debug!("pension-fund list is empty");
    }
    let names = pension
        .to_frame()?
        .lazy()
        .with_column(lit(true).alias(PENSION));
    Ok(lf
        .join(
            names,
            [col(MGRNAME)],
            [col(MGRNAME)],
            JoinArgs::new(JoinType::Left),
        )
        .with_column(col(PENSION).fill_null(lit(false))))
}

/// Category code for a row carrying the fund and pension flags.
///
/// Overrides are tested first in precedence order, then the plain typecode
/// rules; anything left over is Other.
pub fn category_expr(policy: &ReclassifyPolicy) -> Expr {
    let eligible = || one_of(TYPECODE, &policy.override_codes);
    let fund = (col(FUND).and(eligible()), Category::MutualFund);
    let pension = (col(PENSION).and(eligible()), Category::PensionFund);
    let (first, second) = match policy.precedence {
        OverridePrecedence::PensionOverFund => (pension, fund),
        OverridePrecedence::FundOverPension => (fund, pension),
    };

    when(first.0)
        .then(lit(first.1.code()))
        .when(second.0)
        .then(lit(second.1.code()))
        .when(col(TYPECODE).eq(lit(1i64)))
        .then(lit(Category::Bank.code()))
        .when(col(TYPECODE).eq(lit(2i64)))
        .then(lit(Category::Insurance.code()))
        .when(one_of(TYPECODE, &policy.advisor_codes))
        .then(lit(Category::InvestmentAdvisor.code()))
        .otherwise(lit(Category::Other.code()))
}

/// Flag, categorize and replace `typecode` with the category code.
pub fn categorize(
    lf: LazyFrame,
    registry: LazyFrame,
    pension: &PensionList,
    policy: &ReclassifyPolicy,
) -> PolarsResult<LazyFrame> {
    let lf = flag_fund_members(lf, registry, policy.fund_match)?;
    let lf = flag_pension_members(lf, pension)?;
    Ok(lf
        .with_column(category_expr(policy).cast(DataType::Int64).alias(TYPECODE))
        .select([all().exclude([FUND, PENSION])]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flagged(codes: &[Option<i64>], fund: &[bool], pension: &[bool]) -> LazyFrame {
        df! {
            TYPECODE => codes,
            FUND => fund,
            PENSION => pension,
        }
        .unwrap()
        .lazy()
    }

    fn categories(lf: LazyFrame, policy: &ReclassifyPolicy) -> Vec<Option<i64>> {
        let df = lf
            .select([category_expr(policy).alias("category")])
            .collect()
            .unwrap();
        df.column("category")
            .unwrap()
            .cast(&DataType::Int64)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn plain_typecode_rules() {
        let lf = flagged(
            &[Some(1), Some(2), Some(3), Some(4), Some(5), None],
            &[false; 6],
            &[false; 6],
        );
        assert_eq!(
            categories(lf, &ReclassifyPolicy::default()),
            vec![Some(1), Some(2), Some(3), Some(3), Some(6), Some(6)]
        );
    }

    #[test]
    fn advisor_set_is_configurable() {
        let policy = ReclassifyPolicy {
            advisor_codes: vec![3],
            ..ReclassifyPolicy::default()
        };
        let lf = flagged(&[Some(3), Some(4)], &[false; 2], &[false; 2]);
        assert_eq!(categories(lf, &policy), vec![Some(3), Some(6)]);
    }

    #[test]
    fn overrides_require_eligible_typecode() {
        let lf = flagged(
            &[Some(1), Some(2), Some(5), Some(5)],
            &[true, false, true, false],
            &[false, true, false, true],
        );
        assert_eq!(
            categories(lf, &ReclassifyPolicy::default()),
            vec![Some(1), Some(2), Some(4), Some(5)]
        );
    }

    #[test]
    fn precedence_decides_double_members() {
        let both = || flagged(&[Some(3)], &[true], &[true]);
        assert_eq!(categories(both(), &ReclassifyPolicy::default()), vec![Some(5)]);

        let fund_first = ReclassifyPolicy {
            precedence: OverridePrecedence::FundOverPension,
            ..ReclassifyPolicy::default()
        };
        assert_eq!(categories(both(), &fund_first), vec![Some(4)]);
    }
}
