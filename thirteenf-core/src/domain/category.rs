//! Institution-type categories assigned by the reclassifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Corrected institution type. The discriminant is the published typecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Bank = 1,
    Insurance = 2,
    InvestmentAdvisor = 3,
    MutualFund = 4,
    PensionFund = 5,
    Other = 6,
}

impl Category {
    /// All categories in typecode order. Summary tables always carry one row per entry.
    pub const ALL: [Category; 6] = [
        Category::Bank,
        Category::Insurance,
        Category::InvestmentAdvisor,
        Category::MutualFund,
        Category::PensionFund,
        Category::Other,
    ];

    pub const fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Short label used for CSV headers and series columns.
    pub const fn label(self) -> &'static str {
        match self {
            Category::Bank => "Bank",
            Category::Insurance => "Insurance",
            Category::InvestmentAdvisor => "Investment Advisor",
            Category::MutualFund => "Mutual Fund",
            Category::PensionFund => "Pension Fund",
            Category::Other => "Other",
        }
    }

    /// Block heading in the published summary table.
    pub const fn table_heading(self) -> &'static str {
        match self {
            Category::Bank => "A. Banks",
            Category::Insurance => "B. Insurance companies",
            Category::InvestmentAdvisor => "C. Investment advisors",
            Category::MutualFund => "D. Mutual funds",
            Category::PensionFund => "E. Pension funds",
            Category::Other => "F. Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
