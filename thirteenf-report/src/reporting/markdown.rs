//! Markdown rendering of the summary tables, for terminal output.

use thirteenf_core::aggregate::PeriodSummaryRow;
use thirteenf_core::{Category, PeriodSummaries};

use crate::pipeline::ReportOutput;

const HEADER: &str = "| Period | Institutions | % market held | AUM median | AUM p90 | Stocks median | Stocks p90 | Universe median | Universe p90 |\n\
|--------|-------------:|--------------:|-----------:|--------:|--------------:|-----------:|----------------:|-------------:|\n";

fn row_line(period: &str, row: &PeriodSummaryRow) -> String {
    format!(
        "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
        period,
        row.count,
        row.market_held_pct,
        row.aum_median,
        row.aum_p90,
        row.securities_median,
        row.securities_p90,
        row.universe_median,
        row.universe_p90,
    )
}

/// One section per category, one row per period, mirroring Table D1.
pub fn render_summaries(title: &str, summaries: &PeriodSummaries) -> String {
    let mut out = format!("## {title}\n");
    for category in Category::ALL {
        out.push_str(&format!("\n### {}\n\n", category.table_heading()));
        out.push_str(HEADER);
        for table in summaries.iter() {
            let zero = PeriodSummaryRow::zero(category);
            let row = table.row(category).unwrap_or(&zero);
            out.push_str(&row_line(&table.period.label(), row));
        }
    }
    out
}

pub fn render_markdown_tables(output: &ReportOutput) -> String {
    let mut report = format!(
        "# Summary of 13F Institutions by Type\n\nConfig hash: `{}`\n",
        output.config_hash
    );
    for window in &output.windows {
        report.push('\n');
        report.push_str(&render_summaries(&window.name, &window.summaries));
        report.push_str(&format!(
            "\nCleaned panel: {} rows, fingerprint `{}`\n",
            window.fingerprint.rows, window.fingerprint.hash
        ));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use thirteenf_core::aggregate::PeriodSummaryTable;
    use thirteenf_core::DateWindow;

    fn summaries() -> PeriodSummaries {
        let period = DateWindow::ymd((2000, 1, 1), (2004, 12, 31));
        let mut rows: Vec<PeriodSummaryRow> =
            Category::ALL.into_iter().map(PeriodSummaryRow::zero).collect();
        rows[0].count = 7;
        rows[0].aum_median = 120;
        std::iter::once(PeriodSummaryTable { period, rows }).collect()
    }

    #[test]
    fn one_section_per_category() {
        let md = render_summaries("2000-2004", &summaries());
        assert_eq!(md.matches("### ").count(), 6);
        assert!(md.contains("### A. Banks"));
        assert!(md.contains("| 2000-2004 | 7 | 0 | 120 | 0 |"));
    }
}
