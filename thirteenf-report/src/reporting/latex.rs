//! LaTeX rendering: the Table D1 summary, the Markdown introduction and the
//! full document.

use thirteenf_core::aggregate::{PeriodSummaryRow, PeriodSummaryTable};
use thirteenf_core::{Category, PeriodSummaries};

use crate::pipeline::ReportOutput;
use crate::timeseries::SeriesKind;

pub const BIB_KEY: &str = "koijen2019demand";

pub const BIBLIOGRAPHY: &str = r"@article{koijen2019demand,
  title={A demand system approach to asset pricing},
  author={Koijen, Ralph SJ and Yogo, Motohiro},
  journal={Journal of Political Economy},
  volume={127},
  number={4},
  pages={1475--1515},
  year={2019},
  publisher={The University of Chicago Press Chicago, IL}
}
";

const TABLE_HEAD: &str = r"\begin{tabular}{ccccccccccc}
\hline
 & & & \multicolumn{2}{c}{Assets under} & & \multicolumn{2}{c}{} & & \multicolumn{2}{c}{Number of stocks}\\
 & & & \multicolumn{2}{c}{management} & & \multicolumn{2}{c}{Number of} & & \multicolumn{2}{c}{in investment}\\
 & & \% of & \multicolumn{2}{c}{(\$ million)} & & \multicolumn{2}{c}{stocks held} & & \multicolumn{2}{c}{universe}\\
\cline{4-5} \cline{7-8} \cline{10-11}
 & Number of & market & & 90th & & & 90th & & & 90th \\
Period & institutions & held & median & percentile & & median & percentile & & median & percentile \\
\hline
";

const TABLE_TAIL: &str = r"\hline
\end{tabular}}
\end{table}
";

fn period_row(label: &str, row: &PeriodSummaryRow) -> String {
    format!(
        "{label} & {} & {} & {} & {} & & {} & {} & & {} & {} \\\\\n",
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

/// Table D1 for one window: a block per category, a row per period. A
/// category missing from a period's table renders as zeros.
pub fn render_summary_table(caption: &str, summaries: &PeriodSummaries) -> String {
    let mut out = String::new();
    out.push_str("\\begin{table}\n");
    out.push_str(&format!(
        "\\caption*{{Table D1\\\\\nSummary of 13F Institutions by Type, {}}}\n",
        escape(caption)
    ));
    out.push_str("\\centering\n\\resizebox{0.90\\textwidth}{!}{\n");
    out.push_str(TABLE_HEAD);

    for category in Category::ALL {
        out.push_str(&format!(
            "& \\multicolumn{{10}}{{c}}{{{}}}\\\\ \\cline{{2-11}}\n",
            category.table_heading()
        ));
        for table in summaries.iter() {
            let label = table.period.label();
            let row = category_row(table, category);
            out.push_str(&period_row(&label, &row));
        }
        out.push_str("\\cline{2-11}\n");
    }

    out.push_str(TABLE_TAIL);
    out
}

fn category_row(table: &PeriodSummaryTable, category: Category) -> PeriodSummaryRow {
    table
        .row(category)
        .cloned()
        .unwrap_or_else(|| PeriodSummaryRow::zero(category))
}

/// Escape the characters LaTeX treats specially in running text.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' | '%' | '$' | '#' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '\\' => out.push_str("\\textbackslash{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace `*x*` and `_x_` spans with `\textit{x}`. Each opener pairs with
/// the next identical delimiter; an unpaired delimiter is kept as is.
fn convert_italics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(['*', '_']) {
        let delim = &rest[start..start + 1];
        let after = &rest[start + 1..];
        match after.find(delim) {
            Some(end) => {
                out.push_str(&rest[..start]);
                out.push_str("\\textit{");
                out.push_str(&after[..end]);
                out.push('}');
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[..start + 1]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Convert the small Markdown subset used in report introductions.
///
/// Headings map to starred sections, `- ` runs to `itemize`, `---` to a
/// horizontal rule. Blank lines stay as paragraph breaks.
pub fn markdown_to_latex(markdown: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_list = false;

    let close_list = |lines: &mut Vec<String>, in_list: &mut bool| {
        if *in_list {
            lines.push("\\end{itemize}".to_string());
            *in_list = false;
        }
    };

    for line in markdown.lines() {
        if let Some(text) = line.strip_prefix("### ") {
            close_list(&mut lines, &mut in_list);
            lines.push(format!("\\subsubsection*{{{}}}", convert_italics(text.trim_end())));
        } else if let Some(text) = line.strip_prefix("## ") {
            close_list(&mut lines, &mut in_list);
            lines.push(format!("\\subsection*{{{}}}", convert_italics(text.trim_end())));
        } else if let Some(text) = line.strip_prefix("# ") {
            close_list(&mut lines, &mut in_list);
            lines.push(format!("\\section*{{{}}}", convert_italics(text.trim_end())));
        } else if let Some(text) = line.strip_prefix("- ") {
            if !in_list {
                lines.push("\\begin{itemize}".to_string());
                in_list = true;
            }
            lines.push(format!("    \\item {}", convert_italics(text.trim_end())));
        } else if line.trim() == "---" {
            close_list(&mut lines, &mut in_list);
            lines.push("\\noindent\\rule{\\linewidth}{0.4pt}".to_string());
        } else if line.trim().is_empty() {
            close_list(&mut lines, &mut in_list);
            lines.push(String::new());
        } else {
            close_list(&mut lines, &mut in_list);
            lines.push(convert_italics(line.trim_end()));
        }
    }
    close_list(&mut lines, &mut in_list);

    lines.join("\n")
}

fn figure_section(kind: SeriesKind) -> String {
    let file = format!("series/{}.csv", kind.file_stem());
    format!(
        "\\section*{{{}}}\nSeries by filing date and institution type: \\texttt{{{}}}.\n\\newpage\n",
        kind.title(),
        escape(&file).replace('_', "\\_"),
    )
}

/// The complete `.tex` document: introduction, one table per window, a
/// section per exported series and the bibliography.
pub fn render_document(output: &ReportOutput) -> String {
    let mut doc = String::new();
    doc.push_str("\\documentclass{article}\n");
    doc.push_str("\\usepackage{caption}\n");
    doc.push_str("\\usepackage[top=0.75in, left=1in, right=1in]{geometry}\n");
    doc.push_str("\\usepackage{graphicx}\n");
    doc.push_str("\\begin{document}\n");

    if let Some(intro) = &output.intro_markdown {
        doc.push_str(&markdown_to_latex(intro));
        doc.push_str("\n\\newpage\n");
    }

    for window in &output.windows {
        doc.push_str(&render_summary_table(&window.range.label(), &window.summaries));
        doc.push_str("\\clearpage\n");
    }

    for series in &output.series {
        doc.push_str(&figure_section(series.kind));
    }

    doc.push_str(&format!("\\nocite{{{BIB_KEY}}}\n"));
    doc.push_str("\\bibliographystyle{plain}\n\\bibliography{paper}\n\\end{document}\n");
    doc
}
