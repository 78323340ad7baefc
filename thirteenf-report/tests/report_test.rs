//! End-to-end report build on a synthetic Raw Store: pipeline, rendering and
//! artifact export.

use std::path::Path;
use thirteenf_core::aggregate::{PeriodSummaryRow, PeriodSummaryTable};
use thirteenf_core::data::synthetic::{generate, SyntheticConfig};
use thirteenf_core::{Category, DateWindow, PeriodSummaries, RawStore};
use thirteenf_report::reporting::{
    build_and_export, render_document, render_markdown_tables, render_summary_table,
    ReportManifest,
};
use thirteenf_report::{build_report, ReportConfig, SeriesKind, WindowConfig};

fn write_store(data_dir: &Path) {
    let store = RawStore::new(data_dir);
    generate(&SyntheticConfig {
        managers: 24,
        securities: 50,
        ..SyntheticConfig::default()
    })
    .write_to(&store)
    .unwrap();
}

fn config(root: &Path) -> ReportConfig {
    ReportConfig {
        data_dir: root.join("data"),
        output_dir: root.join("output"),
        windows: vec![
            WindowConfig::new(
                "1994-1999",
                DateWindow::ymd((1994, 1, 1), (1999, 12, 31)),
                vec![
                    DateWindow::ymd((1994, 1, 1), (1996, 12, 31)),
                    DateWindow::ymd((1997, 1, 1), (1999, 12, 31)),
                ],
            ),
            WindowConfig::new(
                "2000-2004",
                DateWindow::ymd((2000, 1, 1), (2004, 12, 31)),
                vec![
                    DateWindow::ymd((2000, 1, 1), (2002, 12, 31)),
                    DateWindow::ymd((2003, 1, 1), (2004, 12, 31)),
                ],
            ),
        ],
        ..ReportConfig::default()
    }
}

#[test]
fn build_and_export_writes_every_artifact() {
    let root = tempfile::tempdir().unwrap();
    write_store(&root.path().join("data"));
    let config = config(root.path());

    let (output, paths) = build_and_export(&config).unwrap();

    assert!(paths.report_tex.exists());
    assert!(paths.bibliography.exists());
    assert!(paths.manifest.exists());
    assert_eq!(paths.tables.len(), 4);
    assert!(paths.tables.iter().all(|p| p.exists()));
    assert!(root
        .path()
        .join("output/tables/1994-1999/1994-01-01_1996-12-31.csv")
        .exists());

    let stems: Vec<String> = paths
        .series
        .iter()
        .map(|p| p.file_stem().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        stems,
        SeriesKind::ALL.iter().map(|k| k.file_stem().to_string()).collect::<Vec<_>>()
    );

    let manifest: ReportManifest =
        serde_json::from_str(&std::fs::read_to_string(&paths.manifest).unwrap()).unwrap();
    assert_eq!(manifest.config_hash, output.config_hash);
    assert_eq!(manifest.windows.len(), 2);
    assert_eq!(manifest.windows[0].name, "1994-1999");
    assert_eq!(manifest.windows[1].periods.len(), 2);
    assert_eq!(manifest.windows[0].panel_rows, output.windows[0].fingerprint.rows);
}

#[test]
fn summary_csv_has_six_category_rows() {
    let root = tempfile::tempdir().unwrap();
    write_store(&root.path().join("data"));
    let (_, paths) = build_and_export(&config(root.path())).unwrap();

    for path in &paths.tables {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let codes: Vec<String> = reader
            .records()
            .map(|r| r.unwrap().get(0).unwrap().to_string())
            .collect();
        assert_eq!(codes, vec!["1", "2", "3", "4", "5", "6"]);
    }
}

#[test]
fn series_csv_has_one_column_per_category() {
    let root = tempfile::tempdir().unwrap();
    write_store(&root.path().join("data"));
    let (_, paths) = build_and_export(&config(root.path())).unwrap();

    let mut reader = csv::Reader::from_path(&paths.series[0]).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    let mut expected = vec!["fdate".to_string()];
    expected.extend(Category::ALL.iter().map(|c| c.label().to_string()));
    assert_eq!(headers, expected);
    assert!(reader.records().count() > 0);
}

#[test]
fn rebuilds_are_reproducible() {
    let root = tempfile::tempdir().unwrap();
    write_store(&root.path().join("data"));
    let config = config(root.path());

    let a = build_report(&config).unwrap();
    let b = build_report(&config).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    for (x, y) in a.windows.iter().zip(&b.windows) {
        assert_eq!(x.fingerprint, y.fingerprint);
        assert_eq!(x.summaries, y.summaries);
    }
    assert_eq!(render_markdown_tables(&a), render_markdown_tables(&b));
}

#[test]
fn document_contains_tables_figures_and_bibliography() {
    let root = tempfile::tempdir().unwrap();
    write_store(&root.path().join("data"));
    let intro = root.path().join("intro.md");
    std::fs::write(&intro, "# Demand System Asset Pricing\n\n- holdings\n- *institutions*\n").unwrap();
    let config = ReportConfig {
        intro_markdown: Some(intro),
        ..config(root.path())
    };

    let output = build_report(&config).unwrap();
    let tex = render_document(&output);

    assert!(tex.starts_with("\\documentclass{article}"));
    assert!(tex.contains("\\section*{Demand System Asset Pricing}"));
    assert!(tex.contains("\\item \\textit{institutions}"));
    assert_eq!(tex.matches("Table D1").count(), 2);
    assert_eq!(tex.matches("A. Banks").count(), 2);
    assert!(tex.contains("series/aum\\_totals.csv"));
    assert!(tex.contains("\\nocite{koijen2019demand}"));
    assert!(tex.trim_end().ends_with("\\end{document}"));
}

#[test]
fn missing_category_renders_as_zero_row() {
    let period = DateWindow::ymd((2023, 1, 1), (2023, 12, 31));
    let mut bank = PeriodSummaryRow::zero(Category::Bank);
    bank.count = 3;
    bank.market_held_pct = 11;
    let summaries: PeriodSummaries = std::iter::once(PeriodSummaryTable {
        period,
        rows: vec![bank],
    })
    .collect();

    let tex = render_summary_table("2018-2023", &summaries);
    assert!(tex.contains("2023-2023 & 3 & 11 & 0 & 0 & & 0 & 0 & & 0 & 0 \\\\"));
    assert_eq!(
        tex.matches("2023-2023 & 0 & 0 & 0 & 0 & & 0 & 0 & & 0 & 0 \\\\").count(),
        5
    );
    for category in Category::ALL {
        assert!(tex.contains(category.table_heading()));
    }
}
