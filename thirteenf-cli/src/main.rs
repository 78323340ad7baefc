//! 13F CLI: report build, reclassification and Raw Store commands.
//!
//! Commands:
//! - `build`: reclassify and aggregate every window, write `.tex`, `.bib`, CSV and manifest
//! - `clean`: run the reclassifier alone and write the cleaned panel to Parquet
//! - `summarize`: reclassify one window and print its period tables as Markdown
//! - `check`: validate the Raw Store and report row counts and coverage
//! - `synth`: write a deterministic synthetic Raw Store
//! - `init-config`: write the default TOML configuration

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thirteenf_core::data::synthetic::{generate, SyntheticConfig};
use thirteenf_core::{aggregate, reclassify, DateWindow, RawStore};
use thirteenf_report::reporting::{build_and_export, render_summaries};
use thirteenf_report::ReportConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "thirteenf",
    about = "13F institutional holdings: reclassification and summary tables by institution type"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full report from a TOML config (defaults when omitted).
    Build {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the config's Raw Store directory.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Override the config's output directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Reclassify one window and write the cleaned panel to Parquet.
    Clean {
        /// Window start (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// Window end (YYYY-MM-DD).
        #[arg(long)]
        end: String,

        /// Path to a TOML config file (for the classification policy).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Raw Store directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Output Parquet file.
        #[arg(long)]
        out: PathBuf,
    },
    /// Reclassify one window and print summary tables for the given periods.
    Summarize {
        /// Window start (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// Window end (YYYY-MM-DD).
        #[arg(long)]
        end: String,

        /// Reporting period as START:END; repeat in chronological order.
        #[arg(long = "period", required = true)]
        periods: Vec<String>,

        /// Path to a TOML config file (for policy and aggregation options).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Raw Store directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Validate the Raw Store schema and report row counts and date coverage.
    Check {
        /// Raw Store directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Write a deterministic synthetic Raw Store.
    Synth {
        /// Target Raw Store directory.
        #[arg(long)]
        data_dir: PathBuf,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of managers.
        #[arg(long, default_value_t = 60)]
        managers: usize,
    },
    /// Write the default configuration as TOML.
    InitConfig {
        /// Destination file.
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            config,
            data_dir,
            output_dir,
        } => run_build(config, data_dir, output_dir),
        Commands::Clean {
            start,
            end,
            config,
            data_dir,
            out,
        } => run_clean(&start, &end, config, &data_dir, &out),
        Commands::Summarize {
            start,
            end,
            periods,
            config,
            data_dir,
        } => run_summarize(&start, &end, &periods, config, &data_dir),
        Commands::Check { data_dir } => run_check(&data_dir),
        Commands::Synth {
            data_dir,
            seed,
            managers,
        } => run_synth(&data_dir, seed, managers),
        Commands::InitConfig { path, force } => run_init_config(&path, force),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn parse_window(start: &str, end: &str) -> Result<DateWindow> {
    Ok(DateWindow::new(parse_date(start)?, parse_date(end)?))
}

fn parse_period(spec: &str) -> Result<DateWindow> {
    let Some((start, end)) = spec.split_once(':') else {
        bail!("period '{spec}' must be START:END");
    };
    parse_window(start, end)
}

fn load_config(path: Option<PathBuf>) -> Result<ReportConfig> {
    match path {
        Some(path) => ReportConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ReportConfig::default()),
    }
}

fn run_build(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }

    let (output, paths) = build_and_export(&config)?;

    for window in &output.windows {
        println!(
            "{}: {} cleaned rows, {} periods, fingerprint {}",
            window.name,
            window.fingerprint.rows,
            window.summaries.len(),
            window.fingerprint.hash
        );
    }
    println!("Report written to: {}", paths.report_tex.display());
    println!("Manifest: {}", paths.manifest.display());
    Ok(())
}

fn run_clean(
    start: &str,
    end: &str,
    config_path: Option<PathBuf>,
    data_dir: &Path,
    out: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    let window = parse_window(start, end)?;
    let store = RawStore::new(data_dir);

    let panel = reclassify(window, &store, &config.policy)?;
    panel.write_parquet(out)?;

    info!(rows = panel.height(), out = %out.display(), "cleaned panel written");
    println!("{} rows for {} written to {}", panel.height(), window, out.display());
    Ok(())
}

fn run_summarize(
    start: &str,
    end: &str,
    periods: &[String],
    config_path: Option<PathBuf>,
    data_dir: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    let window = parse_window(start, end)?;
    let periods = periods
        .iter()
        .map(|p| parse_period(p))
        .collect::<Result<Vec<_>>>()?;

    let store = RawStore::new(data_dir);
    let panel = reclassify(window, &store, &config.policy)?;
    let summaries = aggregate(&panel, &periods, &config.aggregate)?;

    println!("{}", render_summaries(&window.label(), &summaries));
    Ok(())
}

fn run_check(data_dir: &Path) -> Result<()> {
    let store = RawStore::new(data_dir);
    let status = store.status()?;

    let span = |first: Option<NaiveDate>, last: Option<NaiveDate>| match (first, last) {
        (Some(a), Some(b)) => format!("{a} .. {b}"),
        _ => "-".to_string(),
    };

    println!("Raw Store: {}", data_dir.display());
    println!(
        "  holdings:  {:>10} rows  {:>6} managers  {}",
        status.holdings_rows,
        status.managers,
        span(status.holdings_first, status.holdings_last)
    );
    println!(
        "  registry:  {:>10} rows  {:>6}           {}",
        status.registry_rows,
        "",
        span(status.registry_first, status.registry_last)
    );
    println!("  pension list: {} names", status.pension_names);
    Ok(())
}

fn run_synth(data_dir: &Path, seed: u64, managers: usize) -> Result<()> {
    let config = SyntheticConfig {
        seed,
        managers,
        ..SyntheticConfig::default()
    };
    let synthetic = generate(&config);
    let store = RawStore::new(data_dir);
    synthetic.write_to(&store)?;

    println!(
        "Synthetic Raw Store written to {} ({} holdings, {} registry rows, {} pension names)",
        data_dir.display(),
        synthetic.holdings.len(),
        synthetic.registry.len(),
        synthetic.pension.len()
    );
    Ok(())
}

fn run_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let toml = ReportConfig::default().to_toml()?;
    std::fs::write(path, toml).with_context(|| format!("writing {}", path.display()))?;
    println!("Default config written to {}", path.display());
    Ok(())
}
