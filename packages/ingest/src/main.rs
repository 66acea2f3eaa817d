#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the planning case report harvester.

use std::path::PathBuf;

use chrono::Datelike as _;
use clap::Parser;
use planning_cases_cli_utils::{IndicatifProgress, init_logger};
use planning_cases_ingest::{PipelineConfig, harvest};
use planning_cases_source_models::DateFilter;

#[derive(Parser)]
#[command(
    name = "planning_cases",
    about = "Download biweekly planning case reports and convert them to CSV"
)]
struct Cli {
    /// First year to include (default: the earliest published year)
    #[arg(long)]
    start_year: Option<i32>,
    /// Last year to include (default: the current year)
    #[arg(long)]
    end_year: Option<i32>,
    /// First month (1-12) to include in each year
    #[arg(long)]
    start_month: Option<u32>,
    /// Last month (1-12) to include in each year
    #[arg(long)]
    end_month: Option<u32>,
    /// Directory for downloaded PDFs
    #[arg(long, default_value = "pdfs")]
    pdf_dir: PathBuf,
    /// Directory for per-report and combined CSVs
    #[arg(long, default_value = "csvs")]
    csv_dir: PathBuf,
    /// Process the PDFs already in `--pdf-dir` without querying the index
    #[arg(long)]
    offline: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    let definition = planning_cases_source::registry::load_source()?;

    let filter = DateFilter {
        start_year: cli.start_year,
        end_year: cli.end_year,
        start_month: cli.start_month,
        end_month: cli.end_month,
    };
    let current_year = chrono::Local::now().year();
    let range = filter.resolve(definition.earliest_year, current_year)?;

    let config = PipelineConfig {
        pdf_dir: cli.pdf_dir,
        csv_dir: cli.csv_dir,
        offline: cli.offline,
    };

    log::info!(
        "{}: {} mode, PDFs in {}, CSVs in {}",
        definition.name,
        if config.offline { "offline" } else { "online" },
        config.pdf_dir.display(),
        config.csv_dir.display(),
    );

    let progress = IndicatifProgress::steps_bar(&multi, "Reports", 0);
    let summary = harvest(&definition, &config, &range, progress).await?;

    println!(
        "{} row(s) from {} report(s) written to {}",
        summary.combined_rows,
        summary.selected - summary.fetch_failures - summary.skipped_not_pdf,
        summary.combined_path.display()
    );

    Ok(())
}
