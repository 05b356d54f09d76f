#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the placemark geocoding pipeline.
//!
//! Reads a CSV of coordinate rows from the `data/` working directory,
//! resolves every row to an address through the reverse-geocoding
//! pipeline, and writes `data/<stem>_with_addresses.csv`. Large
//! datasets are checkpointed to `data/<stem>_temp.csv` as they go.
//!
//! Uses `indicatif-log-bridge` (via [`placemark_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use placemark_cli_utils::IndicatifProgress;
use placemark_pipeline::{ProcessConfig, Service};
use placemark_table::Sheet;

/// Directory all input and output files live in.
const DATA_DIR: &str = "data";

#[derive(Parser)]
#[command(name = "placemark", about = "Reverse-geocode a CSV of coordinates")]
struct Cli {
    /// Input CSV file name inside the `data/` directory (e.g. `incidents.csv`)
    file: String,

    /// Number of concurrent geocoding workers
    #[arg(long, default_value = "10")]
    workers: usize,

    /// Per-worker delay in milliseconds before each upstream request
    #[arg(long, default_value = "1500")]
    delay_ms: u64,

    /// Rows per checkpointed batch for large datasets
    #[arg(long, default_value = "1000")]
    batch_size: usize,
}

/// `<stem>` of the input file with `suffix` appended, inside `data/`.
fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    Path::new(DATA_DIR).join(format!("{stem}{suffix}.csv"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let multi = placemark_cli_utils::init_logger();

    std::fs::create_dir_all(DATA_DIR)?;

    let input = Path::new(DATA_DIR).join(&cli.file);
    if !input.exists() {
        log::error!(
            "File not found: {}. Place the input CSV inside the '{DATA_DIR}/' directory.",
            input.display()
        );
        std::process::exit(1);
    }

    let output = derived_path(&input, "_with_addresses");
    let checkpoint = derived_path(&input, "_temp");

    log::info!("Reading {}", input.display());
    let sheet = Sheet::open(&input)?;

    let config = ProcessConfig {
        workers: cli.workers,
        request_delay: Duration::from_millis(cli.delay_ms),
        batch_size: cli.batch_size,
        ..ProcessConfig::default()
    };

    let mut service = Service::new(sheet, placemark_geocoder::registry::service_config(), config);

    let progress = IndicatifProgress::rows_bar(&multi, "Resolving addresses...");
    let start = Instant::now();
    let summary = service.process(Some(&checkpoint), Some(progress)).await?;

    service.sheet().save(&output)?;

    log::info!(
        "Done in {:.1?}: {} resolved, {} skipped of {} rows",
        start.elapsed(),
        summary.resolved,
        summary.skipped,
        summary.total_rows
    );
    log::info!("Results written to {}", output.display());

    Ok(())
}
