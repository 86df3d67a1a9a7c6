use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

mod chart;
mod config;
mod dates;
mod error;
mod filters;
mod output;
mod patient;

use crate::chart::ChartState;
use crate::config::Config;
use crate::output::{PatientSummary, ReportRenderer};
use crate::patient::Patient;

#[derive(Parser)]
#[command(name = "bpc_filters")]
#[command(about = "Filter a patient's blood pressure records for the pediatric BPC chart")]
struct Cli {
    /// Configuration file path (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Patient JSON file
    #[arg(short, long)]
    patient: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Slider start position (0-100)
    #[arg(long)]
    from: Option<f64>,

    /// Slider end position (0-100)
    #[arg(long)]
    to: Option<f64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("loading configuration from {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => {
            warn!("No configuration given, all filters enabled over the full date range");
            Config::default()
        }
    };

    let patient = Patient::from_file(&cli.patient)
        .with_context(|| format!("loading patient from {:?}", cli.patient))?;
    info!("Loaded {} records for patient {:?}", patient.data.len(), patient.name);

    std::fs::create_dir_all(&cli.output)?;
    let mut renderer = ReportRenderer::new(&cli.output);
    let mut state = ChartState::new(patient, &config);

    let from = cli.from.unwrap_or(config.slider.from);
    let to = cli.to.unwrap_or(config.slider.to);

    // Replay the page's events: slider first, then the checkbox sync.
    // Each one redraws, the last redraw is what ends up on disk.
    state.update_date_range(from, to, &mut renderer)?;
    state.update_filters(&config.checkboxes, &mut renderer)?;

    let filtered = state.filtered_patient()?;
    let summary = PatientSummary::new(&state.patient, &filtered, renderer.label())?;
    renderer.save_summary(&summary)?;
    info!("Results saved to {:?}", cli.output);

    Ok(())
}
