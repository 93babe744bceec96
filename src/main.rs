//! Command-line entry point for the fish pass particle analyzer.
//!
//! Reads a particle-tracking log from a hydraulic simulation, aggregates
//! per-section statistics into `Values.csv`, and renders one scatter plot
//! per reported section.

use clap::Parser;
use env_logger::Builder;
use log::{LevelFilter, info};
use std::path::PathBuf;

mod analysis;
mod config;
mod parser;
mod pipeline;
mod render;

use config::AnalyzerConfig;
use render::ScatterRenderer;

#[derive(Parser)]
#[command(name = "fishpass-particle-analyzer")]
#[command(about = "Analyzes particle-tracking logs from technical fish pass simulations", long_about = None)]
struct Cli {
    /// Path to the simulation log; defaults to TechnicalFishPass.log next to
    /// the executable
    log_file: Option<PathBuf>,
    /// Configuration file (defaults to analyzer.toml next to the log file,
    /// when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    Builder::new().filter_level(LevelFilter::Info).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let log_path = cli
        .log_file
        .unwrap_or_else(AnalyzerConfig::default_log_path);

    let config = match cli.config {
        Some(path) => AnalyzerConfig::load(&path)?,
        None => {
            let implicit = AnalyzerConfig::config_path_for_log(&log_path);
            if implicit.is_file() {
                AnalyzerConfig::load(&implicit)?
            } else {
                AnalyzerConfig::default()
            }
        }
    };

    info!("Processing {}", log_path.display());

    let renderer = ScatterRenderer::new(&config);
    let report = pipeline::run(&config, &log_path, &renderer)?;
    pipeline::finish_report(&report, &config.output_dir.join("Values.csv"))?;
    Ok(())
}
