//! Resoscope CLI - live resonance monitoring and recording analysis.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resoscope")]
#[command(author, version, about = "Spring resonance monitor and analyzer", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "resoscope_io=trace" (overrides RUST_LOG)
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor the sensor live: calibrate, filter, and track the resonance
    Monitor(commands::monitor::MonitorArgs),

    /// Record the raw sensor stream to CSV
    Record(commands::record::RecordArgs),

    /// Analyze a recorded CSV file
    Analyze(commands::analyze::AnalyzeArgs),

    /// Show model frequencies and band-pass targets for a mass
    Model(commands::model::ModelArgs),

    /// List serial ports and show which one would be used
    Devices(commands::devices::DevicesArgs),

    /// Show, create, or check the configuration file
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Monitor(args) => commands::monitor::run(args, config),
        Commands::Record(args) => commands::record::run(args, config),
        Commands::Analyze(args) => commands::analyze::run(args, config),
        Commands::Model(args) => commands::model::run(args, config),
        Commands::Devices(args) => commands::devices::run(args, config),
        Commands::Config(args) => commands::config::run(args, config),
    }
}
