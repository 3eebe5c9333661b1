mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "doppler", about = "Spectrum cleaning and radial-velocity measurement")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show spectrum or template library metadata
    Info(commands::info::InfoArgs),
    /// Remove cosmic rays and bad pixels from a spectrum
    Clean(commands::clean::CleanArgs),
    /// Measure radial velocities against a template library
    Measure(commands::measure::MeasureArgs),
    /// Measure radial velocities from a TOML config
    Run(commands::run::RunArgs),
    /// Print or save a default measurement config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Clean(args) => commands::clean::run(args),
        Commands::Measure(args) => commands::measure::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
