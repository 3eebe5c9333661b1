use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use doppler_core::config::MeasureConfig;

use super::measure::execute;

#[derive(Args)]
pub struct RunArgs {
    /// Measurement config file (TOML)
    #[arg(long)]
    pub config: PathBuf,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let contents = std::fs::read_to_string(&args.config)
        .with_context(|| format!("Failed to read config {}", args.config.display()))?;
    let config: MeasureConfig = toml::from_str(&contents).context("Invalid measurement config")?;
    execute(&config)
}
