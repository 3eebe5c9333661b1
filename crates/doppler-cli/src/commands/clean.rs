use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use doppler_core::debad::{debad_report, DebadParams, NSigma};
use doppler_core::io::{read_spectrum, write_spectrum};

use crate::summary;

#[derive(Args)]
pub struct CleanArgs {
    /// Input spectrum CSV
    pub file: PathBuf,

    /// Clip threshold for dips, in units of the local noise
    #[arg(long, default_value = "8.0")]
    pub lower: f64,

    /// Clip threshold for spikes, in units of the local noise
    #[arg(long, default_value = "4.0")]
    pub upper: f64,

    /// Median filter width in pixels (odd)
    #[arg(long, default_value = "21")]
    pub median_width: usize,

    /// Width used to grow flagged regions
    #[arg(long, default_value = "7")]
    pub dilation: usize,

    /// Maximum rejection rounds
    #[arg(long, default_value = "3")]
    pub max_iter: usize,

    /// Output file path
    #[arg(short, long, default_value = "cleaned.csv")]
    pub output: PathBuf,
}

pub fn run(args: &CleanArgs) -> Result<()> {
    let spec = read_spectrum(&args.file)
        .with_context(|| format!("Failed to read spectrum {}", args.file.display()))?;

    let params = DebadParams {
        nsigma: NSigma {
            lower: args.lower,
            upper: args.upper,
        },
        median_width: args.median_width,
        dilation_width: args.dilation,
        max_iterations: args.max_iter,
        ..Default::default()
    };

    let report = debad_report(spec.wave.view(), spec.flux.view(), &params)
        .with_context(|| format!("Bad-pixel rejection failed for {}", args.file.display()))?;
    write_spectrum(
        &args.output,
        spec.wave.view(),
        report.flux.view(),
        report.mask.view(),
    )
    .with_context(|| format!("Failed to write {}", args.output.display()))?;

    summary::print_clean_summary(&args.file, spec.len(), &report);
    println!("Output saved to {}", args.output.display());

    Ok(())
}
