use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use doppler_core::config::{MeasureConfig, RvGrid};
use doppler_core::consts::REDUCE_NORM_NITER;
use doppler_core::io::{read_spectrum, read_templates, write_rv_results, RvRecord};
use doppler_core::normalize::{NormConfig, NormMethod};
use doppler_core::reduce::{measure_spectrum, ReduceParams};
use doppler_core::rvm::{Rvm, RvmConfig};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::warn;

use crate::summary;

#[derive(Clone, ValueEnum)]
pub enum NormArg {
    Spline,
    Poly,
    None,
}

#[derive(Args)]
pub struct MeasureArgs {
    /// Input spectrum CSV files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Template library CSV
    #[arg(long)]
    pub templates: PathBuf,

    /// First velocity of the search grid (km/s)
    #[arg(long, default_value = "-500", allow_hyphen_values = true)]
    pub rv_start: f64,

    /// Last velocity of the search grid (km/s)
    #[arg(long, default_value = "500", allow_hyphen_values = true)]
    pub rv_stop: f64,

    /// Velocity grid step (km/s)
    #[arg(long, default_value = "10")]
    pub rv_step: f64,

    /// Continuum normalization for spectra and templates
    #[arg(long, value_enum, default_value = "spline")]
    pub norm: NormArg,

    /// Polynomial degree (poly normalization)
    #[arg(long, default_value = "3")]
    pub degree: usize,

    /// Spline knot spacing in wavelength units (spline normalization)
    #[arg(long, default_value = "50")]
    pub knot_spacing: f64,

    /// Pixels dropped at each end of every spectrum
    #[arg(long, default_value = "50")]
    pub cushion: usize,

    /// Skip cosmic-ray removal
    #[arg(long)]
    pub no_cosmic: bool,

    /// Results CSV
    #[arg(short, long, default_value = "rv.csv")]
    pub output: PathBuf,
}

pub fn run(args: &MeasureArgs) -> Result<()> {
    execute(&build_config_from_args(args))
}

fn build_config_from_args(args: &MeasureArgs) -> MeasureConfig {
    let method = match args.norm {
        NormArg::Spline => NormMethod::Spline {
            knot_spacing: args.knot_spacing,
        },
        NormArg::Poly => NormMethod::Poly {
            degree: args.degree,
        },
        NormArg::None => NormMethod::None,
    };
    let norm = NormConfig {
        method,
        ..Default::default()
    };

    MeasureConfig {
        inputs: args.files.clone(),
        templates: args.templates.clone(),
        output: args.output.clone(),
        rv_grid: RvGrid {
            start: args.rv_start,
            stop: args.rv_stop,
            step: args.rv_step,
        },
        reduce: ReduceParams {
            npix_cushion: args.cushion,
            remove_cosmic_rays: !args.no_cosmic,
            norm: Some(NormConfig {
                niter: REDUCE_NORM_NITER,
                ..norm.clone()
            }),
            ..Default::default()
        },
        rvm: RvmConfig {
            norm,
            ..Default::default()
        },
    }
}

/// Measure every input of `config` and write the results table.
///
/// A spectrum that fails is reported and skipped; the command fails only
/// when nothing could be measured.
pub fn execute(config: &MeasureConfig) -> Result<()> {
    summary::print_measure_summary(config);

    let set = read_templates(&config.templates)
        .with_context(|| format!("Failed to read templates {}", config.templates.display()))?;
    let rvm = Rvm::new(set.labels, set.wave, set.flux, config.rvm.clone())?;
    let grid = config.rv_grid.to_vec()?;

    let pb = ProgressBar::new(config.inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Measuring [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let outcomes: Vec<(&PathBuf, Result<RvRecord>)> = config
        .inputs
        .par_iter()
        .map(|path| {
            let outcome = measure_file(path, &rvm, &config.reduce, &grid);
            pb.inc(1);
            (path, outcome)
        })
        .collect();
    pb.finish_and_clear();

    let mut records = Vec::with_capacity(outcomes.len());
    for (path, outcome) in outcomes {
        match outcome {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Measurement failed");
                eprintln!("Skipping {}: {:#}", path.display(), e);
            }
        }
    }

    if records.is_empty() {
        bail!("No spectrum could be measured");
    }

    write_rv_results(&config.output, &records)
        .with_context(|| format!("Failed to write {}", config.output.display()))?;
    summary::print_rv_table(&records);
    println!("Results saved to {}", config.output.display());

    Ok(())
}

fn measure_file(
    path: &Path,
    rvm: &Rvm,
    params: &ReduceParams,
    grid: &[f64],
) -> Result<RvRecord> {
    let spec = read_spectrum(path)
        .with_context(|| format!("Failed to read spectrum {}", path.display()))?;
    let (reduced, result) = measure_spectrum(&spec, rvm, params, grid)?;

    Ok(RvRecord {
        file: path.display().to_string(),
        rv_opt: result.rv_opt,
        rv_best: result.rv_best,
        ccf_max: result.ccf_max,
        success: result.success,
        imod: result.imod,
        template: result.label,
        cosmic_rays: reduced.cosmic_ray_count(),
    })
}
