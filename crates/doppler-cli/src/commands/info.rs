use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use doppler_core::io::{read_spectrum, read_templates};

#[derive(Args)]
pub struct InfoArgs {
    /// Input spectrum or template CSV
    pub file: PathBuf,

    /// Treat the file as a template library
    #[arg(long)]
    pub templates: bool,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    if args.templates {
        return template_info(args);
    }

    let spec = read_spectrum(&args.file)
        .with_context(|| format!("Failed to read spectrum {}", args.file.display()))?;
    let (lo, hi) = spec.wave_range();

    println!("File:        {}", args.file.display());
    println!("Pixels:      {}", spec.len());
    println!("Wavelength:  {:.3} .. {:.3}", lo, hi);
    if spec.len() > 1 {
        println!("Mean step:   {:.4}", (hi - lo) / (spec.len() - 1) as f64);
    }
    let mut finite: Vec<f64> = spec.flux.iter().copied().filter(|f| f.is_finite()).collect();
    if !finite.is_empty() {
        finite.sort_by(|a, b| a.total_cmp(b));
        println!(
            "Flux:        {:.4} .. {:.4} (median {:.4})",
            finite[0],
            finite[finite.len() - 1],
            finite[finite.len() / 2]
        );
    }

    match spec.ivar {
        Some(ref ivar) => {
            let unknown = ivar.iter().filter(|v| !v.is_finite()).count();
            println!("Ivar:        yes ({} unknown)", unknown);
        }
        None => println!("Ivar:        no"),
    }
    println!("Masked:      {}", spec.masked_count());

    Ok(())
}

fn template_info(args: &InfoArgs) -> Result<()> {
    let set = read_templates(&args.file)
        .with_context(|| format!("Failed to read templates {}", args.file.display()))?;
    let npix = set.wave.len();

    println!("File:        {}", args.file.display());
    println!("Templates:   {}", set.labels.len());
    println!("Pixels:      {}", npix);
    println!(
        "Wavelength:  {:.3} .. {:.3}",
        set.wave[0],
        set.wave[npix - 1]
    );
    for (i, label) in set.labels.iter().enumerate() {
        println!("  {:>3}  {}", i, label);
    }

    Ok(())
}
