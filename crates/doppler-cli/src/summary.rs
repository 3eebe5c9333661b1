use std::path::Path;

use console::Style;
use doppler_core::config::MeasureConfig;
use doppler_core::debad::DebadReport;
use doppler_core::io::RvRecord;
use doppler_core::reduce::WaveTarget;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    warn: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            warn: Style::new().yellow().bold(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!(
        "  {}",
        s.title
            .apply_to("\u{2550}".repeat(title.chars().count()))
    );
    println!();
}

pub fn print_measure_summary(config: &MeasureConfig) {
    let s = Styles::new();
    print_title(&s, "Doppler Measurement");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Inputs"),
        s.value.apply_to(format!("{} file(s)", config.inputs.len()))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Templates"),
        s.path.apply_to(config.templates.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Velocity"),
        s.value.apply_to(&config.rv_grid)
    );
    println!();

    // Reduction
    let reduce = &config.reduce;
    println!("  {}", s.header.apply_to("Reduction"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Cushion"),
        s.value.apply_to(format!("{} px", reduce.npix_cushion))
    );
    if reduce.remove_cosmic_rays {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Cosmics"),
            s.method.apply_to(format!(
                "lower {} / upper {}, {} rounds",
                reduce.nsigma.lower, reduce.nsigma.upper, reduce.max_iterations
            ))
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Cosmics"),
            s.disabled.apply_to("disabled")
        );
    }
    let target = match &reduce.wave_target {
        WaveTarget::Observed => "observed grid".to_string(),
        WaveTarget::Limits { lo, hi } => format!("{lo} .. {hi}"),
        WaveTarget::Grid(grid) => format!("{} points", grid.len()),
    };
    println!(
        "    {:<12}{}",
        s.label.apply_to("Grid"),
        s.value.apply_to(target)
    );
    println!();

    // Continuum
    println!("  {}", s.header.apply_to("Continuum"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Templates"),
        s.method.apply_to(&config.rvm.norm.method)
    );
    match reduce.norm {
        Some(ref norm) => println!(
            "    {:<12}{}",
            s.label.apply_to("Spectra"),
            s.method.apply_to(&norm.method)
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Spectra"),
            s.disabled.apply_to("default (required for measurement)")
        ),
    }
    println!();
}

pub fn print_clean_summary(file: &Path, npix: usize, report: &DebadReport) {
    let s = Styles::new();
    print_title(&s, "Bad-Pixel Rejection");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(file.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Pixels"),
        s.value.apply_to(npix)
    );
    for (i, round) in report.rounds.iter().enumerate() {
        println!(
            "    {:<12}{}",
            s.label.apply_to(format!("Round {}", i + 1)),
            s.value.apply_to(format!("{} outlier(s)", round.new_outliers))
        );
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Flagged"),
        s.method.apply_to(format!(
            "{} ({:.2}%)",
            report.flagged(),
            100.0 * report.flagged() as f64 / npix.max(1) as f64
        ))
    );
    println!();
}

pub fn print_rv_table(records: &[RvRecord]) {
    let s = Styles::new();
    print_title(&s, "Radial Velocities");

    println!(
        "  {:<28}{:>12}{:>12}{:>9}  {}",
        s.label.apply_to("File"),
        s.label.apply_to("rv_opt"),
        s.label.apply_to("rv_best"),
        s.label.apply_to("ccf"),
        s.label.apply_to("Template")
    );
    for r in records {
        let rv_opt = format!("{:.3}", r.rv_opt);
        let rv_opt = if r.success {
            s.value.apply_to(rv_opt)
        } else {
            s.warn.apply_to(rv_opt)
        };
        println!(
            "  {:<28}{:>12}{:>12.1}{:>9.4}  {}",
            r.file, rv_opt, r.rv_best, r.ccf_max, s.method.apply_to(&r.template)
        );
    }
    if records.iter().any(|r| !r.success) {
        println!();
        println!(
            "  {}",
            s.warn
                .apply_to("Refinement did not converge where highlighted; rv_best is the safer value")
        );
    }
    println!();
}
