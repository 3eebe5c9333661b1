use std::path::PathBuf;

use doppler_core::config::{MeasureConfig, RvGrid};
use doppler_core::debad::{DebadParams, NSigma};
use doppler_core::error::DopplerError;
use doppler_core::normalize::{NormConfig, NormMethod};
use doppler_core::reduce::{ReduceParams, WaveTarget};

// ---------------------------------------------------------------------------
// RvGrid
// ---------------------------------------------------------------------------

#[test]
fn test_rv_grid_default_is_inclusive() {
    let grid = RvGrid::default().to_vec().unwrap();
    assert_eq!(grid.len(), 101);
    assert_eq!(grid[0], -500.0);
    assert_eq!(grid[50], 0.0);
    assert_eq!(grid[100], 500.0);
}

#[test]
fn test_rv_grid_never_overshoots_stop() {
    let grid = RvGrid {
        start: 0.0,
        stop: 1.05,
        step: 0.3,
    }
    .to_vec()
    .unwrap();
    assert_eq!(grid.len(), 4);
    assert!(*grid.last().unwrap() <= 1.05);
}

#[test]
fn test_rv_grid_single_point() {
    let grid = RvGrid {
        start: 12.0,
        stop: 12.0,
        step: 1.0,
    }
    .to_vec()
    .unwrap();
    assert_eq!(grid, vec![12.0]);
}

#[test]
fn test_rv_grid_rejects_bad_step() {
    let grid = RvGrid {
        start: 0.0,
        stop: 10.0,
        step: 0.0,
    };
    assert!(matches!(grid.to_vec(), Err(DopplerError::InvalidParameter(_))));
}

#[test]
fn test_rv_grid_rejects_reversed_bounds() {
    let grid = RvGrid {
        start: 10.0,
        stop: -10.0,
        step: 1.0,
    };
    assert!(matches!(grid.to_vec(), Err(DopplerError::EmptyVelocityGrid)));
}

#[test]
fn test_rv_grid_rejects_oversized_span() {
    let huge = RvGrid {
        start: -1e308,
        stop: 1e308,
        step: 1.0,
    };
    assert!(matches!(huge.to_vec(), Err(DopplerError::InvalidParameter(_))));

    let too_fine = RvGrid {
        start: -500.0,
        stop: 500.0,
        step: 1e-6,
    };
    assert!(matches!(too_fine.to_vec(), Err(DopplerError::InvalidParameter(_))));
}

#[test]
fn test_rv_grid_display() {
    assert_eq!(format!("{}", RvGrid::default()), "-500 .. 500 km/s, step 10");
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn test_debad_defaults() {
    let p = DebadParams::default();
    assert_eq!(p.nsigma, NSigma { lower: 8.0, upper: 4.0 });
    assert_eq!(p.median_width, 21);
    assert_eq!(p.noise_kernel.len, 51);
    assert_eq!(p.noise_kernel.std, 9.0);
    assert_eq!(p.dilation_width, 7);
    assert_eq!(p.max_iterations, 3);
}

#[test]
fn test_reduce_defaults() {
    let p = ReduceParams::default();
    assert_eq!(p.npix_cushion, 50);
    assert!(p.remove_cosmic_rays);
    assert_eq!(p.max_iterations, 5);
    assert_eq!(p.rv, 0.0);
    assert_eq!(p.wave_target, WaveTarget::Observed);
    let norm = p.norm.expect("reduction normalizes by default");
    assert_eq!(norm.niter, 2);
    assert_eq!(norm.method, NormConfig::default().method);
}

#[test]
fn test_norm_defaults() {
    let n = NormConfig::default();
    assert_eq!(n.method, NormMethod::Spline { knot_spacing: 50.0 });
    assert_eq!(n.niter, 3);
    assert_eq!(n.lower, 1.0);
    assert_eq!(n.upper, 3.0);
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[test]
fn test_debad_params_partial_json_fills_defaults() {
    let p: DebadParams = serde_json::from_str(r#"{"median_width": 31}"#).unwrap();
    assert_eq!(p.median_width, 31);
    assert_eq!(p.dilation_width, 7);
    assert_eq!(p.nsigma, NSigma::default());
}

#[test]
fn test_measure_config_toml_round_trip() {
    let config = MeasureConfig {
        inputs: vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")],
        rv_grid: RvGrid {
            start: -100.0,
            stop: 100.0,
            step: 2.0,
        },
        reduce: ReduceParams {
            wave_target: WaveTarget::Limits {
                lo: 5000.0,
                hi: 5300.0,
            },
            norm: Some(NormConfig {
                method: NormMethod::Poly { degree: 4 },
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    let text = toml::to_string_pretty(&config).unwrap();
    let back: MeasureConfig = toml::from_str(&text).unwrap();

    assert_eq!(back.inputs, config.inputs);
    assert_eq!(back.templates, config.templates);
    assert_eq!(back.rv_grid, config.rv_grid);
    assert_eq!(back.reduce, config.reduce);
    assert_eq!(back.rvm, config.rvm);
}

#[test]
fn test_measure_config_minimal_toml() {
    let text = r#"
inputs = ["night1/star.csv"]
templates = "lib.csv"
output = "rv.csv"

[rv_grid]
start = -50.0
stop = 50.0
step = 1.0
"#;
    let config: MeasureConfig = toml::from_str(text).unwrap();
    assert_eq!(config.inputs, vec![PathBuf::from("night1/star.csv")]);
    assert_eq!(config.rv_grid.to_vec().unwrap().len(), 101);
    assert_eq!(config.reduce, ReduceParams::default());
}
