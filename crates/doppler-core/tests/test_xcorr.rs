#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::{array, Array1};

use doppler_core::error::DopplerError;
use doppler_core::xcorr::{shifted_template, CrossCorrelator, PearsonCorrelator};

// ---------------------------------------------------------------------------
// PearsonCorrelator::xcorr
// ---------------------------------------------------------------------------

#[test]
fn test_pearson_identical_is_one() {
    let a = array![1.0, 0.5, 0.8, 0.2, 0.9];
    assert_abs_diff_eq!(PearsonCorrelator.xcorr(a.view(), a.view()), 1.0, epsilon = 1e-12);
}

#[test]
fn test_pearson_ignores_offset_and_scale() {
    let a = array![1.0, 0.5, 0.8, 0.2, 0.9];
    let b = a.mapv(|v| 3.0 * v + 7.0);
    assert_abs_diff_eq!(PearsonCorrelator.xcorr(a.view(), b.view()), 1.0, epsilon = 1e-12);
}

#[test]
fn test_pearson_anticorrelated_is_minus_one() {
    let a = array![1.0, 2.0, 3.0, 4.0];
    let b = a.mapv(|v| -v);
    assert_abs_diff_eq!(PearsonCorrelator.xcorr(a.view(), b.view()), -1.0, epsilon = 1e-12);
}

#[test]
fn test_pearson_constant_is_nan() {
    let a = array![1.0, 1.0, 1.0];
    let b = array![0.2, 0.4, 0.1];
    assert!(PearsonCorrelator.xcorr(a.view(), b.view()).is_nan());
}

// ---------------------------------------------------------------------------
// Velocity grid
// ---------------------------------------------------------------------------

#[test]
fn test_xcorr_rvgrid_peaks_at_true_velocity() {
    let wave_mod = common::linspace(4950.0, 5350.0, 8001);
    let lines = [5080.0, 5150.0, 5250.0];
    let flux_mod = common::absorption_lines(&wave_mod, &lines, 0.5, 0.5);

    let wave_obs = common::linspace(5000.0, 5300.0, 3001);
    let flux_obs = common::shifted_lines(&wave_obs, &lines, 0.5, 0.5, 60.0);

    let grid = common::rv_grid(-200.0, 200.0, 20.0);
    let ccf = PearsonCorrelator
        .xcorr_rvgrid(
            wave_obs.view(),
            flux_obs.view(),
            wave_mod.view(),
            flux_mod.view(),
            &grid,
        )
        .unwrap();

    assert_eq!(ccf.len(), grid.len());
    let best = ccf
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(k, _)| k)
        .unwrap();
    assert_eq!(grid[best], 60.0);
    assert!(ccf[best] > 0.99);
}

#[test]
fn test_shifted_template_no_overlap() {
    let wave_mod = common::linspace(5000.0, 5100.0, 101);
    let flux_mod = Array1::ones(101);
    let wave_obs = common::linspace(6000.0, 6100.0, 101);
    let err = shifted_template(wave_obs.view(), wave_mod.view(), flux_mod.view(), 0.0).unwrap_err();
    assert!(matches!(err, DopplerError::NoOverlap { .. }));
}

#[test]
fn test_shifted_template_zero_velocity_is_identity_on_same_grid() {
    let wave = common::linspace(5000.0, 5010.0, 101);
    let flux = common::absorption_lines(&wave, &[5005.0], 0.3, 0.4);
    let shifted = shifted_template(wave.view(), wave.view(), flux.view(), 0.0).unwrap();
    assert_eq!(shifted, flux);
}
