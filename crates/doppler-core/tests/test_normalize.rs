#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array1;

use doppler_core::normalize::{normalize, NormConfig, NormMethod};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const LINES: [f64; 5] = [5040.0, 5090.0, 5150.0, 5210.0, 5260.0];

fn wave() -> Array1<f64> {
    common::linspace(5000.0, 5300.0, 3001)
}

/// Gently curved continuum.
fn continuum(wave: &Array1<f64>) -> Array1<f64> {
    wave.mapv(|w| 1.0 + 0.2 * ((w - 5150.0) / 150.0).powi(2))
}

/// Pixels more than 5 line widths from every line.
fn far_from_lines(wave: &Array1<f64>) -> Vec<usize> {
    (0..wave.len())
        .filter(|&i| LINES.iter().all(|c| (wave[i] - c).abs() > 2.5))
        .collect()
}

fn config(method: NormMethod) -> NormConfig {
    NormConfig {
        method,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

#[test]
fn test_none_returns_unit_continuum() {
    let wave = wave();
    let flux = continuum(&wave);
    let (norm, cont) = normalize(wave.view(), flux.view(), &NormConfig::none()).unwrap();
    assert!(cont.iter().all(|&c| c == 1.0));
    assert_eq!(norm, flux);
}

#[test]
fn test_poly_recovers_continuum_under_lines() {
    let wave = wave();
    let truth = continuum(&wave);
    let flux = &truth * &common::absorption_lines(&wave, &LINES, 0.5, 0.5);

    let (norm, cont) =
        normalize(wave.view(), flux.view(), &config(NormMethod::Poly { degree: 2 })).unwrap();

    for i in far_from_lines(&wave) {
        assert!(
            (cont[i] / truth[i] - 1.0).abs() < 0.01,
            "continuum off by {} at {}",
            cont[i] / truth[i] - 1.0,
            wave[i]
        );
        assert_abs_diff_eq!(norm[i], 1.0, epsilon = 0.01);
    }
}

#[test]
fn test_spline_recovers_continuum_under_lines() {
    let wave = wave();
    let truth = continuum(&wave);
    let flux = &truth * &common::absorption_lines(&wave, &LINES, 0.5, 0.5);

    let (norm, cont) = normalize(wave.view(), flux.view(), &NormConfig::default()).unwrap();

    for i in far_from_lines(&wave) {
        assert!(
            (cont[i] / truth[i] - 1.0).abs() < 0.02,
            "continuum off by {} at {}",
            cont[i] / truth[i] - 1.0,
            wave[i]
        );
    }
    // Line cores stay in absorption after normalization.
    let core = wave.iter().position(|&w| (w - 5150.0).abs() < 1e-6).unwrap();
    assert!(norm[core] < 0.6);
}

#[test]
fn test_spline_flat_continuum_is_exact() {
    let wave = wave();
    let flux = common::absorption_lines(&wave, &LINES, 0.5, 0.5).mapv(|f| 2.0 * f);
    let (norm, cont) = normalize(wave.view(), flux.view(), &NormConfig::default()).unwrap();
    for i in far_from_lines(&wave) {
        assert_abs_diff_eq!(cont[i], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(norm[i], flux[i] / 2.0, epsilon = 1e-6);
    }
}

#[test]
fn test_non_finite_pixels_are_ignored() {
    let wave = wave();
    let mut flux = Array1::from_elem(wave.len(), 3.0);
    flux[100] = f64::NAN;
    flux[200] = f64::INFINITY;
    let (_, cont) =
        normalize(wave.view(), flux.view(), &config(NormMethod::Poly { degree: 1 })).unwrap();
    assert_abs_diff_eq!(cont[100], 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(cont[1500], 3.0, epsilon = 1e-9);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn test_rejects_non_positive_knot_spacing() {
    let wave = wave();
    let flux = continuum(&wave);
    let cfg = config(NormMethod::Spline { knot_spacing: 0.0 });
    assert!(normalize(wave.view(), flux.view(), &cfg).is_err());
}

#[test]
fn test_rejects_too_few_points_for_degree() {
    let wave = common::linspace(0.0, 1.0, 3);
    let flux = Array1::ones(3);
    let cfg = config(NormMethod::Poly { degree: 5 });
    assert!(normalize(wave.view(), flux.view(), &cfg).is_err());
}

#[test]
fn test_norm_method_display() {
    assert_eq!(format!("{}", NormMethod::None), "None");
    assert_eq!(
        format!("{}", NormMethod::Poly { degree: 3 }),
        "Polynomial (degree 3)"
    );
}
