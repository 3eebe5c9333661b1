//! Continuum normalization.
//!
//! A smooth continuum is fitted to the flux, pixels that sit too far below
//! or above it are dropped, and the fit is repeated `niter` times. The
//! default asymmetric clip (`lower` 1, `upper` 3) pushes absorption lines
//! out of the continuum estimate.

pub mod poly;
pub mod spline;

use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};

use crate::consts::EPSILON;
use crate::error::{check_len, DopplerError, Result};

/// Default spline knot spacing, in wavelength units.
pub const DEFAULT_KNOT_SPACING: f64 = 50.0;

/// Continuum model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NormMethod {
    /// Leave the flux as is; continuum of ones.
    None,
    /// Polynomial in scaled wavelength.
    Poly { degree: usize },
    /// Natural cubic spline through per-bin medians.
    Spline { knot_spacing: f64 },
}

impl Default for NormMethod {
    fn default() -> Self {
        Self::Spline {
            knot_spacing: DEFAULT_KNOT_SPACING,
        }
    }
}

impl std::fmt::Display for NormMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Poly { degree } => write!(f, "Polynomial (degree {degree})"),
            Self::Spline { knot_spacing } => write!(f, "Spline (knots every {knot_spacing})"),
        }
    }
}

/// Continuum normalization settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormConfig {
    pub method: NormMethod,
    /// Number of fit passes (default: 3).
    pub niter: usize,
    /// Keep pixels no more than `lower` sigma below the fit (default: 1.0).
    pub lower: f64,
    /// Keep pixels no more than `upper` sigma above the fit (default: 3.0).
    pub upper: f64,
}

impl Default for NormConfig {
    fn default() -> Self {
        Self {
            method: NormMethod::default(),
            niter: 3,
            lower: 1.0,
            upper: 3.0,
        }
    }
}

impl NormConfig {
    pub fn none() -> Self {
        Self {
            method: NormMethod::None,
            ..Self::default()
        }
    }
}

/// Normalize `flux` by a fitted continuum.
///
/// Returns `(flux / continuum, continuum)`, both the length of `flux`.
pub fn normalize(
    wave: ArrayView1<f64>,
    flux: ArrayView1<f64>,
    config: &NormConfig,
) -> Result<(Array1<f64>, Array1<f64>)> {
    check_len("flux", wave.len(), flux.len())?;
    if flux.is_empty() {
        return Err(DopplerError::EmptySpectrum);
    }

    let continuum = match &config.method {
        NormMethod::None => Array1::ones(flux.len()),
        NormMethod::Poly { degree } => {
            let degree = *degree;
            iterate_fit(flux, config, degree + 1, |keep| {
                poly::fit_polynomial(wave, flux, keep, degree)
            })?
        }
        NormMethod::Spline { knot_spacing } => {
            if !(*knot_spacing > 0.0) {
                return Err(DopplerError::InvalidParameter(format!(
                    "knot spacing must be positive, got {knot_spacing}"
                )));
            }
            let spacing = *knot_spacing;
            iterate_fit(flux, config, 2, |keep| {
                spline::fit_spline(wave, flux, keep, spacing)
            })?
        }
    };

    let flux_norm = &flux / &continuum;
    Ok((flux_norm, continuum))
}

/// Fit, clip, refit. `fit` receives the current keep mask.
fn iterate_fit<F>(
    flux: ArrayView1<f64>,
    config: &NormConfig,
    min_points: usize,
    fit: F,
) -> Result<Array1<f64>>
where
    F: Fn(&Array1<bool>) -> Result<Array1<f64>>,
{
    let mut keep = flux.mapv(f64::is_finite);
    let passes = config.niter.max(1);
    let mut continuum = Array1::zeros(flux.len());

    for pass in 0..passes {
        let kept = keep.iter().filter(|&&k| k).count();
        if kept < min_points {
            return Err(DopplerError::InvalidParameter(format!(
                "continuum fit needs {min_points} usable pixels, {kept} left"
            )));
        }
        continuum = fit(&keep)?;
        if pass + 1 == passes {
            break;
        }

        let residual = &flux - &continuum;
        let sigma = kept_std(&residual, &keep);
        if sigma <= EPSILON {
            break;
        }
        Zip::from(&mut keep)
            .and(&residual)
            .and(&flux)
            .for_each(|k, &r, &f| {
                *k = f.is_finite() && r >= -config.lower * sigma && r <= config.upper * sigma;
            });
    }

    Ok(continuum)
}

/// Standard deviation of `values` over kept entries.
fn kept_std(values: &Array1<f64>, keep: &Array1<bool>) -> f64 {
    let kept: Vec<f64> = values
        .iter()
        .zip(keep.iter())
        .filter(|(_, k)| **k)
        .map(|(&v, _)| v)
        .collect();
    if kept.is_empty() {
        return 0.0;
    }
    let n = kept.len() as f64;
    let mean = kept.iter().sum::<f64>() / n;
    (kept.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}
