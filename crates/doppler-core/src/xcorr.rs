use ndarray::{Array1, ArrayView1};

use crate::error::{check_len, DopplerError, Result};
use crate::interp::interp;
use crate::spectrum::doppler_shift;

/// Similarity statistic between an observed spectrum and a template.
///
/// Implementors provide `xcorr`; the velocity-grid scan is shared.
pub trait CrossCorrelator: Send + Sync {
    /// Correlation between two equal-length flux sequences. Higher is better.
    fn xcorr(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64;

    /// Correlation of `flux_obs` with the template shifted to each velocity.
    ///
    /// The template wavelength is shifted by `wave_mod * (1 + v / c)` and
    /// linearly interpolated onto `wave_obs` before calling [`Self::xcorr`].
    fn xcorr_rvgrid(
        &self,
        wave_obs: ArrayView1<f64>,
        flux_obs: ArrayView1<f64>,
        wave_mod: ArrayView1<f64>,
        flux_mod: ArrayView1<f64>,
        rv_grid: &[f64],
    ) -> Result<Array1<f64>> {
        check_len("flux_obs", wave_obs.len(), flux_obs.len())?;
        rv_grid
            .iter()
            .map(|&rv| {
                let shifted = shifted_template(wave_obs, wave_mod, flux_mod, rv)?;
                Ok(self.xcorr(flux_obs, shifted.view()))
            })
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from)
    }
}

/// Template flux at `wave_obs` after shifting the template to `rv` km/s.
///
/// Fails with [`DopplerError::NoOverlap`] when no observed pixel falls inside
/// the shifted template range.
pub fn shifted_template(
    wave_obs: ArrayView1<f64>,
    wave_mod: ArrayView1<f64>,
    flux_mod: ArrayView1<f64>,
    rv: f64,
) -> Result<Array1<f64>> {
    check_len("flux_mod", wave_mod.len(), flux_mod.len())?;
    if wave_obs.is_empty() || wave_mod.is_empty() {
        return Err(DopplerError::EmptySpectrum);
    }
    let shifted = doppler_shift(wave_mod, rv);
    let (lo, hi) = (shifted[0], shifted[shifted.len() - 1]);
    if !wave_obs.iter().any(|&w| w >= lo && w <= hi) {
        return Err(DopplerError::NoOverlap { rv });
    }
    interp(wave_obs, shifted.view(), flux_mod)
}

/// Pearson correlation coefficient: mean-subtracted, variance-normalized.
///
/// Lies in `[-1, 1]`; a constant input yields `NaN`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PearsonCorrelator;

impl CrossCorrelator for PearsonCorrelator {
    fn xcorr(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let n = a.len();
        if n == 0 || n != b.len() {
            return f64::NAN;
        }
        let mean_a = a.sum() / n as f64;
        let mean_b = b.sum() / n as f64;
        let mut ab = 0.0f64;
        let mut aa = 0.0f64;
        let mut bb = 0.0f64;
        for (&x, &y) in a.iter().zip(b.iter()) {
            let dx = x - mean_a;
            let dy = y - mean_b;
            ab += dx * dy;
            aa += dx * dx;
            bb += dy * dy;
        }
        let denom = (aa * bb).sqrt();
        if denom > 0.0 {
            ab / denom
        } else {
            f64::NAN
        }
    }
}
