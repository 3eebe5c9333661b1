use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView1};

use crate::error::{DopplerError, Result};

/// Least-squares polynomial of `degree` through the kept pixels, evaluated
/// at every wavelength.
///
/// Wavelength is mapped onto `[-1, 1]` first to keep the Vandermonde matrix
/// well conditioned.
pub fn fit_polynomial(
    wave: ArrayView1<f64>,
    flux: ArrayView1<f64>,
    keep: &Array1<bool>,
    degree: usize,
) -> Result<Array1<f64>> {
    let n = wave.len();
    let (lo, hi) = (wave[0], wave[n - 1]);
    let half_span = if hi > lo { (hi - lo) / 2.0 } else { 1.0 };
    let mid = (hi + lo) / 2.0;
    let scale = |w: f64| (w - mid) / half_span;

    let rows: Vec<usize> = (0..n).filter(|&i| keep[i]).collect();
    let ncoef = degree + 1;
    let design = DMatrix::from_fn(rows.len(), ncoef, |r, c| scale(wave[rows[r]]).powi(c as i32));
    let target = DVector::from_iterator(rows.len(), rows.iter().map(|&i| flux[i]));

    let coefficients = design
        .svd(true, true)
        .solve(&target, 1e-12)
        .map_err(|e| DopplerError::InvalidParameter(format!("polynomial fit failed: {e}")))?;

    Ok(wave.mapv(|w| {
        let t = scale(w);
        // Horner
        coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * t + c)
    }))
}
