use ndarray::{Array1, ArrayView1};

use crate::error::{check_len, DopplerError, Result};

/// Piecewise-linear interpolation of `(xp, fp)` at `x_new`.
///
/// `xp` must be increasing. Points left of `xp[0]` take `fp[0]`, points right
/// of the last sample take the last value.
pub fn interp(
    x_new: ArrayView1<f64>,
    xp: ArrayView1<f64>,
    fp: ArrayView1<f64>,
) -> Result<Array1<f64>> {
    check_len("fp", xp.len(), fp.len())?;
    if xp.is_empty() {
        return Err(DopplerError::InvalidParameter(
            "interpolation needs at least one anchor".into(),
        ));
    }
    let xp_std = xp.as_standard_layout();
    let xs = xp_std.as_slice().unwrap_or(&[]);
    if xs.is_empty() {
        return Err(DopplerError::InvalidParameter(
            "interpolation anchors are not contiguous".into(),
        ));
    }
    Ok(x_new.mapv(|x| interp_one(x, xs, &fp)))
}

fn interp_one(x: f64, xp: &[f64], fp: &ArrayView1<f64>) -> f64 {
    let last = xp.len() - 1;
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }
    // First index with xp[j] > x; 1 <= j <= last here.
    let j = xp.partition_point(|&v| v <= x);
    let (x0, x1) = (xp[j - 1], xp[j]);
    let (f0, f1) = (fp[j - 1], fp[j]);
    if x == x0 {
        return f0;
    }
    let dx = x1 - x0;
    if dx <= 0.0 {
        return f1;
    }
    f0 + (f1 - f0) * (x - x0) / dx
}

/// Replace masked samples of `y` by linear interpolation in `x` over the
/// unmasked samples. Unmasked samples are returned unchanged.
///
/// Fails if every sample is masked.
pub fn fill_masked(
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    mask: ArrayView1<bool>,
) -> Result<Array1<f64>> {
    check_len("y", x.len(), y.len())?;
    check_len("mask", x.len(), mask.len())?;

    let (anchor_x, anchor_y): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .zip(mask.iter())
        .filter(|(_, bad)| !**bad)
        .map(|((&xv, &yv), _)| (xv, yv))
        .unzip();
    if anchor_x.is_empty() {
        return Err(DopplerError::InvalidParameter(
            "no unmasked samples to interpolate from".into(),
        ));
    }

    let anchor_y = Array1::from(anchor_y);
    let anchor_view = anchor_y.view();
    Ok(Array1::from_shape_fn(x.len(), |i| {
        if mask[i] {
            interp_one(x[i], &anchor_x, &anchor_view)
        } else {
            y[i]
        }
    }))
}
