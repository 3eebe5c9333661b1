use ndarray::{Array1, ArrayView1};

use crate::error::{DopplerError, Result};
use crate::filters::median::window_median;

/// Natural cubic spline through knots placed every `knot_spacing` wavelength
/// units, each knot at the mean wavelength and median flux of the kept
/// pixels in its bin.
pub fn fit_spline(
    wave: ArrayView1<f64>,
    flux: ArrayView1<f64>,
    keep: &Array1<bool>,
    knot_spacing: f64,
) -> Result<Array1<f64>> {
    let n = wave.len();
    let start = wave[0];
    let span = wave[n - 1] - start;
    let nbins = ((span / knot_spacing).ceil() as usize).max(1);

    let mut bins: Vec<(Vec<f64>, Vec<f64>)> = vec![(Vec::new(), Vec::new()); nbins];
    for i in (0..n).filter(|&i| keep[i]) {
        let bin = (((wave[i] - start) / knot_spacing) as usize).min(nbins - 1);
        bins[bin].0.push(wave[i]);
        bins[bin].1.push(flux[i]);
    }

    let mut knot_x = Vec::with_capacity(nbins);
    let mut knot_y = Vec::with_capacity(nbins);
    for (waves, mut fluxes) in bins.into_iter().filter(|(w, _)| !w.is_empty()) {
        knot_x.push(waves.iter().sum::<f64>() / waves.len() as f64);
        knot_y.push(window_median(&mut fluxes));
    }

    match knot_x.len() {
        0 => Err(DopplerError::InvalidParameter(
            "no usable pixels for the continuum spline".into(),
        )),
        1 => Ok(Array1::from_elem(n, knot_y[0])),
        _ => {
            let spline = NaturalSpline::new(knot_x, knot_y);
            Ok(wave.mapv(|w| spline.eval(w)))
        }
    }
}

/// Natural cubic spline (zero second derivative at both ends), extended
/// linearly beyond the outer knots.
pub struct NaturalSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the knots.
    m: Vec<f64>,
}

impl NaturalSpline {
    /// `x` must be strictly increasing with at least two knots.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        let n = x.len();
        let mut m = vec![0.0; n];
        if n > 2 {
            let h: Vec<f64> = x.windows(2).map(|p| p[1] - p[0]).collect();
            // Thomas algorithm on the interior equations.
            let inner = n - 2;
            let mut diag = vec![0.0; inner];
            let mut upper = vec![0.0; inner];
            let mut rhs = vec![0.0; inner];
            for k in 0..inner {
                let i = k + 1;
                diag[k] = 2.0 * (h[i - 1] + h[i]);
                upper[k] = h[i];
                rhs[k] = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
            }
            for k in 1..inner {
                let lower = h[k];
                let w = lower / diag[k - 1];
                diag[k] -= w * upper[k - 1];
                rhs[k] -= w * rhs[k - 1];
            }
            m[inner] = rhs[inner - 1] / diag[inner - 1];
            for k in (0..inner - 1).rev() {
                m[k + 1] = (rhs[k] - upper[k] * m[k + 2]) / diag[k];
            }
        }
        Self { x, y, m }
    }

    pub fn eval(&self, t: f64) -> f64 {
        let n = self.x.len();
        if t <= self.x[0] {
            let h = self.x[1] - self.x[0];
            let slope = (self.y[1] - self.y[0]) / h - h * (2.0 * self.m[0] + self.m[1]) / 6.0;
            return self.y[0] + slope * (t - self.x[0]);
        }
        if t >= self.x[n - 1] {
            let h = self.x[n - 1] - self.x[n - 2];
            let slope =
                (self.y[n - 1] - self.y[n - 2]) / h + h * (self.m[n - 2] + 2.0 * self.m[n - 1]) / 6.0;
            return self.y[n - 1] + slope * (t - self.x[n - 1]);
        }

        let j = self.x.partition_point(|&v| v <= t).clamp(1, n - 1);
        let (x0, x1) = (self.x[j - 1], self.x[j]);
        let h = x1 - x0;
        let a = (x1 - t) / h;
        let b = (t - x0) / h;
        a * self.y[j - 1]
            + b * self.y[j]
            + ((a * a * a - a) * self.m[j - 1] + (b * b * b - b) * self.m[j]) * h * h / 6.0
    }
}
