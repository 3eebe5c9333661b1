//! Iterative bad-pixel and cosmic-ray rejection.
//!
//! Each round estimates a local trend (median filter followed by a small
//! fixed Gaussian), turns the absolute residuals into a smooth per-pixel
//! noise curve, and flags residuals beyond `upper` (positive) or `lower`
//! (negative) times that curve. New flags are grown by a boxcar and the
//! flux underneath is re-interpolated from the remaining pixels. The loop
//! stops when a round flags nothing or after `max_iterations` rounds.

use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{
    DEFAULT_DILATION_WIDTH, DEFAULT_MEDIAN_WIDTH, DEFAULT_NOISE_KERNEL_LEN,
    DEFAULT_NOISE_KERNEL_STD, MAX_BAD_FRACTION, TREND_KERNEL_LEN, TREND_KERNEL_STD,
};
use crate::error::{check_len, DopplerError, Result};
use crate::filters::{boxcar, convolve_same, gaussian_window, median_filter};
use crate::interp::fill_masked;

/// Clip thresholds in units of the local noise curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NSigma {
    /// Negative residuals below `-lower * noise` are flagged.
    pub lower: f64,
    /// Positive residuals above `upper * noise` are flagged.
    pub upper: f64,
}

impl Default for NSigma {
    fn default() -> Self {
        Self {
            lower: 8.0,
            upper: 4.0,
        }
    }
}

impl From<(f64, f64)> for NSigma {
    /// `(lo, hi)`: `lo` applies to dips, `hi` to spikes.
    fn from((lower, upper): (f64, f64)) -> Self {
        Self { lower, upper }
    }
}

/// Length and standard deviation (pixels) of a Gaussian smoothing kernel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianKernel {
    pub len: usize,
    pub std: f64,
}

impl Default for GaussianKernel {
    fn default() -> Self {
        Self {
            len: DEFAULT_NOISE_KERNEL_LEN,
            std: DEFAULT_NOISE_KERNEL_STD,
        }
    }
}

/// Parameters for [`debad`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebadParams {
    pub nsigma: NSigma,
    /// Median filter width in pixels (odd, default: 21).
    pub median_width: usize,
    /// Kernel that turns absolute residuals into a noise curve (default: 51 / 9).
    pub noise_kernel: GaussianKernel,
    /// Boxcar width used to grow flagged regions (default: 7).
    pub dilation_width: usize,
    /// Maximum number of rounds (default: 3).
    pub max_iterations: usize,
}

impl Default for DebadParams {
    fn default() -> Self {
        Self {
            nsigma: NSigma::default(),
            median_width: DEFAULT_MEDIAN_WIDTH,
            noise_kernel: GaussianKernel::default(),
            dilation_width: DEFAULT_DILATION_WIDTH,
            max_iterations: 3,
        }
    }
}

impl DebadParams {
    fn validate(&self, npix: usize) -> Result<()> {
        let invalid = |msg: String| Err(DopplerError::InvalidParameter(msg));
        if self.median_width == 0 || self.median_width % 2 == 0 {
            return invalid(format!(
                "median width must be odd, got {}",
                self.median_width
            ));
        }
        if npix < self.median_width {
            return invalid(format!(
                "spectrum has {npix} pixels, fewer than the median width {}",
                self.median_width
            ));
        }
        if !(self.nsigma.lower > 0.0 && self.nsigma.upper > 0.0) {
            return invalid(format!(
                "clip thresholds must be positive, got lower={} upper={}",
                self.nsigma.lower, self.nsigma.upper
            ));
        }
        if self.noise_kernel.len == 0 || !(self.noise_kernel.std > 0.0) {
            return invalid(format!(
                "noise kernel needs a positive length and std, got {:?}",
                self.noise_kernel
            ));
        }
        if self.dilation_width == 0 || self.dilation_width > npix {
            return invalid(format!(
                "dilation width must lie in 1..={npix}, got {}",
                self.dilation_width
            ));
        }
        if self.max_iterations == 0 {
            return invalid("max iterations must be at least 1".into());
        }
        Ok(())
    }
}

/// State after one rejection round.
#[derive(Clone, Debug)]
pub struct DebadRound {
    /// Pixels flagged for the first time or again in this round (before dilation).
    pub new_outliers: usize,
    /// Cumulative flag mask after this round.
    pub cumulative: Array1<bool>,
}

/// Full outcome of [`debad_report`].
#[derive(Clone, Debug)]
pub struct DebadReport {
    /// Cleaned flux.
    pub flux: Array1<f64>,
    /// Every pixel flagged in any round (undilated).
    pub mask: Array1<bool>,
    pub rounds: Vec<DebadRound>,
}

impl DebadReport {
    pub fn flagged(&self) -> usize {
        self.mask.iter().filter(|&&bad| bad).count()
    }
}

/// Remove cosmic rays and bad pixels from `flux`, returning the cleaned flux.
///
/// Fails with [`DopplerError::TooManyBadPixels`] when more than half of the
/// pixels end up flagged; no partial result is returned in that case.
pub fn debad(
    wave: ArrayView1<f64>,
    flux: ArrayView1<f64>,
    params: &DebadParams,
) -> Result<Array1<f64>> {
    debad_report(wave, flux, params).map(|report| report.flux)
}

/// Like [`debad`], also returning the flag mask and per-round snapshots.
pub fn debad_report(
    wave: ArrayView1<f64>,
    flux: ArrayView1<f64>,
    params: &DebadParams,
) -> Result<DebadReport> {
    let npix = flux.len();
    check_len("flux", wave.len(), npix)?;
    if npix == 0 {
        return Err(DopplerError::EmptySpectrum);
    }
    params.validate(npix)?;

    let trend_kernel = gaussian_window(TREND_KERNEL_LEN, TREND_KERNEL_STD);
    let noise_kernel = gaussian_window(params.noise_kernel.len, params.noise_kernel.std);
    let dilation = boxcar(params.dilation_width);

    let mut current = flux.to_owned();
    let mut cumulative = Array1::from_elem(npix, false);
    let mut rounds = Vec::new();

    loop {
        let outliers = flag_outliers(
            current.view(),
            params.median_width,
            trend_kernel.view(),
            noise_kernel.view(),
            params.nsigma,
        );
        let new_outliers = outliers.iter().filter(|&&bad| bad).count();

        Zip::from(&mut cumulative)
            .and(&outliers)
            .for_each(|acc, &bad| *acc |= bad);
        let flagged = cumulative.iter().filter(|&&bad| bad).count();

        debug!(
            round = rounds.len() + 1,
            new_outliers, flagged, npix, "debad round"
        );

        if flagged as f64 > MAX_BAD_FRACTION * npix as f64 {
            return Err(DopplerError::TooManyBadPixels {
                flagged,
                total: npix,
            });
        }

        rounds.push(DebadRound {
            new_outliers,
            cumulative: cumulative.clone(),
        });

        if new_outliers == 0 || rounds.len() >= params.max_iterations {
            return Ok(DebadReport {
                flux: current,
                mask: cumulative,
                rounds,
            });
        }

        let grown = dilate(outliers.view(), dilation.view());
        current = fill_masked(wave, current.view(), grown.view())?;
    }
}

/// One round of outlier detection on `flux`.
fn flag_outliers(
    flux: ArrayView1<f64>,
    median_width: usize,
    trend_kernel: ArrayView1<f64>,
    noise_kernel: ArrayView1<f64>,
    nsigma: NSigma,
) -> Array1<bool> {
    let median = median_filter(flux, median_width);
    let trend = convolve_same(median.view(), trend_kernel);
    let residual = &flux - &trend;
    let noise = convolve_same(residual.mapv(f64::abs).view(), noise_kernel);

    Zip::from(&residual)
        .and(&noise)
        .map_collect(|&r, &sigma| r > sigma * nsigma.upper || r < -sigma * nsigma.lower)
}

/// Grow flags by convolving with a boxcar and keeping any positive overlap.
fn dilate(flags: ArrayView1<bool>, boxcar: ArrayView1<f64>) -> Array1<bool> {
    let as_float = flags.mapv(|bad| if bad { 1.0 } else { 0.0 });
    convolve_same(as_float.view(), boxcar).mapv(|v| v > 0.0)
}
