use ndarray::{Array1, ArrayView1};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Discrete 1-D convolution, "same" mode with implicit zero padding.
///
/// The output always has `len(signal)` samples: sample `i` is the
/// full-convolution sample `i + (k - 1) / 2`, where `k` is the kernel
/// length. Pixels near either end see fewer effective samples; there is no
/// edge correction. A kernel longer than the signal is allowed.
pub fn convolve_same(signal: ArrayView1<f64>, kernel: ArrayView1<f64>) -> Array1<f64> {
    let n = signal.len();
    let k = kernel.len();
    if k == 0 || n == 0 {
        return Array1::zeros(n);
    }
    let offset = (k - 1) / 2;

    let sample = |i: usize| -> f64 {
        let full_index = i + offset;
        // m ranges over kernel taps with 0 <= full_index - m < n.
        let m_lo = (full_index + 1).saturating_sub(n);
        let m_hi = full_index.min(k - 1);
        let mut sum = 0.0f64;
        for m in m_lo..=m_hi {
            sum += signal[full_index - m] * kernel[m];
        }
        sum
    };

    if n >= PARALLEL_PIXEL_THRESHOLD {
        let values: Vec<f64> = (0..n).into_par_iter().map(sample).collect();
        Array1::from(values)
    } else {
        Array1::from_shape_fn(n, sample)
    }
}
