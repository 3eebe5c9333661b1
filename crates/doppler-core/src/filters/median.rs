use ndarray::{Array1, ArrayView1};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Running median of odd `width`, zero padded beyond both ends.
///
/// Output has the same length as `signal`. Uses `select_nth_unstable` per
/// window, so each output sample costs O(width). Parallelizes for signals
/// >= `PARALLEL_PIXEL_THRESHOLD` samples.
pub fn median_filter(signal: ArrayView1<f64>, width: usize) -> Array1<f64> {
    let n = signal.len();
    if n == 0 || width <= 1 {
        return signal.to_owned();
    }
    let half = width / 2;

    if n >= PARALLEL_PIXEL_THRESHOLD {
        let values: Vec<f64> = (0..n)
            .into_par_iter()
            .map_init(
                || vec![0.0f64; width],
                |window, i| {
                    fill_window(&signal, i, half, window);
                    window_median(window)
                },
            )
            .collect();
        Array1::from(values)
    } else {
        let mut window = vec![0.0f64; width];
        let mut result = Array1::<f64>::zeros(n);
        for (i, out) in result.iter_mut().enumerate() {
            fill_window(&signal, i, half, &mut window);
            *out = window_median(&mut window);
        }
        result
    }
}

/// Copy the window centered on `center` into `window`, zeros outside the signal.
fn fill_window(signal: &ArrayView1<f64>, center: usize, half: usize, window: &mut [f64]) {
    let n = signal.len() as isize;
    for (k, slot) in window.iter_mut().enumerate() {
        let src = center as isize + k as isize - half as isize;
        *slot = if (0..n).contains(&src) {
            signal[src as usize]
        } else {
            0.0
        };
    }
}

/// Median of a window of odd or even length. Reorders `values`.
pub(crate) fn window_median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 1 {
        values[0]
    } else if n % 2 == 1 {
        let mid = n / 2;
        *values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1
    } else {
        let mid = n / 2;
        values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        values[..mid].select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b));
        (values[mid - 1] + values[mid]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_median_odd_even() {
        assert_eq!(window_median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(window_median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(window_median(&mut [7.0]), 7.0);
    }

    #[test]
    fn test_fill_window_zero_pads() {
        let signal = Array1::from(vec![1.0, 2.0, 3.0]);
        let mut window = vec![0.0; 5];
        fill_window(&signal.view(), 0, 2, &mut window);
        assert_eq!(window, vec![0.0, 0.0, 1.0, 2.0, 3.0]);
    }
}
