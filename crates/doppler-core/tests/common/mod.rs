use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use doppler_core::consts::SPEED_OF_LIGHT_KMS;

/// `n` evenly spaced samples from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Array1<f64> {
    Array1::linspace(start, stop, n)
}

/// Reproducible uniform noise in `[-amplitude, amplitude)`.
pub fn uniform_noise(n: usize, amplitude: f64, seed: u64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array1::from_shape_fn(n, |_| rng.random_range(-amplitude..amplitude))
}

/// Unit continuum with Gaussian absorption lines of the given depth and
/// width (same units as `wave`).
pub fn absorption_lines(wave: &Array1<f64>, centers: &[f64], depth: f64, sigma: f64) -> Array1<f64> {
    wave.mapv(|w| {
        1.0 - centers
            .iter()
            .map(|&c| depth * (-0.5 * ((w - c) / sigma).powi(2)).exp())
            .sum::<f64>()
    })
}

/// Same lines as seen from a source moving at `rv` km/s.
pub fn shifted_lines(
    wave: &Array1<f64>,
    centers: &[f64],
    depth: f64,
    sigma: f64,
    rv: f64,
) -> Array1<f64> {
    let rest = wave.mapv(|w| w / (1.0 + rv / SPEED_OF_LIGHT_KMS));
    absorption_lines(&rest, centers, depth, sigma)
}

/// Line lists for a small, distinct template library.
pub fn template_line_lists() -> Vec<Vec<f64>> {
    vec![
        vec![5050.0, 5120.0, 5200.0],
        vec![5080.0, 5150.0, 5250.0],
        vec![5030.0, 5110.0, 5180.0, 5270.0],
    ]
}

/// One template per line list, one per row, on `wave`.
pub fn template_library(wave: &Array1<f64>, line_lists: &[Vec<f64>]) -> Array2<f64> {
    let mut flux = Array2::zeros((line_lists.len(), wave.len()));
    for (mut row, lines) in flux.rows_mut().into_iter().zip(line_lists) {
        row.assign(&absorption_lines(wave, lines, 0.5, 0.5));
    }
    flux
}

/// Inclusive velocity grid.
pub fn rv_grid(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let n = ((stop - start) / step).round() as usize + 1;
    (0..n).map(|i| start + i as f64 * step).collect()
}
