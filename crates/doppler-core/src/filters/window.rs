use ndarray::Array1;

/// Symmetric Gaussian window of `len` samples, normalized to unit sum.
///
/// Sample `n` has weight `exp(-0.5 * ((n - (len - 1) / 2) / std)^2)` before
/// normalization, so even lengths have no single center sample.
pub fn gaussian_window(len: usize, std: f64) -> Array1<f64> {
    let center = (len as f64 - 1.0) / 2.0;
    let s2 = 2.0 * std * std;
    let mut kernel = Array1::from_shape_fn(len, |n| {
        let x = n as f64 - center;
        (-x * x / s2).exp()
    });

    let sum = kernel.sum();
    if sum > 0.0 {
        kernel.mapv_inplace(|v| v / sum);
    }
    kernel
}

/// Boxcar of `len` ones (unnormalized).
pub fn boxcar(len: usize) -> Array1<f64> {
    Array1::ones(len)
}
