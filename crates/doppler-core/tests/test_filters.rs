use approx::assert_abs_diff_eq;
use ndarray::{array, Array1};

use doppler_core::filters::{boxcar, convolve_same, gaussian_window, median_filter};
use doppler_core::interp::{fill_masked, interp};

// ---------------------------------------------------------------------------
// median_filter
// ---------------------------------------------------------------------------

#[test]
fn test_median_filter_zero_pads_edges() {
    let signal = array![5.0, 1.0, 2.0, 3.0, 9.0];
    // Windows: [0,5,1] [5,1,2] [1,2,3] [2,3,9] [3,9,0]
    let out = median_filter(signal.view(), 3);
    assert_eq!(out.to_vec(), vec![1.0, 2.0, 2.0, 3.0, 3.0]);
}

#[test]
fn test_median_filter_removes_isolated_spike() {
    let mut signal = Array1::from_elem(50, 2.0);
    signal[25] = 100.0;
    let out = median_filter(signal.view(), 5);
    for i in 2..48 {
        assert_eq!(out[i], 2.0, "pixel {i}");
    }
}

#[test]
fn test_median_filter_width_one_is_identity() {
    let signal = array![3.0, -1.0, 4.0];
    assert_eq!(median_filter(signal.view(), 1), signal);
}

#[test]
fn test_median_filter_parallel_path_matches_constant() {
    // Above the parallel threshold.
    let signal = Array1::from_elem(70_000, 1.5);
    let out = median_filter(signal.view(), 21);
    assert_eq!(out.len(), signal.len());
    assert_eq!(out[35_000], 1.5);
    // Ten zeros and eleven samples in the first window.
    assert_eq!(out[0], 1.5);
    assert_eq!(out[69_999], 1.5);
}

// ---------------------------------------------------------------------------
// windows
// ---------------------------------------------------------------------------

#[test]
fn test_gaussian_window_unit_sum_and_symmetric() {
    let w = gaussian_window(51, 9.0);
    assert_eq!(w.len(), 51);
    assert_abs_diff_eq!(w.sum(), 1.0, epsilon = 1e-12);
    for i in 0..25 {
        assert_abs_diff_eq!(w[i], w[50 - i], epsilon = 1e-15);
    }
    assert!(w[25] > w[24]);
}

#[test]
fn test_trend_kernel_center_weight() {
    // Weights 1, exp(-2), exp(-8) around the center.
    let w = gaussian_window(5, 0.5);
    let total = 1.0 + 2.0 * (-2.0f64).exp() + 2.0 * (-8.0f64).exp();
    assert_abs_diff_eq!(w[2], 1.0 / total, epsilon = 1e-12);
}

#[test]
fn test_boxcar_is_ones() {
    assert_eq!(boxcar(4).to_vec(), vec![1.0; 4]);
}

// ---------------------------------------------------------------------------
// convolve_same
// ---------------------------------------------------------------------------

#[test]
fn test_convolve_same_odd_kernel_alignment() {
    let x = array![1.0, 2.0, 3.0, 4.0, 5.0];
    let lead = convolve_same(x.view(), array![1.0, 0.0, 0.0].view());
    assert_eq!(lead.to_vec(), vec![2.0, 3.0, 4.0, 5.0, 0.0]);
    let lag = convolve_same(x.view(), array![0.0, 0.0, 1.0].view());
    assert_eq!(lag.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_convolve_same_even_kernel_offset() {
    let x = array![1.0, 2.0, 3.0, 4.0, 5.0];
    let out = convolve_same(x.view(), array![0.0, 0.0, 0.0, 1.0].view());
    assert_eq!(out.to_vec(), vec![0.0, 0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn test_convolve_same_kernel_longer_than_signal() {
    let x = array![1.0, 1.0];
    let out = convolve_same(x.view(), Array1::ones(5).view());
    // Offset 2: both outputs cover the whole signal.
    assert_eq!(out.to_vec(), vec![2.0, 2.0]);
}

#[test]
fn test_convolve_same_loses_mass_at_edges() {
    let x = Array1::from_elem(20, 1.0);
    let out = convolve_same(x.view(), gaussian_window(5, 0.5).view());
    assert_abs_diff_eq!(out[10], 1.0, epsilon = 1e-12);
    assert!(out[0] < 0.9);
    assert!(out[19] < 0.9);
}

// ---------------------------------------------------------------------------
// interpolation
// ---------------------------------------------------------------------------

#[test]
fn test_interp_linear_and_clamped() {
    let xp = array![0.0, 1.0, 2.0];
    let fp = array![0.0, 10.0, 40.0];
    let x = array![-1.0, 0.5, 1.5, 3.0];
    let out = interp(x.view(), xp.view(), fp.view()).unwrap();
    assert_eq!(out.to_vec(), vec![0.0, 5.0, 25.0, 40.0]);
}

#[test]
fn test_interp_exact_nodes_keep_nan() {
    let xp = array![0.0, 1.0, 2.0];
    let fp = array![1.0, f64::NAN, 3.0];
    let out = interp(xp.view(), xp.view(), fp.view()).unwrap();
    assert_eq!(out[0], 1.0);
    assert!(out[1].is_nan());
    assert_eq!(out[2], 3.0);
}

#[test]
fn test_interp_rejects_length_mismatch() {
    let xp = array![0.0, 1.0];
    let fp = array![1.0];
    assert!(interp(xp.view(), xp.view(), fp.view()).is_err());
}

#[test]
fn test_fill_masked_keeps_unmasked_values() {
    let x = array![0.0, 1.0, 2.0, 3.0, 4.0];
    let y = array![1.0, 2.0, 100.0, 4.0, 5.0];
    let mask = array![false, false, true, false, false];
    let out = fill_masked(x.view(), y.view(), mask.view()).unwrap();
    assert_eq!(out.to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_fill_masked_all_masked_is_error() {
    let x = array![0.0, 1.0];
    let y = array![1.0, 2.0];
    let mask = array![true, true];
    assert!(fill_masked(x.view(), y.view(), mask.view()).is_err());
}
