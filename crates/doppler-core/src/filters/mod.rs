//! 1-D filtering primitives shared by the bad-pixel rejector.

pub mod convolve;
pub mod median;
pub mod window;

pub use convolve::convolve_same;
pub use median::median_filter;
pub use window::{boxcar, gaussian_window};
