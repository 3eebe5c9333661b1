/// Speed of light in km/s (velocities throughout the crate are km/s).
pub const SPEED_OF_LIGHT_KMS: f64 = 299_792.458;

/// Minimum signal length to use Rayon parallelism in filters.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum template x velocity cell count to scan the coarse grid in parallel.
pub const PARALLEL_GRID_THRESHOLD: usize = 4_096;

/// Largest velocity grid `RvGrid::to_vec` will expand.
pub const MAX_RV_GRID_POINTS: usize = 1_000_000;

/// Length of the fixed Gaussian kernel that smooths the median trend in debad.
pub const TREND_KERNEL_LEN: usize = 5;

/// Standard deviation (pixels) of the fixed trend kernel.
pub const TREND_KERNEL_STD: f64 = 0.5;

/// Cumulative flagged fraction above which debad gives up.
pub const MAX_BAD_FRACTION: f64 = 0.5;

/// Absolute flux change above which a pixel counts as repaired by debad
/// when the reduction pipeline builds its cosmic-ray mask.
pub const COSMIC_RAY_TOLERANCE: f64 = 1e-5;

/// Default median filter width (pixels) for debad.
pub const DEFAULT_MEDIAN_WIDTH: usize = 21;

/// Default noise-estimation Gaussian kernel length (pixels).
pub const DEFAULT_NOISE_KERNEL_LEN: usize = 51;

/// Default noise-estimation Gaussian kernel standard deviation (pixels).
pub const DEFAULT_NOISE_KERNEL_STD: f64 = 9.0;

/// Default boxcar width used to dilate flagged pixels.
pub const DEFAULT_DILATION_WIDTH: usize = 7;

/// Default lower/upper flux bounds (continuum units) trusted by the RV engine.
pub const DEFAULT_FLUX_BOUNDS: (f64, f64) = (0.0, 3.0);

/// Continuum fit passes used by the reduction pipeline's default normalization.
pub const REDUCE_NORM_NITER: usize = 2;

/// Default number of pixels trimmed from each end during reduction.
pub const DEFAULT_NPIX_CUSHION: usize = 50;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-12;
