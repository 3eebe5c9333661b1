//! Radial-velocity measurement against a template library.
//!
//! A coarse scan over every (template, velocity) pair picks the basin of the
//! global correlation peak; a local derivative-free search then refines the
//! velocity against the winning template only.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::consts::{DEFAULT_FLUX_BOUNDS, PARALLEL_GRID_THRESHOLD};
use crate::error::{check_len, DopplerError, Result};
use crate::interp::fill_masked;
use crate::normalize::{normalize, NormConfig};
use crate::optimize::{Minimizer, Powell, PowellParams};
use crate::xcorr::{shifted_template, CrossCorrelator, PearsonCorrelator};

/// Settings fixed for the lifetime of an [`Rvm`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RvmConfig {
    /// Continuum normalization applied to every template at construction.
    pub norm: NormConfig,
    /// Observed flux outside this open interval is treated as unreliable and
    /// interpolated over before correlating (default: (0, 3), continuum units).
    pub flux_bounds: (f64, f64),
    /// Local refinement settings.
    pub powell: PowellParams,
}

impl Default for RvmConfig {
    fn default() -> Self {
        Self {
            norm: NormConfig::default(),
            flux_bounds: DEFAULT_FLUX_BOUNDS,
            powell: PowellParams::default(),
        }
    }
}

/// Result of one [`Rvm::measure`] call.
#[derive(Clone, Debug, Serialize)]
pub struct RvResult<L> {
    /// Refined velocity (km/s).
    pub rv_opt: f64,
    /// Best coarse-grid velocity (km/s).
    pub rv_best: f64,
    /// Correlation at the best grid cell.
    pub ccf_max: f64,
    /// Whether the local refinement converged. When `false`, `rv_best` is the
    /// safer estimate.
    pub success: bool,
    /// Index of the winning template.
    pub imod: usize,
    /// Payload of the winning template.
    pub label: L,
}

/// Full coarse-grid scan.
#[derive(Clone, Debug)]
pub struct CcfGrid {
    pub rv_grid: Vec<f64>,
    /// Shape (templates, velocities).
    pub scores: Array2<f64>,
    pub best_template: usize,
    pub best_rv_index: usize,
}

impl CcfGrid {
    pub fn best_rv(&self) -> f64 {
        self.rv_grid[self.best_rv_index]
    }

    pub fn best_score(&self) -> f64 {
        self.scores[[self.best_template, self.best_rv_index]]
    }
}

/// Radial-velocity engine over a fixed template library.
///
/// Templates are continuum-normalized once in [`Rvm::new`] and only read
/// afterwards, so one engine can serve concurrent `measure` calls.
#[derive(Clone, Debug)]
pub struct Rvm<L = String> {
    labels: Vec<L>,
    wave_mod: Array1<f64>,
    flux_mod_norm: Array2<f64>,
    config: RvmConfig,
}

impl<L: Clone + Send + Sync> Rvm<L> {
    /// Build the engine. `flux_mod` has one template per row on `wave_mod`.
    pub fn new(
        labels: Vec<L>,
        wave_mod: Array1<f64>,
        flux_mod: Array2<f64>,
        config: RvmConfig,
    ) -> Result<Self> {
        if flux_mod.nrows() == 0 {
            return Err(DopplerError::EmptyTemplateLibrary);
        }
        if wave_mod.is_empty() {
            return Err(DopplerError::EmptySpectrum);
        }
        check_len("labels", flux_mod.nrows(), labels.len())?;
        check_len("template flux", wave_mod.len(), flux_mod.ncols())?;
        let (lo, hi) = config.flux_bounds;
        if !(lo < hi) {
            return Err(DopplerError::InvalidParameter(format!(
                "flux bounds must satisfy lower < upper, got ({lo}, {hi})"
            )));
        }

        let rows: Vec<Array1<f64>> = flux_mod
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| normalize(wave_mod.view(), row, &config.norm).map(|(norm, _)| norm))
            .collect::<Result<_>>()?;

        let mut flux_mod_norm = Array2::<f64>::zeros(flux_mod.raw_dim());
        for (mut dst, src) in flux_mod_norm.axis_iter_mut(Axis(0)).zip(rows) {
            dst.assign(&src);
        }

        debug!(
            templates = labels.len(),
            pixels = wave_mod.len(),
            norm = %config.norm.method,
            "Template library normalized"
        );

        Ok(Self {
            labels,
            wave_mod,
            flux_mod_norm,
            config,
        })
    }

    pub fn n_templates(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    pub fn wave_mod(&self) -> ArrayView1<'_, f64> {
        self.wave_mod.view()
    }

    /// Normalized template fluxes, one row per template.
    pub fn flux_mod_norm(&self) -> &Array2<f64> {
        &self.flux_mod_norm
    }

    pub fn config(&self) -> &RvmConfig {
        &self.config
    }

    /// Measure the velocity of a continuum-normalized spectrum with the
    /// Pearson correlator and Powell refinement.
    pub fn measure(
        &self,
        wave_obs: ArrayView1<f64>,
        flux_obs: ArrayView1<f64>,
        rv_grid: &[f64],
    ) -> Result<RvResult<L>> {
        let powell = Powell::new(self.config.powell.clone());
        self.measure_with(wave_obs, flux_obs, rv_grid, &PearsonCorrelator, &powell)
    }

    /// [`Rvm::measure`] with caller-supplied correlator and minimizer.
    pub fn measure_with(
        &self,
        wave_obs: ArrayView1<f64>,
        flux_obs: ArrayView1<f64>,
        rv_grid: &[f64],
        correlator: &dyn CrossCorrelator,
        minimizer: &dyn Minimizer,
    ) -> Result<RvResult<L>> {
        let flux = self.clip_unreliable(wave_obs, flux_obs, rv_grid)?;
        let grid = self.scan(wave_obs, flux.view(), rv_grid, correlator)?;

        let imod = grid.best_template;
        let rv_best = grid.best_rv();
        let ccf_max = grid.best_score();
        let template = self.flux_mod_norm.row(imod);

        // Velocities that shift the template off the spectrum score +inf.
        let objective = |rv: f64| {
            shifted_template(wave_obs, self.wave_mod.view(), template, rv)
                .map(|shifted| -correlator.xcorr(flux.view(), shifted.view()))
                .unwrap_or(f64::INFINITY)
        };
        let minimum = minimizer.minimize(&objective, rv_best);

        if minimum.success {
            info!(
                imod,
                rv_best,
                rv_opt = minimum.x,
                ccf_max,
                evaluations = minimum.evaluations,
                "RV measured"
            );
        } else {
            warn!(
                imod,
                rv_best,
                rv_opt = minimum.x,
                iterations = minimum.iterations,
                "RV refinement did not converge"
            );
        }

        Ok(RvResult {
            rv_opt: minimum.x,
            rv_best,
            ccf_max,
            success: minimum.success,
            imod,
            label: self.labels[imod].clone(),
        })
    }

    /// Coarse scan only: correlation of every template at every grid velocity.
    pub fn ccf_grid(
        &self,
        wave_obs: ArrayView1<f64>,
        flux_obs: ArrayView1<f64>,
        rv_grid: &[f64],
        correlator: &dyn CrossCorrelator,
    ) -> Result<CcfGrid> {
        let flux = self.clip_unreliable(wave_obs, flux_obs, rv_grid)?;
        self.scan(wave_obs, flux.view(), rv_grid, correlator)
    }

    /// Validate inputs and interpolate over flux outside `flux_bounds`.
    fn clip_unreliable(
        &self,
        wave_obs: ArrayView1<f64>,
        flux_obs: ArrayView1<f64>,
        rv_grid: &[f64],
    ) -> Result<Array1<f64>> {
        if rv_grid.is_empty() {
            return Err(DopplerError::EmptyVelocityGrid);
        }
        if let Some(bad) = rv_grid.iter().find(|v| !v.is_finite()) {
            return Err(DopplerError::InvalidParameter(format!(
                "velocity grid contains a non-finite value {bad}"
            )));
        }
        if wave_obs.is_empty() {
            return Err(DopplerError::EmptySpectrum);
        }
        check_len("flux_obs", wave_obs.len(), flux_obs.len())?;

        let (lo, hi) = self.config.flux_bounds;
        let unreliable = flux_obs.mapv(|f| !(f > lo && f < hi));
        let count = unreliable.iter().filter(|&&bad| bad).count();
        if count == 0 {
            return Ok(flux_obs.to_owned());
        }
        debug!(count, lo, hi, "Interpolating over out-of-range flux");
        fill_masked(wave_obs, flux_obs, unreliable.view())
    }

    /// Score matrix and its arg-max; lowest template, then lowest velocity
    /// index wins ties.
    fn scan(
        &self,
        wave_obs: ArrayView1<f64>,
        flux_obs: ArrayView1<f64>,
        rv_grid: &[f64],
        correlator: &dyn CrossCorrelator,
    ) -> Result<CcfGrid> {
        let n_mod = self.n_templates();
        let score_row = |j: usize| {
            correlator.xcorr_rvgrid(
                wave_obs,
                flux_obs,
                self.wave_mod.view(),
                self.flux_mod_norm.row(j),
                rv_grid,
            )
        };

        let rows: Vec<Array1<f64>> = if n_mod * rv_grid.len() >= PARALLEL_GRID_THRESHOLD {
            (0..n_mod)
                .into_par_iter()
                .map(score_row)
                .collect::<Result<_>>()?
        } else {
            (0..n_mod).map(score_row).collect::<Result<_>>()?
        };

        let mut scores = Array2::<f64>::zeros((n_mod, rv_grid.len()));
        for (mut dst, src) in scores.axis_iter_mut(Axis(0)).zip(&rows) {
            dst.assign(src);
        }

        let mut best: Option<(usize, usize, f64)> = None;
        for ((j, k), &s) in scores.indexed_iter() {
            if s.is_nan() {
                continue;
            }
            if best.map_or(true, |(_, _, b)| s > b) {
                best = Some((j, k, s));
            }
        }
        let (best_template, best_rv_index, _) = best.ok_or_else(|| {
            DopplerError::DegenerateCorrelation("every grid correlation is NaN".into())
        })?;

        Ok(CcfGrid {
            rv_grid: rv_grid.to_vec(),
            scores,
            best_template,
            best_rv_index,
        })
    }
}
