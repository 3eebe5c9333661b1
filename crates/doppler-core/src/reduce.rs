//! Spectrum reduction: trim, clean, shift to rest frame, resample, normalize.

use ndarray::{s, Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::{COSMIC_RAY_TOLERANCE, DEFAULT_NPIX_CUSHION, REDUCE_NORM_NITER};
use crate::debad::{debad, DebadParams, NSigma};
use crate::error::{DopplerError, Result};
use crate::interp::interp;
use crate::normalize::{normalize, NormConfig};
use crate::rvm::{RvResult, Rvm};
use crate::spectrum::{rest_frame, Spectrum};

/// Wavelength grid the reduced spectrum is resampled onto.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum WaveTarget {
    /// Keep the (rest-frame) observed grid.
    #[default]
    Observed,
    /// Keep rest-frame pixels strictly inside `(lo, hi)`.
    Limits { lo: f64, hi: f64 },
    /// Resample onto an explicit grid.
    Grid(Vec<f64>),
}

/// Settings for [`reduce`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReduceParams {
    /// Pixels dropped at each end; 0 keeps everything (default: 50).
    pub npix_cushion: usize,
    /// Run debad before trimming (default: true).
    pub remove_cosmic_rays: bool,
    /// Clip thresholds for cosmic-ray removal.
    pub nsigma: NSigma,
    /// Debad round cap for cosmic-ray removal (default: 5).
    pub max_iterations: usize,
    /// Velocity (km/s) removed when moving to the rest frame (default: 0).
    pub rv: f64,
    pub wave_target: WaveTarget,
    /// Continuum normalization, skipped when `None`.
    pub norm: Option<NormConfig>,
    /// Flux is raised to at least this value before normalizing (default: 0).
    pub flux_floor: f64,
}

impl Default for ReduceParams {
    fn default() -> Self {
        Self {
            npix_cushion: DEFAULT_NPIX_CUSHION,
            remove_cosmic_rays: true,
            nsigma: NSigma::default(),
            max_iterations: 5,
            rv: 0.0,
            wave_target: WaveTarget::Observed,
            norm: Some(reduction_norm()),
            flux_floor: 0.0,
        }
    }
}

/// Spline continuum with two fit passes.
fn reduction_norm() -> NormConfig {
    NormConfig {
        niter: REDUCE_NORM_NITER,
        ..NormConfig::default()
    }
}

impl ReduceParams {
    fn debad_params(&self) -> DebadParams {
        DebadParams {
            nsigma: self.nsigma,
            max_iterations: self.max_iterations,
            ..DebadParams::default()
        }
    }
}

/// Continuum-normalized view of a reduced spectrum.
#[derive(Clone, Debug)]
pub struct Normalized {
    pub flux_norm: Array1<f64>,
    pub continuum: Array1<f64>,
    pub flux_norm_err: Option<Array1<f64>>,
    pub ivar_norm: Option<Array1<f64>>,
}

/// Output of [`reduce`].
#[derive(Clone, Debug)]
pub struct ReducedSpectrum {
    /// Rest-frame wavelength of the output grid.
    pub wave: Array1<f64>,
    pub flux: Array1<f64>,
    pub flux_err: Option<Array1<f64>>,
    /// `flux_err^-2`; non-finite entries mean unknown uncertainty.
    pub ivar: Option<Array1<f64>>,
    /// Input mask combined with repaired pixels, on the output grid.
    pub mask: Array1<bool>,
    /// Pixels changed by cosmic-ray removal, on the trimmed observed grid.
    pub cosmic_mask: Array1<bool>,
    pub normalized: Option<Normalized>,
}

impl ReducedSpectrum {
    pub fn len(&self) -> usize {
        self.wave.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wave.is_empty()
    }

    pub fn cosmic_ray_count(&self) -> usize {
        self.cosmic_mask.iter().filter(|&&c| c).count()
    }
}

/// Reduce a raw spectrum.
///
/// Cosmic rays are removed on the full spectrum before trimming so the
/// zero-padded filter edges fall inside the discarded cushion.
pub fn reduce(spec: &Spectrum, params: &ReduceParams) -> Result<ReducedSpectrum> {
    let npix = spec.len();
    let cushion = params.npix_cushion;
    if cushion > 0 && npix <= 2 * cushion {
        return Err(DopplerError::InvalidParameter(format!(
            "cushion of {cushion} pixels leaves nothing of a {npix}-pixel spectrum"
        )));
    }
    let (start, end) = if cushion > 0 {
        (cushion, npix - cushion)
    } else {
        (0, npix)
    };
    let range = s![start..end];

    let wave_obs = spec.wave.slice(range).to_owned();
    let raw = spec.flux.slice(range);
    let (flux_obs, cosmic_mask) = if params.remove_cosmic_rays {
        let floored = spec.flux.mapv(|f| if f > 0.0 { f } else { 0.0 });
        let cleaned = debad(spec.wave.view(), floored.view(), &params.debad_params())?;
        let cleaned = cleaned.slice(range).to_owned();
        let changed = Zip::from(&cleaned)
            .and(&raw)
            .map_collect(|&c, &r| (c - r).abs() > COSMIC_RAY_TOLERANCE);
        (cleaned, changed)
    } else {
        let floored = raw.mapv(|f| if f > 0.0 { f } else { 0.0 });
        (floored, Array1::from_elem(end - start, false))
    };

    let wave_rest = rest_frame(wave_obs.view(), params.rv);
    let wave_new = match &params.wave_target {
        WaveTarget::Observed => wave_rest.clone(),
        WaveTarget::Limits { lo, hi } => wave_rest
            .iter()
            .copied()
            .filter(|w| w > lo && w < hi)
            .collect::<Array1<f64>>(),
        WaveTarget::Grid(grid) => Array1::from(grid.clone()),
    };
    if wave_new.is_empty() {
        return Err(DopplerError::EmptySpectrum);
    }

    let flux = interp(wave_new.view(), wave_rest.view(), flux_obs.view())?;
    let flux_err = match spec.flux_err() {
        Some(err) => Some(interp(
            wave_new.view(),
            wave_rest.view(),
            err.slice(range),
        )?),
        None => None,
    };
    let ivar = flux_err.as_ref().map(|err| err.mapv(|e| e.powi(-2)));

    let input_mask = spec.mask_or_default();
    let bad = Zip::from(input_mask.slice(range))
        .and(&cosmic_mask)
        .map_collect(|&m, &c| if m || c { 1.0 } else { 0.0 });
    let mask = interp(wave_new.view(), wave_rest.view(), bad.view())?.mapv(|v| v > 0.0);

    let normalized = match &params.norm {
        Some(config) => Some(normalize_reduced(
            wave_new.view(),
            flux.view(),
            flux_err.as_ref(),
            ivar.as_ref(),
            params.flux_floor,
            config,
        )?),
        None => None,
    };

    let reduced = ReducedSpectrum {
        wave: wave_new,
        flux,
        flux_err,
        ivar,
        mask,
        cosmic_mask,
        normalized,
    };
    info!(
        pixels = reduced.len(),
        cosmic_rays = reduced.cosmic_ray_count(),
        normalized = reduced.normalized.is_some(),
        "Spectrum reduced"
    );
    Ok(reduced)
}

fn normalize_reduced(
    wave: ArrayView1<f64>,
    flux: ArrayView1<f64>,
    flux_err: Option<&Array1<f64>>,
    ivar: Option<&Array1<f64>>,
    floor: f64,
    config: &NormConfig,
) -> Result<Normalized> {
    let floored = flux.mapv(|f| if f < floor { floor } else { f });
    let (flux_norm, continuum) = normalize(wave, floored.view(), config)?;
    let flux_norm_err = flux_err.map(|err| err / &continuum);
    let ivar_norm = ivar.map(|iv| iv * &continuum.mapv(|c| c * c));
    Ok(Normalized {
        flux_norm,
        continuum,
        flux_norm_err,
        ivar_norm,
    })
}

/// Reduce `spec` and measure its velocity on the normalized flux.
///
/// Normalization is forced on (spline, two passes) when `params.norm` is
/// `None`, since the engine works in continuum units.
pub fn measure_spectrum<L: Clone + Send + Sync>(
    spec: &Spectrum,
    rvm: &Rvm<L>,
    params: &ReduceParams,
    rv_grid: &[f64],
) -> Result<(ReducedSpectrum, RvResult<L>)> {
    let reduced = if params.norm.is_some() {
        reduce(spec, params)?
    } else {
        let forced = ReduceParams {
            norm: Some(reduction_norm()),
            ..params.clone()
        };
        reduce(spec, &forced)?
    };
    let flux_norm = reduced
        .normalized
        .as_ref()
        .map(|n| n.flux_norm.view())
        .ok_or_else(|| DopplerError::InvalidParameter("reduction produced no normalized flux".into()))?;
    let result = rvm.measure(reduced.wave.view(), flux_norm, rv_grid)?;
    Ok((reduced, result))
}
