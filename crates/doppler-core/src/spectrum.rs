use ndarray::{s, Array1, ArrayView1};

use crate::consts::SPEED_OF_LIGHT_KMS;
use crate::error::{check_len, DopplerError, Result};
use crate::interp::interp;

/// A sampled 1-D spectrum.
///
/// All arrays share one length. `wave` must be increasing; filtering and
/// interpolation assume it but it is not checked here.
#[derive(Clone, Debug)]
pub struct Spectrum {
    /// Wavelength, increasing.
    pub wave: Array1<f64>,
    /// Flux samples.
    pub flux: Array1<f64>,
    /// Inverse variance (>= 0 or non-finite for unknown uncertainty).
    pub ivar: Option<Array1<f64>>,
    /// `true` marks a known-bad pixel.
    pub mask: Option<Array1<bool>>,
}

impl Spectrum {
    pub fn new(wave: Array1<f64>, flux: Array1<f64>) -> Result<Self> {
        if wave.is_empty() {
            return Err(DopplerError::EmptySpectrum);
        }
        check_len("flux", wave.len(), flux.len())?;
        Ok(Self {
            wave,
            flux,
            ivar: None,
            mask: None,
        })
    }

    pub fn with_ivar(mut self, ivar: Array1<f64>) -> Result<Self> {
        check_len("ivar", self.len(), ivar.len())?;
        self.ivar = Some(ivar);
        Ok(self)
    }

    pub fn with_mask(mut self, mask: Array1<bool>) -> Result<Self> {
        check_len("mask", self.len(), mask.len())?;
        self.mask = Some(mask);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.wave.len()
    }

    /// Always `false`; empty spectra are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.wave.is_empty()
    }

    /// Wavelength range `(first, last)`.
    pub fn wave_range(&self) -> (f64, f64) {
        (self.wave[0], self.wave[self.len() - 1])
    }

    /// Flux uncertainty `1 / sqrt(ivar)`. Zero ivar gives infinite error,
    /// non-finite ivar stays non-finite.
    pub fn flux_err(&self) -> Option<Array1<f64>> {
        self.ivar.as_ref().map(|ivar| ivar.mapv(|v| v.powf(-0.5)))
    }

    /// Mask, or all-good when none was supplied.
    pub fn mask_or_default(&self) -> Array1<bool> {
        self.mask
            .clone()
            .unwrap_or_else(|| Array1::from_elem(self.len(), false))
    }

    /// Number of pixels flagged in the input mask.
    pub fn masked_count(&self) -> usize {
        self.mask
            .as_ref()
            .map_or(0, |m| m.iter().filter(|&&bad| bad).count())
    }

    /// Rest-frame wavelength for a source receding at `rv` km/s.
    pub fn wave_rv(&self, rv: f64) -> Array1<f64> {
        rest_frame(self.wave.view(), rv)
    }

    /// Flux resampled onto `new_wave` after rest-frame correction by `rv`.
    pub fn interp(&self, new_wave: ArrayView1<f64>, rv: f64) -> Result<Array1<f64>> {
        let rest = self.wave_rv(rv);
        interp(new_wave, rest.view(), self.flux.view())
    }

    /// Pixels `start..end` as a new spectrum.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start >= end || end > self.len() {
            return Err(DopplerError::InvalidParameter(format!(
                "slice {start}..{end} outside spectrum of {} pixels",
                self.len()
            )));
        }
        let range = s![start..end];
        Ok(Self {
            wave: self.wave.slice(range).to_owned(),
            flux: self.flux.slice(range).to_owned(),
            ivar: self.ivar.as_ref().map(|a| a.slice(range).to_owned()),
            mask: self.mask.as_ref().map(|a| a.slice(range).to_owned()),
        })
    }
}

/// `wave / (1 + rv / c)`.
pub fn rest_frame(wave: ArrayView1<f64>, rv: f64) -> Array1<f64> {
    let factor = 1.0 + rv / SPEED_OF_LIGHT_KMS;
    wave.mapv(|w| w / factor)
}

/// `wave * (1 + rv / c)`: where a rest-frame feature lands when the source
/// moves at `rv` km/s.
pub fn doppler_shift(wave: ArrayView1<f64>, rv: f64) -> Array1<f64> {
    let factor = 1.0 + rv / SPEED_OF_LIGHT_KMS;
    wave.mapv(|w| w * factor)
}
