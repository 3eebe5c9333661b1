use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_RV_GRID_POINTS;
use crate::error::{DopplerError, Result};
use crate::reduce::ReduceParams;
use crate::rvm::RvmConfig;

/// Inclusive, evenly spaced velocity grid in km/s.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RvGrid {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Default for RvGrid {
    fn default() -> Self {
        Self {
            start: -500.0,
            stop: 500.0,
            step: 10.0,
        }
    }
}

impl RvGrid {
    /// Expand to `start, start + step, ...` up to and including `stop`.
    pub fn to_vec(&self) -> Result<Vec<f64>> {
        if !(self.start.is_finite() && self.stop.is_finite() && self.step > 0.0) {
            return Err(DopplerError::InvalidParameter(format!(
                "velocity grid needs finite bounds and a positive step, got {self:?}"
            )));
        }
        if self.stop < self.start {
            return Err(DopplerError::EmptyVelocityGrid);
        }
        let steps = ((self.stop - self.start) / self.step + 1e-9).floor();
        // The span can overflow to +inf even with finite bounds.
        if !(steps.is_finite() && steps < MAX_RV_GRID_POINTS as f64) {
            return Err(DopplerError::InvalidParameter(format!(
                "velocity grid {self} exceeds {MAX_RV_GRID_POINTS} points"
            )));
        }
        let count = steps as usize + 1;
        Ok((0..count)
            .map(|i| self.start + i as f64 * self.step)
            .collect())
    }
}

impl std::fmt::Display for RvGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} .. {} km/s, step {}", self.start, self.stop, self.step)
    }
}

/// Everything `doppler run` needs, usually loaded from TOML.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeasureConfig {
    /// Spectrum CSV files to measure.
    pub inputs: Vec<PathBuf>,
    /// Template library CSV.
    pub templates: PathBuf,
    /// Results CSV.
    pub output: PathBuf,
    #[serde(default)]
    pub rv_grid: RvGrid,
    #[serde(default)]
    pub reduce: ReduceParams,
    #[serde(default)]
    pub rvm: RvmConfig,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            inputs: vec![PathBuf::from("spectrum.csv")],
            templates: PathBuf::from("templates.csv"),
            output: PathBuf::from("rv.csv"),
            rv_grid: RvGrid::default(),
            reduce: ReduceParams::default(),
            rvm: RvmConfig::default(),
        }
    }
}
