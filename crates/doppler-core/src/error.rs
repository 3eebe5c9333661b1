use thiserror::Error;

#[derive(Error, Debug)]
pub enum DopplerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid spectrum file: {0}")]
    InvalidFile(String),

    #[error("Array length mismatch: {what} has {got} samples, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Empty spectrum")]
    EmptySpectrum,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Too many bad pixels: {flagged} of {total} flagged")]
    TooManyBadPixels { flagged: usize, total: usize },

    #[error("Empty velocity grid")]
    EmptyVelocityGrid,

    #[error("Empty template library")]
    EmptyTemplateLibrary,

    #[error("Template does not overlap the observed wavelength range at rv = {rv} km/s")]
    NoOverlap { rv: f64 },

    #[error("Degenerate cross-correlation: {0}")]
    DegenerateCorrelation(String),
}

pub type Result<T> = std::result::Result<T, DopplerError>;

/// Return `LengthMismatch` unless `got == expected`.
pub(crate) fn check_len(what: &'static str, expected: usize, got: usize) -> Result<()> {
    if got == expected {
        Ok(())
    } else {
        Err(DopplerError::LengthMismatch {
            what,
            expected,
            got,
        })
    }
}
