//! Plain-text exchange of spectra, template libraries and results.
//!
//! Spectra are CSV files with a `wave,flux[,ivar][,mask]` header. Template
//! libraries share one wavelength column: `wave,<label>,<label>,...`.
//! Lines starting with `#` are comments.

use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{check_len, DopplerError, Result};
use crate::spectrum::Spectrum;

#[derive(Debug, Deserialize)]
struct SpectrumRow {
    wave: f64,
    flux: f64,
    #[serde(default)]
    ivar: Option<f64>,
    #[serde(default)]
    mask: Option<u8>,
}

fn reader_for(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    Ok(csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)?)
}

/// Read a spectrum CSV. `ivar` and `mask` columns are optional; a non-zero
/// mask marks a bad pixel.
pub fn read_spectrum(path: &Path) -> Result<Spectrum> {
    let mut reader = reader_for(path)?;
    let rows: Vec<SpectrumRow> = reader.deserialize().collect::<std::result::Result<_, _>>()?;
    if rows.is_empty() {
        return Err(DopplerError::EmptySpectrum);
    }

    let wave: Array1<f64> = rows.iter().map(|r| r.wave).collect();
    let flux: Array1<f64> = rows.iter().map(|r| r.flux).collect();
    let mut spec = Spectrum::new(wave, flux)?;

    if rows.iter().any(|r| r.ivar.is_some()) {
        // Missing ivar entries mean unknown uncertainty.
        let ivar = rows.iter().map(|r| r.ivar.unwrap_or(f64::NAN)).collect();
        spec = spec.with_ivar(ivar)?;
    }
    if rows.iter().any(|r| r.mask.is_some()) {
        let mask = rows.iter().map(|r| r.mask.unwrap_or(0) != 0).collect();
        spec = spec.with_mask(mask)?;
    }
    Ok(spec)
}

/// A template library as read from disk.
#[derive(Clone, Debug)]
pub struct TemplateSet {
    pub labels: Vec<String>,
    pub wave: Array1<f64>,
    /// One template per row.
    pub flux: Array2<f64>,
}

/// Read a template CSV: first column wavelength, every further column one
/// template named by its header.
pub fn read_templates(path: &Path) -> Result<TemplateSet> {
    let mut reader = reader_for(path)?;
    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(DopplerError::InvalidFile(format!(
            "{}: expected a wavelength column and at least one template",
            path.display()
        )));
    }
    let labels: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut wave = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        check_len("template row", headers.len(), record.len())?;
        let mut values = record.iter().map(|field| {
            field.parse::<f64>().map_err(|e| {
                DopplerError::InvalidFile(format!(
                    "{} row {}: {field:?}: {e}",
                    path.display(),
                    line + 1
                ))
            })
        });
        if let Some(w) = values.next() {
            wave.push(w?);
        }
        for (column, value) in columns.iter_mut().zip(values) {
            column.push(value?);
        }
    }
    if wave.is_empty() {
        return Err(DopplerError::EmptySpectrum);
    }

    let npix = wave.len();
    let flux = Array2::from_shape_fn((labels.len(), npix), |(j, i)| columns[j][i]);
    Ok(TemplateSet {
        labels,
        wave: Array1::from(wave),
        flux,
    })
}

#[derive(Serialize)]
struct CleanedRow {
    wave: f64,
    flux: f64,
    flagged: u8,
}

/// Write a cleaned spectrum as `wave,flux,flagged`.
pub fn write_spectrum(
    path: &Path,
    wave: ArrayView1<f64>,
    flux: ArrayView1<f64>,
    flagged: ArrayView1<bool>,
) -> Result<()> {
    check_len("flux", wave.len(), flux.len())?;
    check_len("flagged", wave.len(), flagged.len())?;
    let mut writer = csv::Writer::from_path(path)?;
    for ((&w, &f), &bad) in wave.iter().zip(flux.iter()).zip(flagged.iter()) {
        writer.serialize(CleanedRow {
            wave: w,
            flux: f,
            flagged: u8::from(bad),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// One line of an RV results table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RvRecord {
    pub file: String,
    pub rv_opt: f64,
    pub rv_best: f64,
    pub ccf_max: f64,
    pub success: bool,
    pub imod: usize,
    pub template: String,
    pub cosmic_rays: usize,
}

pub fn write_rv_results(path: &Path, records: &[RvRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
