//! Flux-calibrated spectrum files and the summary numbers kept per spectrum.
//!
//! A spectrum file is whitespace-separated text, wavelength (Å) in the first
//! column and flux in the second. Lines starting with `#` are comments.

use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sndb_core::CoreError;

/// Smoothing width (Å) used to estimate the signal.
pub const SIGNAL_WIDTH: f64 = 100.0;
/// Smoothing width (Å) used to average the residual noise.
pub const NOISE_WIDTH: f64 = 500.0;

/// Wavelength coverage and signal-to-noise of one spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumMetrics {
    pub min_wavelength: f64,
    pub max_wavelength: f64,
    /// Absent when the spectrum is shorter than the smoothing windows or
    /// has no measurable noise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    wavelength: Vec<f64>,
    flux: Vec<f64>,
}

impl Spectrum {
    pub fn read(path: &Path) -> Result<Self, CoreError> {
        let context = path.display().to_string();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::data_integrity(&context, e.to_string()))?;
        Self::parse(&text, &context)
    }

    /// Parse spectrum text. `context` names the source in errors.
    ///
    /// # Errors
    ///
    /// [`CoreError::DataIntegrity`] if a row has fewer than two columns, a
    /// value is not a number, or there are no rows.
    pub fn parse(text: &str, context: &str) -> Result<Self, CoreError> {
        let mut wavelength = Vec::new();
        let mut flux = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut columns = line.split_whitespace().map(str::parse::<f64>);
            match (columns.next(), columns.next()) {
                (Some(Ok(w)), Some(Ok(f))) => {
                    wavelength.push(w);
                    flux.push(f);
                }
                _ => {
                    return Err(CoreError::data_integrity(
                        context,
                        format!("line {} is not a wavelength/flux pair", number + 1),
                    ));
                }
            }
        }
        if wavelength.is_empty() {
            return Err(CoreError::data_integrity(context, "spectrum has no data rows"));
        }
        Ok(Self { wavelength, flux })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    /// First and last wavelength, in file order.
    #[must_use]
    pub fn wavelength_range(&self) -> (f64, f64) {
        let first = self.wavelength.first().copied().unwrap_or(f64::NAN);
        let last = self.wavelength.last().copied().unwrap_or(f64::NAN);
        (first, last)
    }

    /// Mean ratio of the smoothed signal to the smoothed residual.
    ///
    /// Rows with NaN flux are ignored.
    #[must_use]
    pub fn snr(&self) -> Option<f64> {
        let (x, y): (Vec<f64>, Vec<f64>) = self
            .wavelength
            .iter()
            .zip(&self.flux)
            .filter(|(_, f)| !f.is_nan())
            .map(|(w, f)| (*w, *f))
            .unzip();
        let signal = smooth(&x, &y, SIGNAL_WIDTH)?;
        let residual: Vec<f64> = y.iter().zip(&signal).map(|(f, s)| (f - s).abs()).collect();
        let noise = smooth(&x, &residual, NOISE_WIDTH)?;
        let ratio = mean(signal.iter().zip(&noise).map(|(s, n)| s / n))?;
        ratio.is_finite().then_some(ratio)
    }

    #[must_use]
    pub fn metrics(&self) -> SpectrumMetrics {
        let (min_wavelength, max_wavelength) = self.wavelength_range();
        SpectrumMetrics {
            min_wavelength,
            max_wavelength,
            snr: self.snr(),
        }
    }
}

/// Hanning-window smoothing of `y` over a window `width` wide in `x` units.
///
/// The ends are padded with reflected copies so the output has the same
/// length as `y`. Windows under three samples return `y` unchanged; a
/// window longer than the input is `None`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn smooth(x: &[f64], y: &[f64], width: f64) -> Option<Vec<f64>> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let step = mean(x.windows(2).map(|w| w[1] - w[0]))?.abs();
    if step == 0.0 || !step.is_finite() {
        return None;
    }
    let window = (width / step).round() as usize;
    if y.len() < window {
        return None;
    }
    if window < 3 {
        return Some(y.to_vec());
    }

    let n = y.len();
    let padded: Vec<f64> = y[1..window]
        .iter()
        .rev()
        .chain(y)
        .chain(y[n + 1 - window..].iter().rev())
        .copied()
        .collect();
    let kernel = hanning(window);
    let total: f64 = kernel.iter().sum();
    let offset = window / 2;
    Some(
        (offset..offset + n)
            .map(|i| {
                kernel
                    .iter()
                    .zip(&padded[i..i + window])
                    .map(|(k, v)| k * v)
                    .sum::<f64>()
                    / total
            })
            .collect(),
    )
}

#[allow(clippy::cast_precision_loss)]
fn hanning(len: usize) -> Vec<f64> {
    let span = (len - 1) as f64;
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / span).cos())
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
