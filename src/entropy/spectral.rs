// =============================================================================
// Spectral Entropy — Shannon entropy of the normalized power spectrum
// =============================================================================
//
// A white-noise return series spreads its power evenly over all frequencies
// (entropy near 1); a cyclical series concentrates it in a few bins (entropy
// near 0).
//
// PSD estimation:
//   Periodogram : one FFT over the whole mean-detrended series.
//   Welch       : mean-detrended, Hann-windowed segments with 50 % overlap,
//                 periodograms averaged across segments.
//
// Both produce a one-sided spectrum of len/2 + 1 bins with interior bins
// doubled, which is then normalized into a probability distribution.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{EntropyError, EntropyOutcome};
use crate::stats::{mean, min_max, require_finite, require_len};

/// Smallest segment that still yields more than two frequency bins.
const MIN_SEGMENT_LEN: usize = 4;

/// Default Welch segment length.
pub const DEFAULT_SEGMENT_LEN: usize = 64;

/// Power spectral density estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpectralMethod {
    /// Raw discrete Fourier transform of the full series.
    Periodogram,
    /// Averaged Hann-windowed periodograms over overlapping segments.
    Welch { segment_len: usize },
}

impl Default for SpectralMethod {
    fn default() -> Self {
        Self::Welch {
            segment_len: DEFAULT_SEGMENT_LEN,
        }
    }
}

impl std::fmt::Display for SpectralMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Periodogram => write!(f, "periodogram"),
            Self::Welch { segment_len } => write!(f, "welch/{}", segment_len),
        }
    }
}

/// Spectral entropy of `data` in bits, optionally divided by `log2(bins)`.
///
/// Requires `n ≥ 4` for the periodogram and `n ≥ segment_len` for Welch.
/// A series with no variance has no spectral power and is degenerate.
pub fn spectral_entropy(data: &[f64], method: SpectralMethod, normalize: bool) -> EntropyOutcome {
    let (segment_len, step, hann) = match method {
        SpectralMethod::Periodogram => (data.len().max(MIN_SEGMENT_LEN), data.len().max(1), false),
        SpectralMethod::Welch { segment_len } => {
            if segment_len < MIN_SEGMENT_LEN {
                return Err(EntropyError::invalid(format!(
                    "welch segment length must be at least {}, got {}",
                    MIN_SEGMENT_LEN, segment_len
                )));
            }
            (segment_len, (segment_len / 2).max(1), true)
        }
    };
    require_len(data, segment_len)?;
    require_finite(data)?;

    // Detrending a flat series leaves rounding residue with nonzero power.
    if let Some((lo, hi)) = min_max(data) {
        if lo == hi {
            return Err(EntropyError::degenerate("constant series has no spectral power"));
        }
    }

    let psd = welch_psd(data, segment_len, step, hann);

    let total: f64 = psd.iter().sum();
    if !total.is_finite() || total <= f64::MIN_POSITIVE {
        return Err(EntropyError::degenerate("zero spectral power"));
    }

    let entropy: f64 = psd
        .iter()
        .map(|&p| p / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum();

    let value = if normalize {
        entropy / (psd.len() as f64).log2()
    } else {
        entropy
    };

    trace!(
        method = %method,
        bins = psd.len(),
        entropy = format!("{:.4}", value),
        "Spectral entropy computed"
    );

    Ok(value)
}

/// Averaged one-sided power spectrum over segments of `segment_len` taken
/// every `step` points.
fn welch_psd(data: &[f64], segment_len: usize, step: usize, hann: bool) -> Vec<f64> {
    let window: Vec<f64> = if hann {
        (0..segment_len)
            .map(|i| {
                0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / segment_len as f64).cos()
            })
            .collect()
    } else {
        vec![1.0; segment_len]
    };

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(segment_len);

    let bins = segment_len / 2 + 1;
    let mut accumulated = vec![0.0; bins];
    let mut segments = 0usize;

    let mut start = 0;
    while start + segment_len <= data.len() {
        let power = segment_power(&data[start..start + segment_len], &window, &fft);
        for (acc, p) in accumulated.iter_mut().zip(power) {
            *acc += p;
        }
        segments += 1;
        start += step;
    }

    if segments > 0 {
        for acc in &mut accumulated {
            *acc /= segments as f64;
        }
    }
    accumulated
}

/// One-sided periodogram of a single detrended, windowed segment.
fn segment_power(segment: &[f64], window: &[f64], fft: &Arc<dyn Fft<f64>>) -> Vec<f64> {
    let len = segment.len();
    let mu = mean(segment);
    let mut buffer: Vec<Complex<f64>> = segment
        .iter()
        .zip(window)
        .map(|(&x, &w)| Complex::new((x - mu) * w, 0.0))
        .collect();
    fft.process(&mut buffer);

    let bins = len / 2 + 1;
    (0..bins)
        .map(|k| {
            let p = buffer[k].norm_sqr();
            let is_nyquist = len % 2 == 0 && k == len / 2;
            if k == 0 || is_nyquist {
                p
            } else {
                2.0 * p
            }
        })
        .collect()
}
