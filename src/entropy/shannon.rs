// =============================================================================
// Shannon Entropy — histogram-based outcome unpredictability
// =============================================================================
//
//   H = -Σ p_i * log2(p_i + ε)        over non-empty bins
//   H_norm = H / log2(bins)
//
// p_i are bin probabilities (count / n), so the normalized value stays inside
// [0, 1]. ε = 1e-10 guards log(0) and biases H very slightly downward.

use tracing::trace;

use crate::error::{EntropyError, EntropyOutcome};
use crate::stats::{require_len, Binning, SMOOTHING_EPSILON};

/// Default histogram resolution.
pub const DEFAULT_BINS: usize = 50;

/// Shannon entropy of `data` over `bins` equal-width buckets.
///
/// Non-finite values are dropped first. Requires at least `bins` remaining
/// points. A constant series has a single effective bin and entropy `0.0`.
pub fn shannon_entropy(data: &[f64], bins: usize, normalize: bool) -> EntropyOutcome {
    if bins == 0 || (normalize && bins < 2) {
        return Err(EntropyError::invalid(format!(
            "shannon entropy needs at least {} bins, got {}",
            if normalize { 2 } else { 1 },
            bins
        )));
    }

    let clean: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    require_len(&clean, bins.max(1))?;

    let binning = Binning::over(&clean, bins)
        .ok_or_else(|| EntropyError::degenerate("empty series after cleaning"))?;
    if binning.is_degenerate() {
        trace!(len = clean.len(), "Shannon: constant series, zero entropy");
        return Ok(0.0);
    }

    let n = clean.len() as f64;
    let entropy: f64 = binning
        .histogram(&clean)
        .into_iter()
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / n;
            -p * (p + SMOOTHING_EPSILON).log2()
        })
        .sum();

    let value = if normalize {
        entropy / (bins as f64).log2()
    } else {
        entropy
    };

    trace!(
        bins,
        normalize,
        entropy = format!("{:.4}", value),
        "Shannon entropy computed"
    );

    Ok(value)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_series_zero_entropy() {
        let data = vec![0.0; 100];
        assert_eq!(shannon_entropy(&data, 50, true).unwrap(), 0.0);
    }

    #[test]
    fn test_uniform_near_one() {
        let data: Vec<f64> = (0..1000).map(|i| i as f64 / 1000.0).collect();
        let h = shannon_entropy(&data, 10, true).unwrap();
        assert!(h > 0.99 && h <= 1.0, "uniform data should be near 1, got {:.6}", h);
    }

    #[test]
    fn test_two_point_mass_is_one_bit() {
        let data: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { -1.0 } else { 1.0 }).collect();
        let h = shannon_entropy(&data, 10, false).unwrap();
        assert!((h - 1.0).abs() < 1e-6, "got {:.8}", h);
    }

    #[test]
    fn test_short_input_is_insufficient() {
        let err = shannon_entropy(&[0.01, 0.02, 0.03], 50, true).unwrap_err();
        assert_eq!(err, EntropyError::insufficient(50, 3));
        assert!(err.sentinel().is_nan());
    }

    #[test]
    fn test_single_element_returns_sentinel() {
        assert!(shannon_entropy(&[0.5], 50, true).is_err());
    }

    #[test]
    fn test_nan_values_are_cleaned() {
        let mut data: Vec<f64> = (0..60).map(|i| (i as f64 * 0.3).sin()).collect();
        data.push(f64::NAN);
        let h = shannon_entropy(&data, 10, true).unwrap();
        assert!((0.0..=1.0).contains(&h));
    }

    #[test]
    fn test_zero_bins_invalid() {
        assert!(matches!(
            shannon_entropy(&[1.0, 2.0], 0, false),
            Err(EntropyError::InvalidParameter { .. })
        ));
    }
}
