// =============================================================================
// Multiscale Entropy — regularity across coarse-grained time scales
// =============================================================================
//
// For each scale s = 1..=max_scale:
//   1. Split the series into floor(n / s) non-overlapping blocks of length s
//      (a trailing partial block is dropped).
//   2. Replace each block by its mean.
//   3. Apply the base regularity statistic with the same m and r.
//
// r is fixed once from the original series so that values at different
// scales are comparable. Scale 1 reproduces a direct call of the base
// algorithm exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::entropy::regularity::{
    approximate_entropy, default_tolerance, sample_entropy, MatchKernel,
    DEFAULT_TOLERANCE_FACTOR,
};
use crate::error::EntropyOutcome;
use crate::types::{EntropyResult, Metric};

/// Default number of scales.
pub const DEFAULT_MAX_SCALE: usize = 5;

/// Base statistic evaluated at each scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiscaleBase {
    #[default]
    Sample,
    Approximate,
}

impl std::fmt::Display for MultiscaleBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sample => write!(f, "SampEn"),
            Self::Approximate => write!(f, "ApEn"),
        }
    }
}

impl MultiscaleBase {
    /// Evaluate the base statistic directly.
    pub fn evaluate(self, data: &[f64], m: usize, r: f64, kernel: MatchKernel) -> EntropyOutcome {
        match self {
            Self::Sample => sample_entropy(data, m, Some(r), kernel),
            Self::Approximate => approximate_entropy(data, m, Some(r), kernel),
        }
    }
}

/// Entropy per scale, keys `1..=max_scale` in ascending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiscaleResult {
    pub base: MultiscaleBase,
    pub m: usize,
    /// Tolerance shared by every scale.
    #[serde(with = "crate::types::sentinel_float")]
    pub r: f64,
    pub values: BTreeMap<usize, EntropyResult>,
}

impl MultiscaleResult {
    /// Mean over the finite scale values (complexity index proxy).
    pub fn mean_defined(&self) -> f64 {
        let defined: Vec<f64> = self
            .values
            .values()
            .map(|result| result.value)
            .filter(|v| v.is_finite())
            .collect();
        crate::stats::mean(&defined)
    }
}

/// Block means of length `scale`; the trailing partial block is dropped.
pub fn coarse_grain(data: &[f64], scale: usize) -> Vec<f64> {
    if scale == 0 {
        return Vec::new();
    }
    data.chunks_exact(scale)
        .map(|block| block.iter().sum::<f64>() / scale as f64)
        .collect()
}

/// Multiscale entropy of `data`.
///
/// `r = None` uses `0.2 × σ` of the original series. Scales whose
/// coarse-grained series is too short carry the base algorithm's error.
pub fn multiscale_entropy(
    data: &[f64],
    max_scale: usize,
    base: MultiscaleBase,
    m: usize,
    r: Option<f64>,
    kernel: MatchKernel,
) -> MultiscaleResult {
    let r = r.unwrap_or_else(|| default_tolerance(data, DEFAULT_TOLERANCE_FACTOR));

    let values: BTreeMap<usize, EntropyResult> = (1..=max_scale)
        .map(|scale| {
            let grained = coarse_grain(data, scale);
            let result = EntropyResult::from_outcome(
                Metric::Multiscale { base, scale, m, r },
                base.evaluate(&grained, m, r, kernel),
            );
            trace!(
                scale,
                points = grained.len(),
                value = format!("{:.4}", result.value),
                "Multiscale entropy scale evaluated"
            );
            (scale, result)
        })
        .collect();

    MultiscaleResult { base, m, r, values }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntropyError;

    fn noise(len: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state as f64 / u64::MAX as f64) - 0.5
            })
            .collect()
    }

    #[test]
    fn test_coarse_grain_block_means() {
        let data = [1.0, 3.0, 5.0, 7.0, 9.0];
        assert_eq!(coarse_grain(&data, 2), vec![2.0, 6.0]);
        assert_eq!(coarse_grain(&data, 1), data.to_vec());
        assert!(coarse_grain(&data, 6).is_empty());
    }

    #[test]
    fn test_keys_ascending_and_complete() {
        let data = noise(200, 5);
        let result = multiscale_entropy(&data, 6, MultiscaleBase::Sample, 2, None, MatchKernel::Naive);
        let keys: Vec<usize> = result.values.keys().copied().collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_scale_one_equals_direct_call() {
        let data = noise(150, 9);
        for base in [MultiscaleBase::Sample, MultiscaleBase::Approximate] {
            let result = multiscale_entropy(&data, 3, base, 2, None, MatchKernel::Naive);
            let direct = base.evaluate(&data, 2, result.r, MatchKernel::Naive).unwrap();
            assert_eq!(result.values[&1].value, direct, "scale 1 mismatch for {}", base);
        }
    }

    #[test]
    fn test_scale_one_equals_public_sample_entropy_default_r() {
        let data = noise(120, 13);
        let result = multiscale_entropy(&data, 2, MultiscaleBase::Sample, 2, None, MatchKernel::Naive);
        let direct = sample_entropy(&data, 2, None, MatchKernel::Naive).unwrap();
        assert_eq!(result.values[&1].value, direct);
    }

    #[test]
    fn test_short_series_scales_are_sentinels() {
        let data = noise(10, 1);
        let result = multiscale_entropy(&data, 4, MultiscaleBase::Sample, 2, None, MatchKernel::Naive);
        assert_eq!(result.values.len(), 4);
        // 10 / 4 = 2 points: below m + 2.
        assert!(result.values[&4].value.is_nan());
        assert!(matches!(
            result.values[&4].undefined,
            Some(EntropyError::InsufficientData { required: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_single_element_all_scales_sentinel() {
        let result = multiscale_entropy(&[0.01], 3, MultiscaleBase::Sample, 2, None, MatchKernel::Naive);
        let keys: Vec<usize> = result.values.keys().copied().collect();
        assert_eq!(keys, vec![1, 2, 3]);
        assert!(result.values.values().all(|v| v.value.is_nan() && !v.is_defined()));
        assert!(result.mean_defined().is_nan());
    }

    #[test]
    fn test_unbounded_and_undefined_scales_stay_distinct_in_json() {
        // Squares never repeat within r = 1e-9: every long-enough scale has no
        // matches, while scale 6 leaves only 3 points.
        let data: Vec<f64> = (0..20).map(|i| (i * i) as f64).collect();
        let result =
            multiscale_entropy(&data, 6, MultiscaleBase::Sample, 2, Some(1e-9), MatchKernel::Naive);
        assert_eq!(result.values[&1].value, f64::INFINITY);
        assert!(result.values[&6].value.is_nan());

        let json = serde_json::to_string(&result).unwrap();
        let back: MultiscaleResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.values[&1].value, f64::INFINITY);
        assert_eq!(back.values[&1].undefined, Some(EntropyError::NoMatchingPatterns));
        assert!(back.values[&6].value.is_nan());
        assert!(matches!(
            back.values[&6].undefined,
            Some(EntropyError::InsufficientData { .. })
        ));
    }
}
