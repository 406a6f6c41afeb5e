// =============================================================================
// Regularity Statistics — Approximate, Sample and Fuzzy Entropy
// =============================================================================
//
// All three embed the series into overlapping templates of length m and m+1
// and compare every template against every other one using the Chebyshev
// (max-abs) distance:
//
//   ApEn    = φ(m) - φ(m+1),   φ(k) = mean_i ln( #{j : d(i,j) <= r} / N_k )
//             self-matches included, N_m = N-m+1, N_{m+1} = N-m
//   SampEn  = -ln(A / B)       A, B = matching pairs at m+1 and m, i < j,
//             N-m templates for both lengths (Richman & Moorman)
//   FuzzyEn = ln φ(m) - ln φ(m+1),  φ(k) = mean_{i≠j} exp(-d(i,j)^p / r)
//
// Pair comparison is O(n² · m) and dominates the engine's runtime. Two
// kernels compute identical distances:
//
//   Naive          : the direct double loop; reference behaviour.
//   DistanceMatrix : all pairwise distances for length m computed up front
//                    (rows in parallel), then extended to m+1 with a single
//                    max per pair instead of re-scanning m+1 points.
//
// Both produce the same counts bit for bit: max/abs are exact operations.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{EntropyError, EntropyOutcome};
use crate::stats::{require_finite, require_len, std_dev, RECOMMENDED_MAX_LEN};

/// Default template length.
pub const DEFAULT_PATTERN_LENGTH: usize = 2;

/// Default tolerance as a multiple of the series' standard deviation.
pub const DEFAULT_TOLERANCE_FACTOR: f64 = 0.2;

/// Default fuzzy membership exponent.
pub const DEFAULT_FUZZY_POWER: f64 = 2.0;

/// How template distances are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKernel {
    /// Nested loop, recomputing each distance on demand.
    #[default]
    Naive,
    /// Precomputed pairwise distance matrices for lengths m and m+1.
    ///
    /// Holds two dense `n × n` matrices of `f64` (about 64 MB at
    /// `RECOMMENDED_MAX_LEN` points). Longer series fall back to `Naive`.
    DistanceMatrix,
}

/// `factor × σ` of the series: the conventional tolerance.
pub fn default_tolerance(data: &[f64], factor: f64) -> f64 {
    factor * std_dev(data)
}

// =============================================================================
// Distance evaluation
// =============================================================================

#[inline]
fn chebyshev(data: &[f64], i: usize, j: usize, len: usize) -> f64 {
    let mut max = 0.0_f64;
    for k in 0..len {
        let d = (data[i + k] - data[j + k]).abs();
        if d > max {
            max = d;
        }
    }
    max
}

/// Dense symmetric matrix of template distances, row-major.
struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Distances between all `data.len() - len + 1` templates of length `len`.
    fn build(data: &[f64], len: usize) -> Self {
        let size = data.len() + 1 - len;
        let mut values = vec![0.0; size * size];
        values
            .par_chunks_mut(size)
            .enumerate()
            .for_each(|(i, row)| {
                for (j, cell) in row.iter_mut().enumerate() {
                    *cell = chebyshev(data, i, j, len);
                }
            });
        Self { size, values }
    }

    /// Extend length-`len` distances to length `len + 1`.
    fn extend(&self, data: &[f64], len: usize) -> Self {
        let size = self.size - 1;
        let mut values = vec![0.0; size * size];
        values
            .par_chunks_mut(size)
            .enumerate()
            .for_each(|(i, row)| {
                for (j, cell) in row.iter_mut().enumerate() {
                    let tail = (data[i + len] - data[j + len]).abs();
                    *cell = self.get(i, j).max(tail);
                }
            });
        Self { size, values }
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }
}

/// Distance lookup for templates of length `m` and `m + 1`.
struct PairDistances<'a> {
    data: &'a [f64],
    m: usize,
    matrices: Option<(DistanceMatrix, DistanceMatrix)>,
}

impl<'a> PairDistances<'a> {
    fn new(data: &'a [f64], m: usize, kernel: MatchKernel) -> Self {
        let matrices = match kernel {
            MatchKernel::Naive => None,
            MatchKernel::DistanceMatrix if data.len() > RECOMMENDED_MAX_LEN => {
                warn!(
                    len = data.len(),
                    recommended = RECOMMENDED_MAX_LEN,
                    "distance matrix too large; using the naive kernel"
                );
                None
            }
            MatchKernel::DistanceMatrix => {
                let dm = DistanceMatrix::build(data, m);
                let dm1 = dm.extend(data, m);
                Some((dm, dm1))
            }
        };
        Self { data, m, matrices }
    }

    #[inline]
    fn at(&self, i: usize, j: usize, len: usize) -> f64 {
        match &self.matrices {
            Some((dm, dm1)) => {
                if len == self.m {
                    dm.get(i, j)
                } else {
                    dm1.get(i, j)
                }
            }
            None => chebyshev(self.data, i, j, len),
        }
    }
}

/// Shared preconditions; returns the tolerance to use.
fn prepare(data: &[f64], m: usize, r: Option<f64>) -> Result<f64, EntropyError> {
    if m == 0 {
        return Err(EntropyError::invalid("pattern length m must be at least 1"));
    }
    require_len(data, m + 2)?;
    require_finite(data)?;
    let r = r.unwrap_or_else(|| default_tolerance(data, DEFAULT_TOLERANCE_FACTOR));
    if !r.is_finite() || r < 0.0 {
        return Err(EntropyError::invalid(format!(
            "tolerance r must be finite and non-negative, got {}",
            r
        )));
    }
    Ok(r)
}

// =============================================================================
// Approximate Entropy
// =============================================================================

/// Approximate Entropy (Pincus). Self-matches are counted, so every `C_i > 0`.
///
/// `r = None` uses `0.2 × σ`. Requires `n ≥ m + 2`.
pub fn approximate_entropy(
    data: &[f64],
    m: usize,
    r: Option<f64>,
    kernel: MatchKernel,
) -> EntropyOutcome {
    let r = prepare(data, m, r)?;
    let n = data.len();
    let distances = PairDistances::new(data, m, kernel);

    let phi = |len: usize, count: usize| -> f64 {
        let mut total = 0.0;
        for i in 0..count {
            let matches = (0..count)
                .filter(|&j| distances.at(i, j, len) <= r)
                .count();
            total += (matches as f64 / count as f64).ln();
        }
        total / count as f64
    };

    let apen = phi(m, n - m + 1) - phi(m + 1, n - m);

    trace!(
        m,
        r = format!("{:.6}", r),
        apen = format!("{:.4}", apen),
        "Approximate entropy computed"
    );

    Ok(apen)
}

// =============================================================================
// Sample Entropy
// =============================================================================

/// Sample Entropy (Richman & Moorman). Self-matches are excluded.
///
/// Returns `Err(NoMatchingPatterns)` (sentinel `+inf`) when no pair matches at
/// length `m + 1`. `r = None` uses `0.2 × σ`. Requires `n ≥ m + 2`.
pub fn sample_entropy(
    data: &[f64],
    m: usize,
    r: Option<f64>,
    kernel: MatchKernel,
) -> EntropyOutcome {
    let r = prepare(data, m, r)?;
    let count = data.len() - m;
    let distances = PairDistances::new(data, m, kernel);

    let mut b = 0usize;
    let mut a = 0usize;
    for i in 0..count {
        for j in (i + 1)..count {
            if distances.at(i, j, m) <= r {
                b += 1;
                if distances.at(i, j, m + 1) <= r {
                    a += 1;
                }
            }
        }
    }

    trace!(m, r = format!("{:.6}", r), a, b, "Sample entropy pair counts");

    if a == 0 {
        return Err(EntropyError::NoMatchingPatterns);
    }

    Ok(-(a as f64 / b as f64).ln())
}

// =============================================================================
// Fuzzy Entropy
// =============================================================================

/// Fuzzy Entropy: hard matching replaced by the membership `exp(-dᵖ / r)`.
///
/// Requires `n ≥ m + 2` and `r > 0`; a zero-spread series (default `r = 0`)
/// is a degenerate distribution.
pub fn fuzzy_entropy(
    data: &[f64],
    m: usize,
    r: Option<f64>,
    power: f64,
    kernel: MatchKernel,
) -> EntropyOutcome {
    let r = prepare(data, m, r)?;
    if !power.is_finite() || power <= 0.0 {
        return Err(EntropyError::invalid(format!(
            "fuzzy power must be positive, got {}",
            power
        )));
    }
    if r <= 0.0 {
        return Err(EntropyError::degenerate("fuzzy entropy needs r > 0"));
    }

    let count = data.len() - m;
    let distances = PairDistances::new(data, m, kernel);
    let pairs = (count * (count - 1)) as f64;

    let phi = |len: usize| -> f64 {
        let mut total = 0.0;
        for i in 0..count {
            for j in 0..count {
                if i != j {
                    total += (-distances.at(i, j, len).powf(power) / r).exp();
                }
            }
        }
        total / pairs
    };

    let phi_m = phi(m);
    let phi_m1 = phi(m + 1);
    if phi_m <= 0.0 || phi_m1 <= 0.0 {
        return Err(EntropyError::degenerate("fuzzy similarity underflowed to zero"));
    }

    let fuzzy = phi_m.ln() - phi_m1.ln();

    trace!(
        m,
        r = format!("{:.6}", r),
        power,
        fuzzy = format!("{:.4}", fuzzy),
        "Fuzzy entropy computed"
    );

    Ok(fuzzy)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic noise from a xorshift64 generator.
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

    fn sine(len: usize) -> Vec<f64> {
        (0..len).map(|i| (i as f64 * 0.3).sin()).collect()
    }

    #[test]
    fn test_constant_series_does_not_fail() {
        let data = vec![0.01; 40];
        let apen = approximate_entropy(&data, 2, Some(0.001), MatchKernel::Naive).unwrap();
        let sampen = sample_entropy(&data, 2, Some(0.001), MatchKernel::Naive).unwrap();
        assert!(apen.abs() < 1e-12);
        assert!(sampen.abs() < 1e-12);
        // Default r collapses to zero for a flat series; still defined.
        assert!(sample_entropy(&data, 2, None, MatchKernel::Naive).is_ok());
    }

    #[test]
    fn test_regular_signal_lower_than_noise() {
        let regular = sample_entropy(&sine(200), 2, None, MatchKernel::Naive).unwrap();
        let random = sample_entropy(&noise(200, 7), 2, None, MatchKernel::Naive).unwrap();
        assert!(
            regular < random,
            "sine SampEn {:.4} should be below noise SampEn {:.4}",
            regular,
            random
        );
    }

    #[test]
    fn test_no_matches_is_infinite() {
        // Strictly increasing with tiny tolerance: no template pair ever matches.
        let data: Vec<f64> = (0..20).map(|i| (i * i) as f64).collect();
        let err = sample_entropy(&data, 2, Some(1e-6), MatchKernel::Naive).unwrap_err();
        assert_eq!(err, EntropyError::NoMatchingPatterns);
        assert_eq!(err.sentinel(), f64::INFINITY);
    }

    #[test]
    fn test_short_input_sentinel() {
        let one = [0.1];
        assert!(matches!(
            approximate_entropy(&one, 2, None, MatchKernel::Naive),
            Err(EntropyError::InsufficientData { required: 4, actual: 1 })
        ));
        assert!(sample_entropy(&one, 2, None, MatchKernel::Naive).is_err());
        assert!(fuzzy_entropy(&one, 2, None, 2.0, MatchKernel::Naive).is_err());
    }

    #[test]
    fn test_distance_matrix_matches_naive() {
        let data = noise(150, 42);
        for m in 1..=3 {
            let naive = approximate_entropy(&data, m, None, MatchKernel::Naive).unwrap();
            let fast = approximate_entropy(&data, m, None, MatchKernel::DistanceMatrix).unwrap();
            assert_eq!(naive, fast, "ApEn kernels diverge at m={}", m);

            let naive = sample_entropy(&data, m, None, MatchKernel::Naive);
            let fast = sample_entropy(&data, m, None, MatchKernel::DistanceMatrix);
            assert_eq!(naive, fast, "SampEn kernels diverge at m={}", m);

            let naive = fuzzy_entropy(&data, m, None, 2.0, MatchKernel::Naive).unwrap();
            let fast = fuzzy_entropy(&data, m, None, 2.0, MatchKernel::DistanceMatrix).unwrap();
            assert!((naive - fast).abs() < 1e-12, "FuzzyEn kernels diverge at m={}", m);
        }
    }

    #[test]
    fn test_oversized_series_skips_distance_matrix() {
        let long = noise(RECOMMENDED_MAX_LEN + 1, 5);
        assert!(PairDistances::new(&long, 2, MatchKernel::DistanceMatrix)
            .matrices
            .is_none());

        let short = noise(50, 5);
        assert!(PairDistances::new(&short, 2, MatchKernel::DistanceMatrix)
            .matrices
            .is_some());
    }

    #[test]
    fn test_fuzzy_entropy_positive_for_noise() {
        let fe = fuzzy_entropy(&noise(120, 3), 2, None, 2.0, MatchKernel::Naive).unwrap();
        assert!(fe.is_finite() && fe > 0.0, "got {:.4}", fe);
    }

    #[test]
    fn test_fuzzy_entropy_flat_series_degenerate() {
        let err = fuzzy_entropy(&[0.0; 30], 2, None, 2.0, MatchKernel::Naive).unwrap_err();
        assert!(matches!(err, EntropyError::DegenerateDistribution { .. }));
    }

    #[test]
    fn test_negative_tolerance_invalid() {
        assert!(matches!(
            sample_entropy(&noise(30, 1), 2, Some(-0.1), MatchKernel::Naive),
            Err(EntropyError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_apen_noise_exceeds_sine() {
        let regular = approximate_entropy(&sine(200), 2, None, MatchKernel::Naive).unwrap();
        let random = approximate_entropy(&noise(200, 11), 2, None, MatchKernel::Naive).unwrap();
        assert!(regular < random);
    }
}
