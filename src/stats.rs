// =============================================================================
// Shared numeric helpers
// =============================================================================
//
// Small, allocation-light building blocks reused by every calculator: moments,
// equal-width binning, precondition checks and series alignment.

use tracing::warn;

use crate::error::EntropyError;

/// Additive smoothing applied wherever a probability enters a logarithm.
pub const SMOOTHING_EPSILON: f64 = 1e-10;

/// Series length above which the O(n²) calculators become slow enough to
/// notice. Not enforced; a warning is emitted instead.
pub const RECOMMENDED_MAX_LEN: usize = 2_000;

/// Arithmetic mean. `NaN` for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation (σ, divisor n).
pub fn std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let mu = mean(data);
    let variance = data.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

/// `(min, max)` of a non-empty slice.
pub fn min_max(data: &[f64]) -> Option<(f64, f64)> {
    if data.is_empty() {
        return None;
    }
    let lo = data.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((lo, hi))
}

/// Equal-width bucket layout over a closed value range.
///
/// A zero-width range maps everything into bucket 0.
#[derive(Debug, Clone, Copy)]
pub struct Binning {
    min: f64,
    width: f64,
    bins: usize,
}

impl Binning {
    pub fn new(min: f64, max: f64, bins: usize) -> Self {
        let range = max - min;
        let width = if range > f64::EPSILON * min.abs().max(1.0) {
            range / bins as f64
        } else {
            0.0
        };
        Self { min, width, bins }
    }

    /// Binning spanning the data's own range.
    pub fn over(data: &[f64], bins: usize) -> Option<Self> {
        min_max(data).map(|(lo, hi)| Self::new(lo, hi, bins))
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0
    }

    /// Bucket index of `x`; the upper edge belongs to the last bucket.
    pub fn index(&self, x: f64) -> usize {
        if self.width == 0.0 || self.bins == 0 {
            return 0;
        }
        let idx = ((x - self.min) / self.width).floor();
        if idx <= 0.0 {
            0
        } else {
            (idx as usize).min(self.bins - 1)
        }
    }

    pub fn histogram(&self, data: &[f64]) -> Vec<usize> {
        let mut counts = vec![0usize; self.bins.max(1)];
        for &x in data {
            counts[self.index(x)] += 1;
        }
        counts
    }

    pub fn discretize(&self, data: &[f64]) -> Vec<usize> {
        data.iter().map(|&x| self.index(x)).collect()
    }
}

/// Shannon entropy in bits of a count table, skipping empty cells.
pub fn entropy_bits<I>(counts: I, total: usize) -> f64
where
    I: IntoIterator<Item = usize>,
{
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    counts
        .into_iter()
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

/// Fail with `InsufficientData` when `data` is shorter than `required`.
pub fn require_len(data: &[f64], required: usize) -> Result<(), EntropyError> {
    if data.len() < required {
        return Err(EntropyError::insufficient(required, data.len()));
    }
    if data.len() > RECOMMENDED_MAX_LEN {
        warn!(
            len = data.len(),
            recommended = RECOMMENDED_MAX_LEN,
            "series longer than the recommended bound; O(n^2) metrics will be slow"
        );
    }
    Ok(())
}

/// Reject NaN / ±inf values that slipped past the normalizer.
pub fn require_finite(data: &[f64]) -> Result<(), EntropyError> {
    if data.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(EntropyError::degenerate("series contains non-finite values"))
    }
}

/// Align two series on their most recent observations.
pub fn tail_align<'a>(a: &'a [f64], b: &'a [f64]) -> (&'a [f64], &'a [f64]) {
    let n = a.len().min(b.len());
    (&a[a.len() - n..], &b[b.len() - n..])
}
