// =============================================================================
// Transfer Entropy Estimator — plug-in estimate over equal-width bins
// =============================================================================
//
//   T(X→Y) = Σ p(y', y⁽ᵏ⁾, x⁽ˡ⁾) · log2[ p(y', y⁽ᵏ⁾, x⁽ˡ⁾) · p(y⁽ᵏ⁾)
//                                     / ( p(y', y⁽ᵏ⁾) · p(y⁽ᵏ⁾, x⁽ˡ⁾) ) ]
//
// y' is the next target value, y⁽ᵏ⁾ the last k target values and x⁽ˡ⁾ the last
// l source values. Both series are discretized into `bins` equal-width buckets
// over their own range; every probability carries ε = 1e-10.
//
// The plug-in estimate is non-negative; ε can push a true zero very slightly
// below it. Values down to -TE_NEGATIVE_TOLERANCE are that noise and are
// returned as-is.
//
// Count tables are ordered maps, so the sum is accumulated in the same order
// on every call and repeated runs agree bit for bit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{EntropyError, EntropyOutcome};
use crate::stats::{require_finite, require_len, tail_align, Binning, SMOOTHING_EPSILON};

/// Magnitude of negative estimates attributable to smoothing (bits). Holds
/// for series up to `RECOMMENDED_MAX_LEN`.
pub const TE_NEGATIVE_TOLERANCE: f64 = 1e-6;

/// Default history length for both target and source.
pub const DEFAULT_HISTORY: usize = 1;

/// Default discretization resolution.
pub const DEFAULT_TE_BINS: usize = 10;

/// Estimator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParams {
    /// Target history length.
    pub k: usize,
    /// Source history length.
    pub l: usize,
    /// Equal-width buckets per series.
    pub bins: usize,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self {
            k: DEFAULT_HISTORY,
            l: DEFAULT_HISTORY,
            bins: DEFAULT_TE_BINS,
        }
    }
}

type History = Vec<usize>;

/// Transfer entropy from `source` to `target`, in bits.
///
/// Unequal lengths are aligned on the most recent observations. Requires
/// `n ≥ k + l + 1` aligned points.
pub fn transfer_entropy(source: &[f64], target: &[f64], params: TransferParams) -> EntropyOutcome {
    let TransferParams { k, l, bins } = params;
    if k == 0 || l == 0 || bins == 0 {
        return Err(EntropyError::invalid(format!(
            "history lengths and bins must be at least 1 (k={}, l={}, bins={})",
            k, l, bins
        )));
    }

    let (x, y) = tail_align(source, target);
    require_len(x, k + l + 1)?;
    require_finite(x)?;
    require_finite(y)?;

    let xs = Binning::over(x, bins)
        .map(|b| b.discretize(x))
        .ok_or_else(|| EntropyError::insufficient(k + l + 1, 0))?;
    let ys = Binning::over(y, bins)
        .map(|b| b.discretize(y))
        .ok_or_else(|| EntropyError::insufficient(k + l + 1, 0))?;

    let lag = k.max(l);
    let n = ys.len();

    let mut joint: BTreeMap<(usize, History, History), usize> = BTreeMap::new();
    let mut target_past: BTreeMap<History, usize> = BTreeMap::new();
    let mut future_past: BTreeMap<(usize, History), usize> = BTreeMap::new();
    let mut past_pair: BTreeMap<(History, History), usize> = BTreeMap::new();

    for t in (lag - 1)..(n - 1) {
        let future = ys[t + 1];
        let y_hist: History = ys[t + 1 - k..=t].to_vec();
        let x_hist: History = xs[t + 1 - l..=t].to_vec();

        *target_past.entry(y_hist.clone()).or_insert(0) += 1;
        *future_past.entry((future, y_hist.clone())).or_insert(0) += 1;
        *past_pair.entry((y_hist.clone(), x_hist.clone())).or_insert(0) += 1;
        *joint.entry((future, y_hist, x_hist)).or_insert(0) += 1;
    }

    let samples = (n - lag) as f64;
    let prob = |count: usize| count as f64 / samples + SMOOTHING_EPSILON;

    let mut te = 0.0;
    for ((future, y_hist, x_hist), &count) in &joint {
        let p_joint = prob(count);
        let p_y = prob(target_past.get(y_hist).copied().unwrap_or(0));
        let p_fy = prob(
            future_past
                .get(&(*future, y_hist.clone()))
                .copied()
                .unwrap_or(0),
        );
        let p_yx = prob(
            past_pair
                .get(&(y_hist.clone(), x_hist.clone()))
                .copied()
                .unwrap_or(0),
        );
        te += p_joint * ((p_joint * p_y) / (p_fy * p_yx)).log2();
    }

    trace!(
        k,
        l,
        bins,
        samples = n - lag,
        te = format!("{:.6}", te),
        "Transfer entropy computed"
    );

    Ok(te)
}
