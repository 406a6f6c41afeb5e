// =============================================================================
// Divergence & Conditional Entropy — comparing a series against a reference
// =============================================================================
//
// Cross entropy and KL divergence bin both series over a shared range
// [min(both), max(both)] with identical edges:
//
//   CE(P, Q) = -Σ p_i * ln(q_i + ε)                  (nats)
//   KL(P‖Q)  =  Σ p_i * ln(p_i / q_i)                (nats, p, q smoothed
//                                                     by ε and renormalized)
//
// Conditional entropy bins each series on its own range and uses the paired
// (tail-aligned) observations:
//
//   H(Y|X) = H(X, Y) - H(X)                          (bits)

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::{EntropyError, EntropyOutcome};
use crate::stats::{entropy_bits, min_max, require_finite, tail_align, Binning, SMOOTHING_EPSILON};

/// Default histogram resolution for distribution comparisons.
pub const DEFAULT_COMPARISON_BINS: usize = 50;

/// Fewest points either series may have; a single point spans no range.
const MIN_COMPARISON_LEN: usize = 2;

/// Histograms of `a` and `b` over their shared range, as probabilities.
fn shared_distributions(
    a: &[f64],
    b: &[f64],
    bins: usize,
) -> Result<(Vec<f64>, Vec<f64>), EntropyError> {
    if bins == 0 {
        return Err(EntropyError::invalid("comparison needs at least one bin"));
    }
    let shortest = a.len().min(b.len());
    if shortest < MIN_COMPARISON_LEN {
        return Err(EntropyError::insufficient(MIN_COMPARISON_LEN, shortest));
    }
    require_finite(a)?;
    require_finite(b)?;

    let (lo_a, hi_a) = min_max(a).ok_or_else(|| EntropyError::insufficient(1, 0))?;
    let (lo_b, hi_b) = min_max(b).ok_or_else(|| EntropyError::insufficient(1, 0))?;
    let binning = Binning::new(lo_a.min(lo_b), hi_a.max(hi_b), bins);

    let to_probabilities = |data: &[f64]| -> Vec<f64> {
        let n = data.len() as f64;
        binning
            .histogram(data)
            .into_iter()
            .map(|c| c as f64 / n)
            .collect()
    };

    Ok((to_probabilities(a), to_probabilities(b)))
}

/// Cross entropy of `observed` against `reference`, in nats. Each series
/// needs at least 2 points.
pub fn cross_entropy(observed: &[f64], reference: &[f64], bins: usize) -> EntropyOutcome {
    let (p, q) = shared_distributions(observed, reference, bins)?;
    let ce: f64 = p
        .iter()
        .zip(&q)
        .map(|(&pi, &qi)| -pi * (qi + SMOOTHING_EPSILON).ln())
        .sum();

    trace!(bins, cross_entropy = format!("{:.4}", ce), "Cross entropy computed");
    Ok(ce)
}

/// Kullback–Leibler divergence `KL(P‖Q)` in nats. Zero iff the binned
/// distributions coincide. Each series needs at least 2 points.
pub fn kl_divergence(p: &[f64], q: &[f64], bins: usize) -> EntropyOutcome {
    let (p, q) = shared_distributions(p, q, bins)?;

    let smooth = |dist: Vec<f64>| -> Vec<f64> {
        let total: f64 = dist.iter().map(|x| x + SMOOTHING_EPSILON).sum();
        dist.into_iter()
            .map(|x| (x + SMOOTHING_EPSILON) / total)
            .collect()
    };
    let p = smooth(p);
    let q = smooth(q);

    let kl: f64 = p
        .iter()
        .zip(&q)
        .map(|(&pi, &qi)| pi * (pi / qi).ln())
        .sum();

    trace!(bins, kl = format!("{:.6}", kl), "KL divergence computed");
    Ok(kl)
}

/// Conditional entropy `H(Y|X)` in bits over `bins` equal-width buckets per
/// series. Needs at least two paired observations.
pub fn conditional_entropy(y: &[f64], x: &[f64], bins: usize) -> EntropyOutcome {
    if bins == 0 {
        return Err(EntropyError::invalid("conditional entropy needs at least one bin"));
    }
    let (y, x) = tail_align(y, x);
    if y.len() < 2 {
        return Err(EntropyError::insufficient(2, y.len()));
    }
    require_finite(y)?;
    require_finite(x)?;

    let by = Binning::over(y, bins).ok_or_else(|| EntropyError::insufficient(2, 0))?;
    let bx = Binning::over(x, bins).ok_or_else(|| EntropyError::insufficient(2, 0))?;
    let ys = by.discretize(y);
    let xs = bx.discretize(x);

    let mut joint: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    let mut marginal_x: BTreeMap<usize, usize> = BTreeMap::new();
    for (&xi, &yi) in xs.iter().zip(&ys) {
        *joint.entry((xi, yi)).or_insert(0) += 1;
        *marginal_x.entry(xi).or_insert(0) += 1;
    }

    let n = xs.len();
    let h_xy = entropy_bits(joint.values().copied(), n);
    let h_x = entropy_bits(marginal_x.values().copied(), n);
    let h = (h_xy - h_x).max(0.0);

    trace!(
        bins,
        h_xy = format!("{:.4}", h_xy),
        h_x = format!("{:.4}", h_x),
        conditional = format!("{:.4}", h),
        "Conditional entropy computed"
    );

    Ok(h)
}
