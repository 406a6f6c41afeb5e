// =============================================================================
// Permutation Entropy — complexity of ordinal patterns (Bandt & Pompe)
// =============================================================================
//
// Each window of `order` points spaced `delay` apart is replaced by the
// permutation that sorts it. The entropy of the pattern frequencies is
//
//   H = -Σ p_π * log2(p_π),    H_norm = H / log2(order!)
//
// Ranks make the measure invariant to monotonic transforms of the input. Ties
// are broken by position, so a flat window maps to the identity pattern.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::{EntropyError, EntropyOutcome};
use crate::stats::{entropy_bits, require_finite, require_len};

/// Default embedding order.
pub const DEFAULT_ORDER: usize = 3;

/// Default embedding delay.
pub const DEFAULT_DELAY: usize = 1;

/// Permutation entropy of `data`.
///
/// Requires `order ≥ 2`, `delay ≥ 1` and `n ≥ order × delay`.
pub fn permutation_entropy(
    data: &[f64],
    order: usize,
    delay: usize,
    normalize: bool,
) -> EntropyOutcome {
    if order < 2 {
        return Err(EntropyError::invalid(format!(
            "embedding order must be at least 2, got {}",
            order
        )));
    }
    if delay == 0 {
        return Err(EntropyError::invalid("embedding delay must be at least 1"));
    }
    require_len(data, order * delay)?;
    require_finite(data)?;

    let span = (order - 1) * delay;
    let n_windows = data.len() - span;

    let mut counts: BTreeMap<Vec<usize>, usize> = BTreeMap::new();
    let mut window = Vec::with_capacity(order);
    for start in 0..n_windows {
        window.clear();
        window.extend((0..order).map(|k| data[start + k * delay]));
        *counts.entry(ordinal_pattern(&window)).or_insert(0) += 1;
    }

    let entropy = entropy_bits(counts.values().copied(), n_windows);

    let value = if normalize {
        let factorial: f64 = (1..=order).map(|k| k as f64).product();
        entropy / factorial.log2()
    } else {
        entropy
    };

    trace!(
        order,
        delay,
        patterns = counts.len(),
        entropy = format!("{:.4}", value),
        "Permutation entropy computed"
    );

    Ok(value)
}

/// Indices that sort `window` ascending (stable, so ties keep their order).
fn ordinal_pattern(window: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..window.len()).collect();
    indices.sort_by(|&a, &b| {
        window[a]
            .partial_cmp(&window[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}
