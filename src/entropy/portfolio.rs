// =============================================================================
// Portfolio Entropy — diversification of position weights
// =============================================================================
//
//   H = -Σ w_i * ln(w_i)      weights normalized to sum to 1
//
// H = 0 for a single fully concentrated position, H = ln(N) for N equally
// weighted positions. exp(H) is the effective number of independent bets.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{EntropyError, EntropyOutcome};

/// Diversification summary derived from portfolio entropy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDiversification {
    /// Natural-log entropy of the normalized weights.
    pub entropy: f64,
    /// `ln(N)` for the N positive positions.
    pub max_entropy: f64,
    /// `entropy / max_entropy`; 1.0 for a single position.
    pub diversification_ratio: f64,
    /// `exp(entropy)`.
    pub effective_assets: f64,
    /// Positions with positive weight.
    pub positions: usize,
}

/// Keep positive finite weights and rescale them to sum to 1.
fn normalized_weights(weights: &[f64]) -> Result<Vec<f64>, EntropyError> {
    let positive: Vec<f64> = weights
        .iter()
        .copied()
        .filter(|w| w.is_finite() && *w > 0.0)
        .collect();
    let total: f64 = positive.iter().sum();
    if positive.is_empty() || total <= 0.0 {
        return Err(EntropyError::degenerate("no positive portfolio weights"));
    }
    Ok(positive.into_iter().map(|w| w / total).collect())
}

/// Shannon entropy (nats) of a portfolio's weights.
pub fn portfolio_entropy(weights: &[f64]) -> EntropyOutcome {
    let normalized = normalized_weights(weights)?;
    let entropy: f64 = normalized.iter().map(|&w| -w * w.ln()).sum();

    trace!(
        positions = normalized.len(),
        entropy = format!("{:.4}", entropy),
        "Portfolio entropy computed"
    );

    Ok(entropy.max(0.0))
}

/// [`portfolio_entropy`] over a symbol → weight map.
pub fn portfolio_entropy_from_map(weights: &HashMap<String, f64>) -> EntropyOutcome {
    let values: Vec<f64> = weights.values().copied().collect();
    portfolio_entropy(&values)
}

/// Entropy plus the derived diversification measures.
pub fn portfolio_diversification(
    weights: &[f64],
) -> Result<PortfolioDiversification, EntropyError> {
    let positions = normalized_weights(weights)?.len();
    let entropy = portfolio_entropy(weights)?;
    let max_entropy = (positions as f64).ln();
    let diversification_ratio = if max_entropy > 0.0 {
        entropy / max_entropy
    } else {
        1.0
    };

    Ok(PortfolioDiversification {
        entropy,
        max_entropy,
        diversification_ratio,
        effective_assets: entropy.exp(),
        positions,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_concentrated_zero() {
        let h = portfolio_entropy(&[1.0, 0.0, 0.0, 0.0]).unwrap();
        assert!(h.abs() < 1e-12, "got {:.6}", h);
    }

    #[test]
    fn test_equal_weights_ln_n() {
        let h = portfolio_entropy(&[0.25, 0.25, 0.25, 0.25]).unwrap();
        assert!((h - 4.0_f64.ln()).abs() < 1e-12, "got {:.6}", h);
    }

    #[test]
    fn test_unnormalized_weights_rescaled() {
        let a = portfolio_entropy(&[2.0, 2.0]).unwrap();
        assert!((a - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_negative_weights_discarded() {
        let h = portfolio_entropy(&[0.5, -0.5, 0.5]).unwrap();
        assert!((h - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_portfolio_degenerate() {
        assert!(portfolio_entropy(&[]).is_err());
        assert!(portfolio_entropy(&[0.0, 0.0]).unwrap_err().sentinel().is_nan());
    }

    #[test]
    fn test_from_map() {
        let weights: HashMap<String, f64> = [("BTC", 0.5), ("ETH", 0.5)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let h = portfolio_entropy_from_map(&weights).unwrap();
        assert!((h - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_diversification_effective_assets() {
        let d = portfolio_diversification(&[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(d.positions, 3);
        assert!((d.effective_assets - 3.0).abs() < 1e-9);
        assert!((d.diversification_ratio - 1.0).abs() < 1e-12);

        let skewed = portfolio_diversification(&[0.9, 0.05, 0.05]).unwrap();
        assert!(skewed.effective_assets < 2.0);
        assert!(skewed.diversification_ratio < 1.0);
    }
}
