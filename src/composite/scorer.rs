// =============================================================================
// Composite Scorer — complexity, predictability, regime and risk labels
// =============================================================================
//
// Rescaling onto 0–100:
//
//   Shannon (normalized)      h      =>  100 * h
//   Sample Entropy            x      =>  100 * (1 - e^(-x))      (+inf => 100)
//   Permutation (normalized)  h      =>  100 * h
//
//   complexity     = mean of the defined rescaled values, clamped to [0, 100]
//   predictability = 100 - complexity
//
// Regime ladder over (shannon, apen), evaluated top-to-bottom; first match
// wins:
//
//   1. ORDERED       shannon < 0.30 AND apen < 0.30
//   2. STRUCTURED    shannon < 0.50 AND apen < 0.60
//   3. TRANSITIONAL  shannon < 0.70 AND apen < 1.00
//   4. COMPLEX       shannon < 0.85
//   5. CHAOTIC       otherwise
//
// Risk ladder over complexity: < 20 VERY LOW, < 40 LOW, < 60 MODERATE,
// < 80 HIGH, else VERY HIGH.
//
// Undefined inputs are excluded, never replaced by a number.

use serde::{Deserialize, Serialize};
use tracing::trace;

// =============================================================================
// Types
// =============================================================================

/// Market regime by increasing complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarketRegime {
    /// Low distributional spread and highly repetitive dynamics.
    Ordered,
    /// Recurring structure a model can exploit.
    Structured,
    /// Mixed structure and noise.
    Transitional,
    /// Wide distribution, weak repetition.
    Complex,
    /// Near-maximum entropy: price behaves as random noise.
    Chaotic,
}

impl std::fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ordered => write!(f, "ORDERED"),
            Self::Structured => write!(f, "STRUCTURED"),
            Self::Transitional => write!(f, "TRANSITIONAL"),
            Self::Complex => write!(f, "COMPLEX"),
            Self::Chaotic => write!(f, "CHAOTIC"),
        }
    }
}

/// Risk level implied by the complexity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VeryLow => write!(f, "VERY LOW"),
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
            Self::VeryHigh => write!(f, "VERY HIGH"),
        }
    }
}

// =============================================================================
// Rescaling
// =============================================================================

/// Normalized Shannon or permutation entropy onto 0–100.
pub fn rescale_unit(h: f64) -> f64 {
    if h.is_nan() {
        return f64::NAN;
    }
    (h * 100.0).clamp(0.0, 100.0)
}

/// Sample entropy onto 0–100 via `1 - e^(-x)`. `+inf` (no matches) maps to 100.
pub fn rescale_sample_entropy(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    ((1.0 - (-x).exp()) * 100.0).clamp(0.0, 100.0)
}

/// Mean of the rescaled Shannon, Sample and Permutation entropy that are
/// defined. `NaN` when none is.
pub fn complexity_score(shannon: f64, sample: f64, permutation: f64) -> f64 {
    let parts = [
        rescale_unit(shannon),
        rescale_sample_entropy(sample),
        rescale_unit(permutation),
    ];
    let defined: Vec<f64> = parts.iter().copied().filter(|v| !v.is_nan()).collect();
    if defined.is_empty() {
        trace!("Complexity: every input undefined");
        return f64::NAN;
    }
    let score = (defined.iter().sum::<f64>() / defined.len() as f64).clamp(0.0, 100.0);

    trace!(
        used = defined.len(),
        score = format!("{:.2}", score),
        "Complexity score computed"
    );
    score
}

/// `100 - complexity`, undefined when complexity is.
pub fn predictability_score(complexity: f64) -> f64 {
    100.0 - complexity
}

// =============================================================================
// Classification logic
// =============================================================================

/// Regime from normalized Shannon entropy and approximate entropy.
pub fn classify_regime(shannon: f64, apen: f64) -> Option<MarketRegime> {
    if shannon.is_nan() || apen.is_nan() {
        trace!("Regime: undefined input, no classification");
        return None;
    }

    let regime = if shannon < 0.30 && apen < 0.30 {
        MarketRegime::Ordered
    } else if shannon < 0.50 && apen < 0.60 {
        MarketRegime::Structured
    } else if shannon < 0.70 && apen < 1.00 {
        MarketRegime::Transitional
    } else if shannon < 0.85 {
        MarketRegime::Complex
    } else {
        MarketRegime::Chaotic
    };
    Some(regime)
}

/// Risk level from the complexity score.
pub fn classify_risk(complexity: f64) -> Option<RiskLevel> {
    if complexity.is_nan() {
        return None;
    }
    let level = if complexity < 20.0 {
        RiskLevel::VeryLow
    } else if complexity < 40.0 {
        RiskLevel::Low
    } else if complexity < 60.0 {
        RiskLevel::Moderate
    } else if complexity < 80.0 {
        RiskLevel::High
    } else {
        RiskLevel::VeryHigh
    };
    Some(level)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ordered() {
        assert_eq!(classify_regime(0.2, 0.1), Some(MarketRegime::Ordered));
    }

    #[test]
    fn test_classify_structured() {
        assert_eq!(classify_regime(0.4, 0.5), Some(MarketRegime::Structured));
        // Low shannon but high apen falls through to a later tier.
        assert_eq!(classify_regime(0.2, 0.8), Some(MarketRegime::Transitional));
    }

    #[test]
    fn test_classify_complex_and_chaotic() {
        assert_eq!(classify_regime(0.8, 1.5), Some(MarketRegime::Complex));
        assert_eq!(classify_regime(0.9, 0.1), Some(MarketRegime::Chaotic));
    }

    #[test]
    fn test_classify_undefined() {
        assert_eq!(classify_regime(f64::NAN, 0.1), None);
        assert_eq!(classify_regime(0.5, f64::NAN), None);
    }

    #[test]
    fn test_regimes_are_ordered() {
        assert!(MarketRegime::Ordered < MarketRegime::Chaotic);
        assert!(RiskLevel::Low < RiskLevel::VeryHigh);
    }

    #[test]
    fn test_risk_ladder() {
        assert_eq!(classify_risk(10.0), Some(RiskLevel::VeryLow));
        assert_eq!(classify_risk(20.0), Some(RiskLevel::Low));
        assert_eq!(classify_risk(59.9), Some(RiskLevel::Moderate));
        assert_eq!(classify_risk(79.0), Some(RiskLevel::High));
        assert_eq!(classify_risk(100.0), Some(RiskLevel::VeryHigh));
        assert_eq!(classify_risk(f64::NAN), None);
    }

    #[test]
    fn test_complexity_excludes_nan() {
        let score = complexity_score(0.5, f64::NAN, 0.7);
        assert!((score - 60.0).abs() < 1e-10, "got {:.4}", score);
        assert!(complexity_score(f64::NAN, f64::NAN, f64::NAN).is_nan());
        assert!(predictability_score(f64::NAN).is_nan());
    }

    #[test]
    fn test_sample_entropy_rescale() {
        assert_eq!(rescale_sample_entropy(0.0), 0.0);
        assert_eq!(rescale_sample_entropy(f64::INFINITY), 100.0);
        assert!((rescale_sample_entropy(1.0) - 100.0 * (1.0 - (-1.0_f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_predictability_complements_complexity() {
        let c = complexity_score(0.9, 2.0, 0.95);
        assert!((predictability_score(c) + c - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_display() {
        assert_eq!(MarketRegime::Chaotic.to_string(), "CHAOTIC");
        assert_eq!(RiskLevel::VeryHigh.to_string(), "VERY HIGH");
    }
}
