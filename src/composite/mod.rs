// =============================================================================
// Composite Module
// =============================================================================
//
// Turns the base entropy results of a single asset into interpretive scores:
// - complexity / predictability on a 0–100 scale
// - market regime (ORDERED .. CHAOTIC)
// - risk level (VERY LOW .. VERY HIGH)
//
// `EntropyEngine` assembles the full `CompositeReport`.

pub mod report;
pub mod scorer;

pub use report::{ComparisonMetrics, CompositeReport, EntropyEngine};
pub use scorer::{
    classify_regime, classify_risk, complexity_score, predictability_score, MarketRegime,
    RiskLevel,
};
