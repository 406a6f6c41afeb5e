// =============================================================================
// Report Assembler — one call from a return series to a CompositeReport
// =============================================================================
//
// The engine runs every base calculator with the parameters of its
// `EntropyConfig`, wraps each outcome into an `EntropyResult` and derives the
// interpretive scores. A constituent metric that is undefined never fails the
// report: it keeps its sentinel and is excluded from aggregation.
//
// Host applications attach their own context by handing a `tracing::Span` to
// `EntropyEngine::with_span`; every call runs inside it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, Span};

use crate::composite::scorer::{
    classify_regime, classify_risk, complexity_score, predictability_score, MarketRegime,
    RiskLevel,
};
use crate::divergence::{conditional_entropy, cross_entropy, kl_divergence};
use crate::engine_config::EntropyConfig;
use crate::entropy::{
    approximate_entropy, fuzzy_entropy, permutation_entropy, portfolio_diversification,
    sample_entropy, shannon_entropy, spectral_entropy, PortfolioDiversification,
};
use crate::error::EntropyError;
use crate::multiscale::{multiscale_entropy, MultiscaleResult};
use crate::series::ReturnSeries;
use crate::transfer::{influence_report, InfluenceReport};
use crate::types::{format_metric, EntropyResult, Metric};

/// Divergence of the analysed series from a reference series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMetrics {
    /// D_KL(series ‖ reference), nats.
    pub kl_divergence: EntropyResult,
    /// H(series, reference), nats.
    pub cross_entropy: EntropyResult,
    /// H(series | reference), bits.
    pub conditional_entropy: EntropyResult,
}

/// Full entropy profile of one asset at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeReport {
    pub asset: String,
    pub timestamp: DateTime<Utc>,
    pub shannon: EntropyResult,
    pub approximate: EntropyResult,
    pub sample: EntropyResult,
    pub permutation: EntropyResult,
    pub spectral: EntropyResult,
    pub fuzzy: EntropyResult,
    pub multiscale: MultiscaleResult,
    /// 0–100, `NaN` when no constituent is defined.
    #[serde(with = "crate::types::sentinel_float")]
    pub complexity_score: f64,
    #[serde(with = "crate::types::sentinel_float")]
    pub predictability_score: f64,
    pub market_regime: Option<MarketRegime>,
    pub risk_level: Option<RiskLevel>,
    /// Present only when a reference series was supplied.
    pub comparison_metrics: Option<ComparisonMetrics>,
}

impl CompositeReport {
    /// Label / display-value pairs for the dashboard.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let label = |v: Option<String>| v.unwrap_or_else(|| "N/A".to_string());

        let mut rows = vec![
            ("asset", self.asset.clone()),
            ("timestamp", self.timestamp.to_rfc3339()),
            ("shannon", format_metric(self.shannon.value, 4)),
            ("approximate", format_metric(self.approximate.value, 4)),
            ("sample", format_metric(self.sample.value, 4)),
            ("permutation", format_metric(self.permutation.value, 4)),
            ("spectral", format_metric(self.spectral.value, 4)),
            ("fuzzy", format_metric(self.fuzzy.value, 4)),
            ("multiscale_mean", format_metric(self.multiscale.mean_defined(), 4)),
            ("complexity_score", format_metric(self.complexity_score, 1)),
            ("predictability_score", format_metric(self.predictability_score, 1)),
            ("market_regime", label(self.market_regime.map(|r| r.to_string()))),
            ("risk_level", label(self.risk_level.map(|r| r.to_string()))),
        ];

        if let Some(cmp) = &self.comparison_metrics {
            rows.push(("kl_divergence", format_metric(cmp.kl_divergence.value, 4)));
            rows.push(("cross_entropy", format_metric(cmp.cross_entropy.value, 4)));
            rows.push((
                "conditional_entropy",
                format_metric(cmp.conditional_entropy.value, 4),
            ));
        }
        rows
    }
}

impl std::fmt::Display for CompositeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, value) in self.summary() {
            writeln!(f, "{:<22} {}", name, value)?;
        }
        Ok(())
    }
}

// =============================================================================
// EntropyEngine
// =============================================================================

pub struct EntropyEngine {
    config: EntropyConfig,
    span: Span,
}

impl EntropyEngine {
    pub fn new(config: EntropyConfig) -> Self {
        Self {
            config,
            span: info_span!("entropy_engine"),
        }
    }

    /// Replace the span every call is recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &EntropyConfig {
        &self.config
    }

    /// Compute the complete entropy profile of `series`.
    pub fn analyze(
        &self,
        asset: &str,
        series: &ReturnSeries,
        reference: Option<&ReturnSeries>,
    ) -> CompositeReport {
        let _guard = self.span.enter();
        let cfg = &self.config;
        let data = series.as_slice();
        let m = cfg.pattern_length;
        let r = cfg.tolerance_for(data);

        // ── 1. Base calculators ──────────────────────────────────────────
        let shannon = EntropyResult::from_outcome(
            Metric::Shannon {
                bins: cfg.shannon_bins,
                normalize: cfg.normalize,
            },
            shannon_entropy(data, cfg.shannon_bins, cfg.normalize),
        );
        let approximate = EntropyResult::from_outcome(
            Metric::Approximate { m, r },
            approximate_entropy(data, m, Some(r), cfg.kernel),
        );
        let sample = EntropyResult::from_outcome(
            Metric::Sample { m, r },
            sample_entropy(data, m, Some(r), cfg.kernel),
        );
        let permutation = EntropyResult::from_outcome(
            Metric::Permutation {
                order: cfg.permutation_order,
                delay: cfg.permutation_delay,
                normalize: cfg.normalize,
            },
            permutation_entropy(data, cfg.permutation_order, cfg.permutation_delay, cfg.normalize),
        );
        let spectral = EntropyResult::from_outcome(
            Metric::Spectral {
                method: cfg.spectral_method,
                normalize: cfg.normalize,
            },
            spectral_entropy(data, cfg.spectral_method, cfg.normalize),
        );
        let fuzzy = EntropyResult::from_outcome(
            Metric::Fuzzy {
                m,
                r,
                power: cfg.fuzzy_power,
            },
            fuzzy_entropy(data, m, Some(r), cfg.fuzzy_power, cfg.kernel),
        );
        let multiscale =
            multiscale_entropy(data, cfg.max_scale, cfg.multiscale_base, m, Some(r), cfg.kernel);

        // ── 2. Derived scores ────────────────────────────────────────────
        let complexity = complexity_score(shannon.value, sample.value, permutation.value);
        let predictability = predictability_score(complexity);
        let market_regime = classify_regime(shannon.value, approximate.value);
        let risk_level = classify_risk(complexity);

        // ── 3. Optional comparison against the reference ─────────────────
        let comparison_metrics = reference.map(|reference| self.compare(data, reference));

        debug!(
            asset,
            points = data.len(),
            complexity = format!("{:.2}", complexity),
            regime = ?market_regime,
            risk = ?risk_level,
            compared = comparison_metrics.is_some(),
            "composite entropy report assembled"
        );

        CompositeReport {
            asset: asset.to_string(),
            timestamp: Utc::now(),
            shannon,
            approximate,
            sample,
            permutation,
            spectral,
            fuzzy,
            multiscale,
            complexity_score: complexity,
            predictability_score: predictability,
            market_regime,
            risk_level,
            comparison_metrics,
        }
    }

    fn compare(&self, data: &[f64], reference: &ReturnSeries) -> ComparisonMetrics {
        let bins = self.config.comparison_bins;
        let reference = reference.as_slice();
        ComparisonMetrics {
            kl_divergence: EntropyResult::from_outcome(
                Metric::KlDivergence { bins },
                kl_divergence(data, reference, bins),
            ),
            cross_entropy: EntropyResult::from_outcome(
                Metric::CrossEntropy { bins },
                cross_entropy(data, reference, bins),
            ),
            conditional_entropy: EntropyResult::from_outcome(
                Metric::Conditional { bins },
                conditional_entropy(data, reference, bins),
            ),
        }
    }

    /// Directional influence of `source` on `target`.
    pub fn influence(&self, source: &ReturnSeries, target: &ReturnSeries) -> InfluenceReport {
        let _guard = self.span.enter();
        influence_report(source, target, &self.config.influence_params())
    }

    /// Diversification of a symbol → weight allocation.
    pub fn portfolio(
        &self,
        weights: &HashMap<String, f64>,
    ) -> Result<PortfolioDiversification, EntropyError> {
        let _guard = self.span.enter();
        let values: Vec<f64> = weights.values().copied().collect();
        let diversification = portfolio_diversification(&values)?;
        debug!(
            positions = diversification.positions,
            entropy = format!("{:.4}", diversification.entropy),
            ratio = format!("{:.3}", diversification.diversification_ratio),
            "portfolio diversification computed"
        );
        Ok(diversification)
    }
}

impl Default for EntropyEngine {
    fn default() -> Self {
        Self::new(EntropyConfig::default())
    }
}
