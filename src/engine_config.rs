// =============================================================================
// Engine Configuration — every tunable parameter of the entropy engine
// =============================================================================
//
// The engine has no configuration file or environment surface of its own.
// Callers construct an `EntropyConfig` directly, or hand over a JSON document
// they loaded themselves. All fields carry `#[serde(default)]` so that a
// partial document only overrides what it names.
//
// =============================================================================

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::divergence::DEFAULT_COMPARISON_BINS;
use crate::entropy::permutation::{DEFAULT_DELAY, DEFAULT_ORDER};
use crate::entropy::regularity::{
    default_tolerance, MatchKernel, DEFAULT_FUZZY_POWER, DEFAULT_PATTERN_LENGTH,
    DEFAULT_TOLERANCE_FACTOR,
};
use crate::entropy::shannon::DEFAULT_BINS;
use crate::entropy::spectral::SpectralMethod;
use crate::multiscale::{MultiscaleBase, DEFAULT_MAX_SCALE};
use crate::transfer::estimator::{TransferParams, DEFAULT_HISTORY, DEFAULT_TE_BINS};
use crate::transfer::influence::{
    InfluenceParams, DEFAULT_INFLUENCE_THRESHOLD, DEFAULT_ROLLING_WINDOW,
};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_shannon_bins() -> usize {
    DEFAULT_BINS
}

fn default_pattern_length() -> usize {
    DEFAULT_PATTERN_LENGTH
}

fn default_tolerance_factor() -> f64 {
    DEFAULT_TOLERANCE_FACTOR
}

fn default_fuzzy_power() -> f64 {
    DEFAULT_FUZZY_POWER
}

fn default_permutation_order() -> usize {
    DEFAULT_ORDER
}

fn default_permutation_delay() -> usize {
    DEFAULT_DELAY
}

fn default_max_scale() -> usize {
    DEFAULT_MAX_SCALE
}

fn default_comparison_bins() -> usize {
    DEFAULT_COMPARISON_BINS
}

fn default_history() -> usize {
    DEFAULT_HISTORY
}

fn default_te_bins() -> usize {
    DEFAULT_TE_BINS
}

fn default_influence_window() -> Option<usize> {
    Some(DEFAULT_ROLLING_WINDOW)
}

fn default_influence_threshold() -> f64 {
    DEFAULT_INFLUENCE_THRESHOLD
}

// =============================================================================
// EntropyConfig
// =============================================================================

/// Parameters for every calculator the engine runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyConfig {
    // --- Shannon -------------------------------------------------------------

    /// Histogram bins for Shannon entropy.
    #[serde(default = "default_shannon_bins")]
    pub shannon_bins: usize,

    /// Normalize Shannon, permutation and spectral entropy into [0, 1].
    #[serde(default = "default_true")]
    pub normalize: bool,

    // --- Regularity (ApEn / SampEn / FuzzyEn / multiscale) --------------------

    /// Template length m.
    #[serde(default = "default_pattern_length")]
    pub pattern_length: usize,

    /// Tolerance as a multiple of σ, used when `tolerance` is unset.
    #[serde(default = "default_tolerance_factor")]
    pub tolerance_factor: f64,

    /// Absolute tolerance r; overrides `tolerance_factor`.
    #[serde(default)]
    pub tolerance: Option<f64>,

    /// Exponent p of the fuzzy membership `exp(-dᵖ / r)`.
    #[serde(default = "default_fuzzy_power")]
    pub fuzzy_power: f64,

    /// Pair-distance kernel.
    #[serde(default)]
    pub kernel: MatchKernel,

    // --- Permutation ------------------------------------------------------------

    #[serde(default = "default_permutation_order")]
    pub permutation_order: usize,

    #[serde(default = "default_permutation_delay")]
    pub permutation_delay: usize,

    // --- Spectral ---------------------------------------------------------------

    #[serde(default)]
    pub spectral_method: SpectralMethod,

    // --- Multiscale -------------------------------------------------------------

    #[serde(default = "default_max_scale")]
    pub max_scale: usize,

    #[serde(default)]
    pub multiscale_base: MultiscaleBase,

    // --- Comparison against a reference ------------------------------------------

    /// Bins for cross entropy, KL divergence and conditional entropy.
    #[serde(default = "default_comparison_bins")]
    pub comparison_bins: usize,

    // --- Transfer entropy / influence --------------------------------------------

    /// Target history length k.
    #[serde(default = "default_history")]
    pub te_target_history: usize,

    /// Source history length l.
    #[serde(default = "default_history")]
    pub te_source_history: usize,

    #[serde(default = "default_te_bins")]
    pub te_bins: usize,

    /// Rolling influence window; `None` disables the rolling series.
    #[serde(default = "default_influence_window")]
    pub influence_window: Option<usize>,

    /// Net influence (bits) beyond which one side is reported as leading.
    #[serde(default = "default_influence_threshold")]
    pub influence_threshold: f64,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            shannon_bins: default_shannon_bins(),
            normalize: true,
            pattern_length: default_pattern_length(),
            tolerance_factor: default_tolerance_factor(),
            tolerance: None,
            fuzzy_power: default_fuzzy_power(),
            kernel: MatchKernel::default(),
            permutation_order: default_permutation_order(),
            permutation_delay: default_permutation_delay(),
            spectral_method: SpectralMethod::default(),
            max_scale: default_max_scale(),
            multiscale_base: MultiscaleBase::default(),
            comparison_bins: default_comparison_bins(),
            te_target_history: default_history(),
            te_source_history: default_history(),
            te_bins: default_te_bins(),
            influence_window: default_influence_window(),
            influence_threshold: default_influence_threshold(),
        }
    }
}

impl EntropyConfig {
    /// Parse and validate a JSON document supplied by the host application.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("failed to parse entropy config JSON")?;
        config.validate().context("entropy config rejected")?;

        debug!(
            shannon_bins = config.shannon_bins,
            m = config.pattern_length,
            kernel = ?config.kernel,
            spectral = %config.spectral_method,
            "entropy config loaded"
        );

        Ok(config)
    }

    /// Check every parameter against its algorithm's domain.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.shannon_bins >= 2, "shannon_bins must be >= 2");
        ensure!(self.pattern_length >= 1, "pattern_length must be >= 1");
        ensure!(
            self.tolerance_factor.is_finite() && self.tolerance_factor > 0.0,
            "tolerance_factor must be positive"
        );
        if let Some(r) = self.tolerance {
            ensure!(r.is_finite() && r > 0.0, "tolerance must be positive, got {}", r);
        }
        ensure!(
            self.fuzzy_power.is_finite() && self.fuzzy_power > 0.0,
            "fuzzy_power must be positive"
        );
        ensure!(self.permutation_order >= 2, "permutation_order must be >= 2");
        ensure!(self.permutation_delay >= 1, "permutation_delay must be >= 1");
        if let SpectralMethod::Welch { segment_len } = self.spectral_method {
            ensure!(segment_len >= 4, "welch segment_len must be >= 4");
        }
        ensure!(self.max_scale >= 1, "max_scale must be >= 1");
        ensure!(self.comparison_bins >= 1, "comparison_bins must be >= 1");
        ensure!(
            self.te_target_history >= 1 && self.te_source_history >= 1,
            "transfer entropy history lengths must be >= 1"
        );
        ensure!(self.te_bins >= 1, "te_bins must be >= 1");
        if let Some(window) = self.influence_window {
            ensure!(
                window > self.te_target_history + self.te_source_history,
                "influence_window must exceed k + l"
            );
        }
        ensure!(
            self.influence_threshold.is_finite() && self.influence_threshold >= 0.0,
            "influence_threshold must be non-negative"
        );
        Ok(())
    }

    /// Tolerance r for `data`: the explicit value, or `factor × σ`.
    pub fn tolerance_for(&self, data: &[f64]) -> f64 {
        self.tolerance
            .unwrap_or_else(|| default_tolerance(data, self.tolerance_factor))
    }

    pub fn transfer_params(&self) -> TransferParams {
        TransferParams {
            k: self.te_target_history,
            l: self.te_source_history,
            bins: self.te_bins,
        }
    }

    pub fn influence_params(&self) -> InfluenceParams {
        InfluenceParams {
            transfer: self.transfer_params(),
            rolling_window: self.influence_window,
            threshold: self.influence_threshold,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = EntropyConfig::default();
        assert_eq!(cfg.shannon_bins, 50);
        assert!(cfg.normalize);
        assert_eq!(cfg.pattern_length, 2);
        assert!((cfg.tolerance_factor - 0.2).abs() < f64::EPSILON);
        assert_eq!(cfg.kernel, MatchKernel::Naive);
        assert_eq!(cfg.permutation_order, 3);
        assert_eq!(cfg.multiscale_base, MultiscaleBase::Sample);
        assert_eq!(cfg.influence_window, Some(30));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg = EntropyConfig::from_json("{}").unwrap();
        assert_eq!(cfg, EntropyConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "shannon_bins": 20,
            "kernel": "distance_matrix",
            "spectral_method": { "kind": "periodogram" },
            "influence_window": null
        }"#;
        let cfg = EntropyConfig::from_json(json).unwrap();
        assert_eq!(cfg.shannon_bins, 20);
        assert_eq!(cfg.kernel, MatchKernel::DistanceMatrix);
        assert_eq!(cfg.spectral_method, SpectralMethod::Periodogram);
        assert_eq!(cfg.influence_window, None);
        assert_eq!(cfg.pattern_length, 2);
    }

    #[test]
    fn invalid_values_rejected() {
        let err = EntropyConfig::from_json(r#"{ "permutation_order": 1 }"#).unwrap_err();
        assert!(format!("{:#}", err).contains("permutation_order"));
        assert!(EntropyConfig::from_json(r#"{ "tolerance": -1.0 }"#).is_err());
        assert!(EntropyConfig::from_json("not json").is_err());
    }

    #[test]
    fn tolerance_prefers_explicit_value() {
        let data = [0.0, 1.0, 0.0, 1.0];
        let mut cfg = EntropyConfig::default();
        assert!((cfg.tolerance_for(&data) - 0.1).abs() < 1e-12);
        cfg.tolerance = Some(0.3);
        assert_eq!(cfg.tolerance_for(&data), 0.3);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = EntropyConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: EntropyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, cfg2);
    }
}
