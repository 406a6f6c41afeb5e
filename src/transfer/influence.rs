// =============================================================================
// Influence Report — which of two series leads the other?
// =============================================================================
//
// Typical use: source = large-holder (whale) net flow, target = price returns.
//
//   net_influence = T(source→target) - T(target→source)
//
//   net >  threshold  =>  SOURCE LEADING
//   net < -threshold  =>  TARGET LEADING
//   otherwise         =>  BALANCED
//
// The optional rolling mode re-runs the estimator (source→target) over every
// window of fixed length, step 1. Windows are independent and are evaluated in
// parallel; results are collected in window order, so the output is the same
// as a sequential pass.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::outcome_value;
use crate::stats::tail_align;
use crate::transfer::estimator::{transfer_entropy, TransferParams};
use crate::types::Metric;

/// Default net-influence threshold (bits) separating a lead from balance.
pub const DEFAULT_INFLUENCE_THRESHOLD: f64 = 0.1;

/// Default rolling window length.
pub const DEFAULT_ROLLING_WINDOW: usize = 30;

/// Three-way reading of the net influence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfluenceDirection {
    /// The source's past predicts the target better than the reverse.
    SourceLeading,
    /// The target's past predicts the source better than the reverse.
    TargetLeading,
    /// No direction dominates beyond the threshold.
    Balanced,
}

impl std::fmt::Display for InfluenceDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceLeading => write!(f, "source leading"),
            Self::TargetLeading => write!(f, "target leading"),
            Self::Balanced => write!(f, "balanced"),
        }
    }
}

impl InfluenceDirection {
    /// Classify a net influence value; `None` when it is undefined.
    pub fn classify(net_influence: f64, threshold: f64) -> Option<Self> {
        if net_influence.is_nan() {
            None
        } else if net_influence > threshold {
            Some(Self::SourceLeading)
        } else if net_influence < -threshold {
            Some(Self::TargetLeading)
        } else {
            Some(Self::Balanced)
        }
    }
}

/// Parameters for [`influence_report`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InfluenceParams {
    pub transfer: TransferParams,
    /// Window length for the rolling series; `None` skips it.
    pub rolling_window: Option<usize>,
    /// Net-influence threshold in bits.
    pub threshold: f64,
}

impl Default for InfluenceParams {
    fn default() -> Self {
        Self {
            transfer: TransferParams::default(),
            rolling_window: Some(DEFAULT_ROLLING_WINDOW),
            threshold: DEFAULT_INFLUENCE_THRESHOLD,
        }
    }
}

/// Source→target transfer entropy over sliding windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingTransferEntropy {
    pub window: usize,
    /// One value per window start, in order; `NaN` for undefined windows.
    #[serde(with = "crate::types::sentinel_float::vec")]
    pub values: Vec<f64>,
    /// Mean over defined windows.
    #[serde(with = "crate::types::sentinel_float")]
    pub mean: f64,
    /// Population standard deviation over defined windows.
    #[serde(with = "crate::types::sentinel_float")]
    pub std_dev: f64,
}

/// Directional transfer entropy pair and its interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceReport {
    pub metric: Metric,
    #[serde(with = "crate::types::sentinel_float")]
    pub source_to_target: f64,
    #[serde(with = "crate::types::sentinel_float")]
    pub target_to_source: f64,
    #[serde(with = "crate::types::sentinel_float")]
    pub net_influence: f64,
    pub direction: Option<InfluenceDirection>,
    pub rolling: Option<RollingTransferEntropy>,
}

/// Build the influence report of `source` on `target`.
pub fn influence_report(source: &[f64], target: &[f64], params: &InfluenceParams) -> InfluenceReport {
    let tp = params.transfer;
    let source_to_target = outcome_value(&transfer_entropy(source, target, tp));
    let target_to_source = outcome_value(&transfer_entropy(target, source, tp));
    let net_influence = source_to_target - target_to_source;
    let direction = InfluenceDirection::classify(net_influence, params.threshold);

    let rolling = params
        .rolling_window
        .and_then(|window| rolling_transfer_entropy(source, target, window, tp));

    debug!(
        source_to_target = format!("{:.4}", source_to_target),
        target_to_source = format!("{:.4}", target_to_source),
        net = format!("{:.4}", net_influence),
        direction = ?direction,
        rolling_windows = rolling.as_ref().map(|r| r.values.len()).unwrap_or(0),
        "Influence report built"
    );

    InfluenceReport {
        metric: Metric::Transfer {
            k: tp.k,
            l: tp.l,
            bins: tp.bins,
        },
        source_to_target,
        target_to_source,
        net_influence,
        direction,
        rolling,
    }
}

/// Rolling source→target TE. `None` when the window is zero or longer than
/// the aligned series.
pub fn rolling_transfer_entropy(
    source: &[f64],
    target: &[f64],
    window: usize,
    params: TransferParams,
) -> Option<RollingTransferEntropy> {
    let (x, y) = tail_align(source, target);
    if window == 0 || window > x.len() {
        return None;
    }

    let values: Vec<f64> = (0..=x.len() - window)
        .into_par_iter()
        .map(|start| {
            let end = start + window;
            outcome_value(&transfer_entropy(&x[start..end], &y[start..end], params))
        })
        .collect();

    let defined: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let (mean, std_dev) = if defined.is_empty() {
        (f64::NAN, f64::NAN)
    } else {
        (
            crate::stats::mean(&defined),
            crate::stats::std_dev(&defined),
        )
    };

    Some(RollingTransferEntropy {
        window,
        values,
        mean,
        std_dev,
    })
}
