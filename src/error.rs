// =============================================================================
// Calculation Outcomes — typed "undefined" results for every entropy metric
// =============================================================================
//
// None of these are exceptional. A short window, a flat series or a sample
// entropy run without a single matching template pair are ordinary market
// conditions, so every calculator returns an `EntropyOutcome` and the report
// assembler turns failures into their float sentinel:
//
//   InsufficientData        =>  NaN
//   DegenerateDistribution  =>  NaN
//   InvalidParameter        =>  NaN
//   NoMatchingPatterns      =>  +inf

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a metric could not produce a finite measurement.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EntropyError {
    /// Series shorter than the algorithm's minimum length.
    #[error("insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Zero variance, empty histogram after filtering, zero spectral power.
    #[error("degenerate distribution: {reason}")]
    DegenerateDistribution { reason: String },

    /// Sample entropy found no template pair matching at length m+1.
    #[error("no matching template pairs within tolerance")]
    NoMatchingPatterns,

    /// Parameter outside the algorithm's domain (zero bins, order < 2, r < 0).
    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },
}

impl EntropyError {
    pub(crate) fn insufficient(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateDistribution {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    /// The float a consumer sees in place of a measurement.
    pub fn sentinel(&self) -> f64 {
        match self {
            Self::NoMatchingPatterns => f64::INFINITY,
            _ => f64::NAN,
        }
    }
}

/// Result of a single entropy calculation.
pub type EntropyOutcome = Result<f64, EntropyError>;

/// Collapse an outcome into its value or sentinel.
pub fn outcome_value(outcome: &EntropyOutcome) -> f64 {
    match outcome {
        Ok(v) => *v,
        Err(e) => e.sentinel(),
    }
}
