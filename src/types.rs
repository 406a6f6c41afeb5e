// =============================================================================
// Shared types used across the entropy engine
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::entropy::spectral::SpectralMethod;
use crate::error::{EntropyError, EntropyOutcome};
use crate::multiscale::MultiscaleBase;

// =============================================================================
// Sentinel-preserving float encoding
// =============================================================================

/// Serde adapter for floats that may hold a sentinel.
///
/// JSON has no NaN or infinity and `serde_json` writes both as `null`, which
/// would make "undefined" and "unbounded" indistinguishable and the value
/// unreadable. Finite values stay numbers; sentinels become `"NaN"`, `"inf"`
/// and `"-inf"`.
pub mod sentinel_float {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("unknown float sentinel {:?}", other))),
            },
        }
    }

    /// The same encoding for every element of a `Vec<f64>`.
    pub mod vec {
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        #[derive(Serialize, Deserialize)]
        struct Item(#[serde(with = "super")] f64);

        pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(values.iter().map(|&v| Item(v)))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
            let items = Vec::<Item>::deserialize(deserializer)?;
            Ok(items.into_iter().map(|Item(v)| v).collect())
        }
    }
}

/// Algorithm tag carrying the parameters a value was computed with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum Metric {
    Shannon { bins: usize, normalize: bool },
    Approximate {
        m: usize,
        #[serde(with = "sentinel_float")]
        r: f64,
    },
    Sample {
        m: usize,
        #[serde(with = "sentinel_float")]
        r: f64,
    },
    Permutation { order: usize, delay: usize, normalize: bool },
    Spectral { method: SpectralMethod, normalize: bool },
    Fuzzy {
        m: usize,
        #[serde(with = "sentinel_float")]
        r: f64,
        power: f64,
    },
    Multiscale {
        base: MultiscaleBase,
        scale: usize,
        m: usize,
        #[serde(with = "sentinel_float")]
        r: f64,
    },
    CrossEntropy { bins: usize },
    KlDivergence { bins: usize },
    Conditional { bins: usize },
    Transfer { k: usize, l: usize, bins: usize },
    Portfolio { assets: usize },
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shannon { bins, .. } => write!(f, "Shannon(bins={})", bins),
            Self::Approximate { m, r } => write!(f, "ApEn(m={}, r={:.4})", m, r),
            Self::Sample { m, r } => write!(f, "SampEn(m={}, r={:.4})", m, r),
            Self::Permutation { order, delay, .. } => {
                write!(f, "PermEn(order={}, delay={})", order, delay)
            }
            Self::Spectral { method, .. } => write!(f, "SpecEn({})", method),
            Self::Fuzzy { m, r, power } => {
                write!(f, "FuzzyEn(m={}, r={:.4}, p={})", m, r, power)
            }
            Self::Multiscale { base, scale, .. } => write!(f, "MSE({}, scale={})", base, scale),
            Self::CrossEntropy { bins } => write!(f, "CrossEntropy(bins={})", bins),
            Self::KlDivergence { bins } => write!(f, "KL(bins={})", bins),
            Self::Conditional { bins } => write!(f, "H(Y|X)(bins={})", bins),
            Self::Transfer { k, l, bins } => write!(f, "TE(k={}, l={}, bins={})", k, l, bins),
            Self::Portfolio { assets } => write!(f, "PortfolioEntropy(n={})", assets),
        }
    }
}

/// A single metric value, or its sentinel together with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyResult {
    pub metric: Metric,
    /// Measurement, `NaN` when undefined, `+inf` when unbounded.
    #[serde(with = "sentinel_float")]
    pub value: f64,
    /// Set whenever `value` is a sentinel.
    pub undefined: Option<EntropyError>,
}

impl EntropyResult {
    pub fn from_outcome(metric: Metric, outcome: EntropyOutcome) -> Self {
        match outcome {
            Ok(value) => Self {
                metric,
                value,
                undefined: None,
            },
            Err(e) => Self {
                metric,
                value: e.sentinel(),
                undefined: Some(e),
            },
        }
    }

    pub fn is_defined(&self) -> bool {
        self.undefined.is_none()
    }
}

/// Render a metric for display: `N/A` for undefined, `∞` for unbounded.
pub fn format_metric(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "N/A".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "∞".to_string() } else { "-∞".to_string() }
    } else {
        format!("{:.*}", precision, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_outcome_error_uses_sentinel() {
        let r = EntropyResult::from_outcome(
            Metric::Sample { m: 2, r: 0.1 },
            Err(EntropyError::NoMatchingPatterns),
        );
        assert_eq!(r.value, f64::INFINITY);
        assert!(!r.is_defined());
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(f64::NAN, 2), "N/A");
        assert_eq!(format_metric(f64::INFINITY, 2), "∞");
        assert_eq!(format_metric(0.12345, 3), "0.123");
    }

    #[test]
    fn test_metric_display() {
        let m = Metric::Permutation {
            order: 3,
            delay: 1,
            normalize: true,
        };
        assert_eq!(format!("{}", m), "PermEn(order=3, delay=1)");
    }

    #[test]
    fn test_sentinels_survive_json() {
        let unbounded = EntropyResult::from_outcome(
            Metric::Sample { m: 2, r: 0.1 },
            Err(EntropyError::NoMatchingPatterns),
        );
        let undefined = EntropyResult::from_outcome(
            Metric::Approximate { m: 2, r: f64::NAN },
            Err(EntropyError::insufficient(4, 1)),
        );

        let json = serde_json::to_string(&unbounded).unwrap();
        assert!(json.contains("\"value\":\"inf\""), "{}", json);
        let back: EntropyResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, unbounded);

        let json = serde_json::to_string(&undefined).unwrap();
        let back: EntropyResult = serde_json::from_str(&json).unwrap();
        assert!(back.value.is_nan());
        assert!(matches!(back.metric, Metric::Approximate { r, .. } if r.is_nan()));
        assert_eq!(back.undefined, undefined.undefined);
    }

    #[test]
    fn test_finite_values_stay_numbers() {
        let r = EntropyResult::from_outcome(Metric::Portfolio { assets: 2 }, Ok(0.5));
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"value\":0.5"), "{}", json);
        assert!(serde_json::from_str::<EntropyResult>(r#"{"metric":{"algorithm":"portfolio","assets":2},"value":"huge","undefined":null}"#).is_err());
    }

    #[test]
    fn test_metric_serialises_with_tag() {
        let json = serde_json::to_string(&Metric::Shannon {
            bins: 50,
            normalize: true,
        })
        .unwrap();
        assert!(json.contains("\"algorithm\":\"shannon\""));
    }
}
