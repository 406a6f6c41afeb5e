// =============================================================================
// Series Normalizer — raw market data in, clean return series out
// =============================================================================
//
// The market-data collaborator hands over whatever it has: closing prices,
// precomputed returns, or timestamped observations. Every calculator in this
// crate only ever sees a `ReturnSeries`, a finite-valued, ordered sequence of
// per-period relative changes.
//
// Whether a raw sequence is already a return series should be stated by the
// caller. When it is not, a best-effort heuristic applies: a maximum value
// above `RETURNS_MAGNITUDE_THRESHOLD` is taken to mean prices. Both genuine
// return series (in percent units) and low-priced assets can straddle that
// line, so the heuristic is only a fallback.

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum value above which an unlabelled series is treated as prices.
pub const RETURNS_MAGNITUDE_THRESHOLD: f64 = 10.0;

/// Ordered per-period relative price changes. Contains only finite values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries(Vec<f64>);

impl ReturnSeries {
    /// Wrap values that already are returns, dropping non-finite entries.
    pub fn from_returns(values: impl IntoIterator<Item = f64>) -> Self {
        Self(values.into_iter().filter(|v| v.is_finite()).collect())
    }

    /// Convert prices to period-over-period relative changes.
    ///
    /// The first price has no predecessor and produces no return. Changes that
    /// are not finite (a zero or missing price) are dropped.
    pub fn from_prices(prices: &[f64]) -> Self {
        let prices: Vec<f64> = prices.iter().copied().filter(|p| p.is_finite()).collect();
        Self(
            prices
                .windows(2)
                .map(|w| (w[1] - w[0]) / w[0])
                .filter(|r| r.is_finite())
                .collect(),
        )
    }

    /// Build from timestamped observations, ordering them by time first.
    pub fn from_indexed(points: &[(DateTime<Utc>, f64)], already_returns: Option<bool>) -> Self {
        let mut points = points.to_vec();
        points.sort_by_key(|(ts, _)| *ts);
        let values: Vec<f64> = points.into_iter().map(|(_, v)| v).collect();
        normalize_series(&values, already_returns)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl Deref for ReturnSeries {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl AsRef<[f64]> for ReturnSeries {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for ReturnSeries {
    fn from(values: Vec<f64>) -> Self {
        Self::from_returns(values)
    }
}

/// Turn a raw numeric sequence into a `ReturnSeries`.
///
/// `already_returns`:
/// - `Some(true)`: the values are returns and are only cleaned.
/// - `Some(false)`: the values are prices and are converted.
/// - `None`      : decided by [`looks_like_prices`] (best effort).
pub fn normalize_series(raw: &[f64], already_returns: Option<bool>) -> ReturnSeries {
    let is_returns = match already_returns {
        Some(flag) => flag,
        None => {
            let prices = looks_like_prices(raw);
            debug!(
                len = raw.len(),
                treated_as = if prices { "prices" } else { "returns" },
                threshold = RETURNS_MAGNITUDE_THRESHOLD,
                "series kind not supplied; applied magnitude heuristic"
            );
            !prices
        }
    };

    if is_returns {
        ReturnSeries::from_returns(raw.iter().copied())
    } else {
        ReturnSeries::from_prices(raw)
    }
}

/// Magnitude heuristic: the maximum finite value exceeds the threshold.
pub fn looks_like_prices(raw: &[f64]) -> bool {
    raw.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max)
        > RETURNS_MAGNITUDE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_prices_converted_to_returns() {
        let s = ReturnSeries::from_prices(&[100.0, 110.0, 99.0]);
        assert_eq!(s.len(), 2);
        assert!((s[0] - 0.10).abs() < 1e-12);
        assert!((s[1] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_zero_price_change_dropped() {
        let s = ReturnSeries::from_prices(&[0.0, 1.0, 2.0]);
        assert_eq!(s.as_slice(), &[1.0]);
    }

    #[test]
    fn test_explicit_flag_overrides_heuristic() {
        // Percent-unit returns above 10 would fool the heuristic.
        let raw = [12.0, -3.0, 4.5];
        let s = normalize_series(&raw, Some(true));
        assert_eq!(s.as_slice(), &raw);
        let guessed = normalize_series(&raw, None);
        assert_eq!(guessed.len(), 2, "heuristic treats this as prices");
    }

    #[test]
    fn test_heuristic_keeps_small_values_as_returns() {
        let raw = [0.01, -0.02, f64::NAN, 0.005];
        let s = normalize_series(&raw, None);
        assert_eq!(s.as_slice(), &[0.01, -0.02, 0.005]);
    }

    #[test]
    fn test_from_indexed_sorts_by_time() {
        let t = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
        let points = vec![(t(3), 121.0), (t(1), 100.0), (t(2), 110.0)];
        let s = ReturnSeries::from_indexed(&points, Some(false));
        assert_eq!(s.len(), 2);
        assert!((s[0] - 0.10).abs() < 1e-12);
        assert!((s[1] - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_single_price_yields_empty_series() {
        assert!(ReturnSeries::from_prices(&[100.0]).is_empty());
    }
}
