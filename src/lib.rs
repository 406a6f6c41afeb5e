// =============================================================================
// Market Entropy — information-theoretic complexity of return series
// =============================================================================
//
// Shannon, Approximate, Sample, Fuzzy, Permutation, Spectral, Multiscale,
// Transfer, Conditional, Cross and Portfolio entropy over financial return
// series, combined into complexity / predictability scores, a market regime,
// a risk level and directional influence reports.
//
// The crate is a synchronous library with no I/O. It never installs a
// tracing subscriber; host applications decide where logs go.
// =============================================================================

//! Entropy-based market complexity analysis.
//!
//! ```no_run
//! use market_entropy::{EntropyConfig, EntropyEngine, ReturnSeries};
//!
//! let closes = [100.0, 101.2, 100.8, 102.5, 101.9];
//! let series = ReturnSeries::from_prices(&closes);
//! let engine = EntropyEngine::new(EntropyConfig::default());
//! let report = engine.analyze("BTCUSDT", &series, None);
//! println!("{}", report);
//! ```

// ── Module declarations ──────────────────────────────────────────────────────
pub mod composite;
pub mod divergence;
pub mod engine_config;
pub mod entropy;
pub mod error;
pub mod multiscale;
pub mod series;
pub mod stats;
pub mod transfer;
pub mod types;

// ── Public surface ───────────────────────────────────────────────────────────
pub use composite::{
    ComparisonMetrics, CompositeReport, EntropyEngine, MarketRegime, RiskLevel,
};
pub use divergence::{conditional_entropy, cross_entropy, kl_divergence};
pub use engine_config::EntropyConfig;
pub use entropy::{
    approximate_entropy, fuzzy_entropy, permutation_entropy, portfolio_diversification,
    portfolio_entropy, portfolio_entropy_from_map, sample_entropy, shannon_entropy,
    spectral_entropy, MatchKernel, PortfolioDiversification, SpectralMethod,
};
pub use error::{EntropyError, EntropyOutcome};
pub use multiscale::{multiscale_entropy, MultiscaleBase, MultiscaleResult};
pub use series::{normalize_series, ReturnSeries};
pub use stats::RECOMMENDED_MAX_LEN;
pub use transfer::{
    influence_report, rolling_transfer_entropy, transfer_entropy, InfluenceDirection,
    InfluenceParams, InfluenceReport, RollingTransferEntropy, TransferParams,
    TE_NEGATIVE_TOLERANCE,
};
pub use types::{format_metric, EntropyResult, Metric};
