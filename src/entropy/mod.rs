// =============================================================================
// Base Entropy Calculators
// =============================================================================
//
// Pure, side-effect-free entropy estimators over a single series (or a single
// weight vector). Every public function returns an `EntropyOutcome` so callers
// are forced to handle insufficient-data and degenerate-distribution cases.

pub mod permutation;
pub mod portfolio;
pub mod regularity;
pub mod shannon;
pub mod spectral;

pub use permutation::permutation_entropy;
pub use portfolio::{
    portfolio_diversification, portfolio_entropy, portfolio_entropy_from_map,
    PortfolioDiversification,
};
pub use regularity::{
    approximate_entropy, default_tolerance, fuzzy_entropy, sample_entropy, MatchKernel,
};
pub use shannon::shannon_entropy;
pub use spectral::{spectral_entropy, SpectralMethod};
