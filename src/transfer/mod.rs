// =============================================================================
// Transfer Entropy Engine
// =============================================================================
//
// Directional information flow between two series (Schreiber 2000). The
// estimator is usable on its own for pairwise causality checks and is re-run
// per window by the influence report builder.

pub mod estimator;
pub mod influence;

pub use estimator::{transfer_entropy, TransferParams, TE_NEGATIVE_TOLERANCE};
pub use influence::{
    influence_report, rolling_transfer_entropy, InfluenceDirection, InfluenceParams, InfluenceReport,
    RollingTransferEntropy,
};
