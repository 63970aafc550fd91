//! Strategy layer — profit estimation, confidence scoring, Kelly sizing,
//! and the pre-trade risk gate.
//!
//! Everything here is a pure or ledger-reading calculator; orchestration
//! across a scan cycle lives in the engine module.

pub mod confidence;
pub mod kelly;
pub mod profit;
pub mod risk;

pub use confidence::ConfidenceScorer;
pub use kelly::{KellyConfig, KellySizer};
pub use profit::{ProfitConfig, ProfitEstimate, ProfitEstimator};
pub use risk::{RiskGate, RiskLimits};
