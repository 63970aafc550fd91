//! Pre-trade risk gate.
//!
//! Reads the ledger's risk counters and answers go/no-go before each
//! opportunity. Fail-closed: any tripped limit blocks the rest of the
//! cycle, while in-flight orders are left alone.

use anyhow::Result;
use tracing::warn;

use crate::storage::Ledger;
use crate::types::RiskStatus;

/// Hard limits the gate enforces.
#[derive(Debug, Clone)]
pub struct RiskLimits {
    /// Maximum realized loss per UTC day before trading halts.
    pub max_daily_loss: f64,
    /// Maximum unresolved positions on the book.
    pub max_open_positions: usize,
    /// Total bankroll; capital at risk must stay strictly below it.
    pub bankroll: f64,
}

pub struct RiskGate {
    limits: RiskLimits,
}

impl RiskGate {
    pub fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Evaluate all limits against the ledger's current counters.
    ///
    /// Positions opened earlier in the same cycle are already in the
    /// ledger, so sequential checks within a cycle see each other.
    pub async fn check(&self, ledger: &dyn Ledger) -> Result<RiskStatus> {
        let daily_loss = ledger.daily_loss().await?;
        let open_positions = ledger.open_position_count().await?;
        let capital_at_risk = ledger.capital_at_risk().await?;

        let status = RiskStatus {
            daily_loss_ok: daily_loss.abs() < self.limits.max_daily_loss,
            position_count_ok: open_positions < self.limits.max_open_positions,
            capital_available: capital_at_risk < self.limits.bankroll,
        };

        if !status.can_trade() {
            warn!(
                daily_loss = format!("${daily_loss:.2}"),
                open_positions,
                capital_at_risk = format!("${capital_at_risk:.2}"),
                status = %status,
                "Risk gate blocked trading"
            );
        }

        Ok(status)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
