//! Per-cycle orchestration.
//!
//! One cycle: fetch snapshots → detect → for each opportunity, risk-gate,
//! size, execute, persist. The gate is re-checked before every
//! opportunity so positions opened earlier in the same cycle count; a
//! blocked gate halts the cycle remainder without touching anything
//! already in flight.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::engine::detector::OpportunityDetector;
use crate::engine::executor::ExecutionCoordinator;
use crate::gateway::MarketDataSource;
use crate::storage::Ledger;
use crate::strategy::{KellySizer, RiskGate};
use crate::types::ArbError;

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// What one scan cycle accomplished. Logged after every cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub markets_scanned: usize,
    pub opportunities_found: usize,
    pub trades_executed: usize,
    pub trades_failed: usize,
    /// Sizing said zero, or the opportunity expired before execution.
    pub skipped: usize,
    /// Realized P&L from matched fills this cycle.
    pub realized_pnl: f64,
    /// Set when the risk gate stopped the cycle early.
    pub halted: Option<String>,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} markets, {} opportunities, {} executed, {} failed, {} skipped, P&L ${:.2}{}",
            self.markets_scanned,
            self.opportunities_found,
            self.trades_executed,
            self.trades_failed,
            self.skipped,
            self.realized_pnl,
            match &self.halted {
                Some(reason) => format!(" [HALTED: {reason}]"),
                None => String::new(),
            }
        )
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    data: Arc<dyn MarketDataSource>,
    detector: OpportunityDetector,
    gate: RiskGate,
    sizer: KellySizer,
    coordinator: ExecutionCoordinator,
    ledger: Arc<dyn Ledger>,
    bankroll: f64,
    max_position_size: f64,
    slippage_tolerance: f64,
}

impl Engine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data: Arc<dyn MarketDataSource>,
        detector: OpportunityDetector,
        gate: RiskGate,
        sizer: KellySizer,
        coordinator: ExecutionCoordinator,
        ledger: Arc<dyn Ledger>,
        bankroll: f64,
        max_position_size: f64,
        slippage_tolerance: f64,
    ) -> Self {
        Self {
            data,
            detector,
            gate,
            sizer,
            coordinator,
            ledger,
            bankroll,
            max_position_size,
            slippage_tolerance,
        }
    }

    /// Run one full scan cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        let snapshots = self
            .data
            .snapshots()
            .await
            .context("Market snapshot fetch failed")?;
        report.markets_scanned = snapshots.len();

        let opportunities = self.detector.scan(&snapshots);
        report.opportunities_found = opportunities.len();

        if opportunities.is_empty() {
            debug!(markets = report.markets_scanned, "No opportunities this cycle");
            return Ok(report);
        }

        for opportunity in &opportunities {
            // Fail-closed: one tripped limit skips everything that follows.
            let status = self.gate.check(self.ledger.as_ref()).await?;
            if !status.can_trade() {
                let reason = ArbError::RiskLimitExceeded(format!("{status}")).to_string();
                warn!(%status, "Halting cycle remainder");
                report.halted = Some(reason);
                break;
            }

            if !opportunity.is_valid_at(Utc::now()) {
                debug!(opportunity_id = %opportunity.id, "Opportunity expired before execution");
                report.skipped += 1;
                continue;
            }

            let decision = match self.size_opportunity(opportunity) {
                Ok(d) => d,
                Err(e) => {
                    warn!(opportunity_id = %opportunity.id, error = %e, "Sizing failed");
                    report.skipped += 1;
                    continue;
                }
            };
            if decision.is_skip() {
                debug!(opportunity_id = %opportunity.id, "Kelly says no bet");
                report.skipped += 1;
                continue;
            }

            info!(
                opportunity = %opportunity,
                sizing = %decision,
                "Executing opportunity"
            );
            match self.coordinator.execute(opportunity, decision.amount_usd).await {
                Ok(result) => {
                    if result.success {
                        report.trades_executed += 1;
                    } else {
                        report.trades_failed += 1;
                    }
                    report.realized_pnl += result.actual_profit_usd;
                    self.ledger
                        .save_execution(&result, opportunity)
                        .await
                        .context("Failed to persist execution record")?;
                }
                Err(e) => {
                    // Pre-flight rejection: nothing was submitted.
                    warn!(opportunity_id = %opportunity.id, error = %e, "Execution rejected");
                    report.trades_failed += 1;
                }
            }
        }

        info!(report = %report, "Cycle complete");
        Ok(report)
    }

    /// Fractional-Kelly sizing with the fill probability as the win
    /// probability and the net profit ratio as the odds.
    fn size_opportunity(
        &self,
        opportunity: &crate::types::Opportunity,
    ) -> Result<crate::types::SizingDecision, ArbError> {
        let win_probability = self.sizer.execution_probability(
            opportunity.min_liquidity(),
            opportunity.required_capital,
            opportunity.confidence,
            self.slippage_tolerance,
        );
        let fraction = self.sizer.fraction(win_probability, opportunity.net_profit_pct)?;
        let hard_cap = opportunity.required_capital.min(self.max_position_size);
        Ok(self.sizer.size(fraction, self.bankroll, hard_cap))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
