//! Two-leg execution coordinator.
//!
//! Pre-flight checks return tagged errors before any order leaves the
//! building; once both legs are launched, the outcome is always an
//! `ExecutionResult`, however ugly. Both legs go out together and are
//! awaited jointly, each under its own timeout, so one slow or failing
//! leg never blocks the other. No retries: a failed arbitrage is
//! recorded and left for external hedge/cancel handling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ExecutionConfig;
use crate::gateway::{MarketDataSource, OrderGateway};
use crate::types::{
    ArbError, ArbKind, ExecutionResult, LegFill, LegStatus, Opportunity, Side,
};

pub struct ExecutionCoordinator {
    data: Arc<dyn MarketDataSource>,
    gateway: Arc<dyn OrderGateway>,
    config: ExecutionConfig,
    /// Max relative price move between detection and execution.
    slippage_tolerance: f64,
}

impl ExecutionCoordinator {
    pub fn new(
        data: Arc<dyn MarketDataSource>,
        gateway: Arc<dyn OrderGateway>,
        config: ExecutionConfig,
        slippage_tolerance: f64,
    ) -> Self {
        Self {
            data,
            gateway,
            config,
            slippage_tolerance,
        }
    }

    /// Execute one opportunity with `size` dollars of capital.
    ///
    /// Errors mean nothing was submitted. An `Ok` result means both legs
    /// were launched and describes exactly what happened to each.
    pub async fn execute(
        &self,
        opportunity: &Opportunity,
        size: f64,
    ) -> Result<ExecutionResult, ArbError> {
        self.preflight(opportunity, size).await?;

        let side = opportunity.kind.leg_side();
        // Equal share counts on both legs keep the hedge exact.
        let shares = size / opportunity.price_sum;
        let leg_deadline = Duration::from_secs(self.config.order_timeout_secs);

        info!(
            opportunity_id = %opportunity.id,
            kind = %opportunity.kind,
            side = %side,
            size = format!("${size:.2}"),
            shares = format!("{shares:.2}"),
            "Launching both legs"
        );

        let started = Instant::now();
        let (yes_outcome, no_outcome) = tokio::join!(
            timeout(
                leg_deadline,
                self.gateway
                    .submit_order(&opportunity.yes_token_id, side, opportunity.yes_price, shares),
            ),
            timeout(
                leg_deadline,
                self.gateway
                    .submit_order(&opportunity.no_token_id, side, opportunity.no_price, shares),
            ),
        );
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        let (yes, yes_error) = self.classify_leg("YES", yes_outcome, shares);
        let (no, no_error) = self.classify_leg("NO", no_outcome, shares);

        let success = yes.status == LegStatus::Filled && no.status == LegStatus::Filled;
        let partial_fill_risk =
            (yes.status == LegStatus::Filled) != (no.status == LegStatus::Filled);

        let (capital_used, actual_profit_usd) = self.reconcile(opportunity.kind, side, &yes, &no);
        let actual_profit_pct = if capital_used > 0.0 {
            actual_profit_usd / capital_used
        } else {
            0.0
        };

        let result = ExecutionResult {
            opportunity_id: opportunity.id.clone(),
            success,
            yes,
            no,
            capital_used,
            actual_profit_usd,
            actual_profit_pct,
            duration_ms,
            error: yes_error.or(no_error),
            partial_fill_risk,
            executed_at: Utc::now(),
        };

        if partial_fill_risk {
            warn!(result = %result, "One leg filled without the other — unhedged exposure");
        } else {
            info!(result = %result, "Execution complete");
        }

        Ok(result)
    }

    /// All the reasons not to send any order at all.
    async fn preflight(&self, opportunity: &Opportunity, size: f64) -> Result<(), ArbError> {
        if size <= 0.0 || !size.is_finite() {
            return Err(ArbError::InvalidInput(format!(
                "position size must be positive, got {size}"
            )));
        }
        if size > opportunity.required_capital {
            return Err(ArbError::InvalidInput(format!(
                "size ${size:.2} exceeds opportunity capital ${:.2}",
                opportunity.required_capital
            )));
        }

        let safe_depth = 0.5 * opportunity.min_liquidity();
        if size > safe_depth {
            return Err(ArbError::InsufficientLiquidity {
                required: size,
                available: safe_depth,
            });
        }

        self.recheck_prices(opportunity).await
    }

    /// Re-quote both legs and reject if either moved past tolerance.
    async fn recheck_prices(&self, opportunity: &Opportunity) -> Result<(), ArbError> {
        let tokens = vec![
            opportunity.yes_token_id.clone(),
            opportunity.no_token_id.clone(),
        ];
        let deadline = Duration::from_secs(self.config.price_check_timeout_secs);

        let quotes = match timeout(deadline, self.data.prices(&tokens)).await {
            Ok(Ok(q)) => q,
            Ok(Err(e)) => {
                return Err(ArbError::ExecutionFailed(format!(
                    "price re-check failed: {e}"
                )))
            }
            Err(_) => {
                return Err(ArbError::PriceStale {
                    leg: "BOTH",
                    quoted: opportunity.price_sum,
                    current: 0.0,
                    moved_pct: 100.0,
                    tolerance_pct: self.slippage_tolerance * 100.0,
                })
            }
        };

        for (leg, token, quoted) in [
            ("YES", &opportunity.yes_token_id, opportunity.yes_price),
            ("NO", &opportunity.no_token_id, opportunity.no_price),
        ] {
            let Some(&current) = quotes.get(token) else {
                return Err(ArbError::PriceStale {
                    leg,
                    quoted,
                    current: 0.0,
                    moved_pct: 100.0,
                    tolerance_pct: self.slippage_tolerance * 100.0,
                });
            };
            let moved = (current - quoted).abs() / quoted;
            if moved > self.slippage_tolerance {
                return Err(ArbError::PriceStale {
                    leg,
                    quoted,
                    current,
                    moved_pct: moved * 100.0,
                    tolerance_pct: self.slippage_tolerance * 100.0,
                });
            }
        }
        Ok(())
    }

    /// Turn one leg's raw outcome into a fill classified against the
    /// requested size. Timeouts and gateway errors become Failed legs.
    fn classify_leg(
        &self,
        leg: &str,
        outcome: Result<anyhow::Result<LegFill>, tokio::time::error::Elapsed>,
        requested: f64,
    ) -> (LegFill, Option<String>) {
        let fill = match outcome {
            Ok(Ok(fill)) => fill,
            Ok(Err(e)) => {
                warn!(leg, error = %e, "Leg submission failed");
                return (LegFill::failed(), Some(format!("{leg} leg failed: {e}")));
            }
            Err(_) => {
                warn!(leg, timeout_secs = self.config.order_timeout_secs, "Leg timed out");
                return (LegFill::failed(), Some(format!("{leg} leg timed out")));
            }
        };

        let ratio = if requested > 0.0 {
            fill.filled_size / requested
        } else {
            0.0
        };
        let status = if ratio >= self.config.fill_ratio_threshold {
            LegStatus::Filled
        } else if fill.filled_size > 0.0 {
            LegStatus::Partial
        } else {
            LegStatus::Pending
        };

        debug!(leg, filled = fill.filled_size, requested, %status, "Leg classified");
        (
            LegFill {
                filled_size: fill.filled_size,
                avg_price: fill.avg_price,
                status,
            },
            None,
        )
    }

    /// Capital consumed and profit realized on the hedged (matched)
    /// portion of the fills. An unmatched remainder earns nothing here;
    /// it sits on the book as exposure.
    fn reconcile(&self, kind: ArbKind, side: Side, yes: &LegFill, no: &LegFill) -> (f64, f64) {
        let capital_used = match side {
            // Buying costs what filled at the achieved prices.
            Side::Buy => yes.filled_size * yes.avg_price + no.filled_size * no.avg_price,
            // Selling posts $1 collateral per share on the larger leg.
            Side::Sell => yes.filled_size.max(no.filled_size),
        };

        let matched = yes.filled_size.min(no.filled_size);
        if matched <= 0.0 {
            return (capital_used, 0.0);
        }

        let sum_achieved = yes.avg_price + no.avg_price;
        let profit = match kind {
            ArbKind::Overpriced => matched * (sum_achieved - 1.0),
            ArbKind::Underpriced => matched * (1.0 - sum_achieved),
        };
        (capital_used, profit)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
