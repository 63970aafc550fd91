//! Net profit estimation for a candidate arbitrage.
//!
//! Starts from the gross spread and subtracts trading fees and a
//! position-size-aware slippage estimate. All figures are computed for a
//! given capital amount so the detector can evaluate real position sizes
//! rather than notional percentages.

use tracing::debug;

use crate::types::ArbError;

/// Cost-model parameters. Mirrors the exchange's published maker/taker
/// schedule plus an empirical slippage curve.
#[derive(Debug, Clone)]
pub struct ProfitConfig {
    /// Fee rate charged per leg, paid twice (maker + taker).
    pub fee_rate_per_leg: f64,
    /// Slippage floor that applies regardless of size.
    pub base_slippage_rate: f64,
    /// Extra slippage per unit of capital / liquidity ratio.
    pub position_ratio_factor: f64,
    /// Ceiling on the total slippage rate.
    pub slippage_tolerance: f64,
}

impl Default for ProfitConfig {
    fn default() -> Self {
        Self {
            fee_rate_per_leg: 0.002,
            base_slippage_rate: 0.001,
            position_ratio_factor: 0.005,
            slippage_tolerance: 0.01,
        }
    }
}

/// Full cost breakdown for one candidate position.
#[derive(Debug, Clone, Copy)]
pub struct ProfitEstimate {
    pub gross_profit_pct: f64,
    pub gross_profit_usd: f64,
    pub fees_usd: f64,
    pub slippage_usd: f64,
    pub net_profit_pct: f64,
    pub net_profit_usd: f64,
}

pub struct ProfitEstimator {
    config: ProfitConfig,
}

impl ProfitEstimator {
    pub fn new(config: ProfitConfig) -> Self {
        Self { config }
    }

    /// Estimate net profit for deploying `capital` against a mispricing of
    /// `spread`, where `min_liquidity` is the thinner leg's depth.
    ///
    /// Both legs pay maker and taker fees, so the total fee load is
    /// fee_rate × 2 sides × 2 legs.
    pub fn estimate(
        &self,
        spread: f64,
        capital: f64,
        min_liquidity: f64,
    ) -> Result<ProfitEstimate, ArbError> {
        if capital <= 0.0 {
            return Err(ArbError::InvalidInput(format!(
                "capital must be positive, got {capital}"
            )));
        }
        if spread < 0.0 {
            return Err(ArbError::InvalidInput(format!(
                "spread cannot be negative, got {spread}"
            )));
        }
        if min_liquidity <= 0.0 {
            return Err(ArbError::InsufficientLiquidity {
                required: capital,
                available: min_liquidity.max(0.0),
            });
        }

        let gross_usd = capital * spread;
        let fees_usd = capital * self.config.fee_rate_per_leg * 2.0 * 2.0;

        let slippage_rate = (self.config.base_slippage_rate
            + self.config.position_ratio_factor * (capital / min_liquidity))
            .min(self.config.slippage_tolerance);
        let slippage_usd = capital * slippage_rate;

        let net_usd = gross_usd - fees_usd - slippage_usd;

        let estimate = ProfitEstimate {
            gross_profit_pct: spread,
            gross_profit_usd: gross_usd,
            fees_usd,
            slippage_usd,
            net_profit_pct: net_usd / capital,
            net_profit_usd: net_usd,
        };

        debug!(
            gross = format!("${:.2}", gross_usd),
            fees = format!("${:.2}", fees_usd),
            slippage = format!("${:.2}", slippage_usd),
            net = format!("${:.2}", net_usd),
            "Profit estimated"
        );

        Ok(estimate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
