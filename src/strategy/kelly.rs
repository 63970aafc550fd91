//! Kelly criterion position sizing.
//!
//! Computes the bankroll fraction for a near-sure arbitrage using
//! fractional Kelly with a hard cap, plus an execution probability
//! estimate used as the Kelly win probability upstream.

use tracing::debug;

use crate::types::{ArbError, SizingDecision};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Kelly sizing configuration.
#[derive(Debug, Clone)]
pub struct KellyConfig {
    /// Ceiling on the raw Kelly fraction before the conservative factor.
    pub max_fraction: f64,
    /// Fractional-Kelly multiplier applied after capping. Lower = more
    /// conservative.
    pub conservative_factor: f64,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            max_fraction: 0.25,      // Quarter-Kelly ceiling
            conservative_factor: 0.5, // Halve again on top of the cap
        }
    }
}

// ---------------------------------------------------------------------------
// Kelly sizer
// ---------------------------------------------------------------------------

pub struct KellySizer {
    config: KellyConfig,
}

impl KellySizer {
    pub fn new(config: KellyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KellyConfig {
        &self.config
    }

    /// Kelly fraction f* = (b·p − q) / b for win probability `p` and net
    /// odds `b`, capped then scaled by the conservative factor.
    ///
    /// For arbitrage the "win" is both legs filling and `b` is the small
    /// net profit ratio; the formula is applied with the full stake as the
    /// loss side even though a failed arb rarely loses the whole stake.
    /// That asymmetry makes the sizing deliberately pessimistic.
    ///
    /// A negative raw fraction means the odds don't justify any bet: that
    /// is a valid zero, not an error.
    pub fn fraction(&self, win_probability: f64, net_odds: f64) -> Result<f64, ArbError> {
        if !(0.0..=1.0).contains(&win_probability) || !win_probability.is_finite() {
            return Err(ArbError::InvalidInput(format!(
                "win probability must be in [0, 1], got {win_probability}"
            )));
        }
        if net_odds <= 0.0 || !net_odds.is_finite() {
            return Err(ArbError::InvalidInput(format!(
                "net odds must be positive, got {net_odds}"
            )));
        }

        if win_probability == 0.0 {
            return Ok(0.0);
        }
        if win_probability == 1.0 {
            // Certain win: cap applies directly, no formula needed.
            return Ok(self.config.max_fraction * self.config.conservative_factor);
        }

        let lose_probability = 1.0 - win_probability;
        let raw = (net_odds * win_probability - lose_probability) / net_odds;

        if raw <= 0.0 {
            debug!(kelly = raw, "Negative Kelly — no bet");
            return Ok(0.0);
        }

        // Cap first, then scale down.
        let capped = raw.clamp(0.0, self.config.max_fraction);
        Ok(capped * self.config.conservative_factor)
    }

    /// Turn a bankroll fraction into a dollar amount, bounded by the
    /// per-position hard cap and floored at zero.
    pub fn size(&self, fraction: f64, bankroll: f64, hard_cap: f64) -> SizingDecision {
        let amount = (fraction * bankroll).min(hard_cap).max(0.0);
        SizingDecision {
            fraction,
            amount_usd: amount,
        }
    }

    /// Probability that both legs execute cleanly, used as the Kelly win
    /// probability. Weighted geometric mean of a banded liquidity factor,
    /// the opportunity confidence, and a slippage headroom factor.
    pub fn execution_probability(
        &self,
        min_liquidity: f64,
        required_size: f64,
        confidence: f64,
        slippage_tolerance: f64,
    ) -> f64 {
        if min_liquidity <= 0.0 || required_size <= 0.0 {
            return 0.0;
        }

        let ratio = required_size / min_liquidity;
        let liquidity_factor: f64 = if ratio > 0.5 {
            0.3
        } else if ratio > 0.3 {
            0.6
        } else if ratio > 0.1 {
            0.8
        } else {
            0.95
        };

        let confidence_factor = confidence.clamp(0.0, 1.0);
        let slippage_factor = (1.0 - 2.0 * slippage_tolerance).clamp(0.7, 1.0);

        liquidity_factor.powf(0.4) * confidence_factor.powf(0.4) * slippage_factor.powf(0.2)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
