//! Composite confidence scoring for detected opportunities.
//!
//! Weighs four independent signals — spread size, market depth, liquidity
//! balance between legs, and time to expiry — into a single [0, 1] score.
//! Larger spreads are both more profitable and more likely to be real
//! mispricings rather than noise, hence the dominant weight.

use chrono::Duration;

// Component weights. Must sum to 1.0.
const WEIGHT_SPREAD: f64 = 0.4;
const WEIGHT_LIQUIDITY: f64 = 0.3;
const WEIGHT_BALANCE: f64 = 0.2;
const WEIGHT_TIME: f64 = 0.1;

// Spread bands: below MIN the signal is noise, above FULL it saturates.
const SPREAD_MIN: f64 = 0.03;
const SPREAD_FULL: f64 = 0.05;

// Liquidity bands in USDC on the thinner leg.
const LIQUIDITY_LOW: f64 = 10_000.0;
const LIQUIDITY_FULL: f64 = 50_000.0;

/// Score when expiry is unknown — neutral-ish rather than punitive,
/// since most feeds omit expiry for long-dated markets.
const TIME_UNKNOWN_SCORE: f64 = 0.7;

pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Composite confidence for an opportunity. Always in [0, 1].
    pub fn score(
        &self,
        spread: f64,
        yes_liquidity: f64,
        no_liquidity: f64,
        time_to_expiry: Option<Duration>,
    ) -> f64 {
        let composite = WEIGHT_SPREAD * self.spread_score(spread)
            + WEIGHT_LIQUIDITY * self.liquidity_score(yes_liquidity.min(no_liquidity))
            + WEIGHT_BALANCE * self.balance_score(yes_liquidity, no_liquidity)
            + WEIGHT_TIME * self.time_score(time_to_expiry);
        composite.clamp(0.0, 1.0)
    }

    /// ≥5% → 1.0; 3–5% linear from 0.3; below 3% → 0.0.
    fn spread_score(&self, spread: f64) -> f64 {
        if spread >= SPREAD_FULL {
            1.0
        } else if spread >= SPREAD_MIN {
            let t = (spread - SPREAD_MIN) / (SPREAD_FULL - SPREAD_MIN);
            0.3 + 0.7 * t
        } else {
            0.0
        }
    }

    /// ≥$50k → 1.0; $10–50k linear from 0.6; below $10k linear 0.3→0.6.
    fn liquidity_score(&self, min_liquidity: f64) -> f64 {
        if min_liquidity >= LIQUIDITY_FULL {
            1.0
        } else if min_liquidity >= LIQUIDITY_LOW {
            let t = (min_liquidity - LIQUIDITY_LOW) / (LIQUIDITY_FULL - LIQUIDITY_LOW);
            0.6 + 0.4 * t
        } else {
            let t = (min_liquidity / LIQUIDITY_LOW).max(0.0);
            0.3 + 0.3 * t
        }
    }

    /// 1 − |liqYes − liqNo| / (liqYes + liqNo). Balanced books fill both
    /// legs more reliably. Zero total depth → 0.
    fn balance_score(&self, yes_liquidity: f64, no_liquidity: f64) -> f64 {
        let total = yes_liquidity + no_liquidity;
        if total <= 0.0 {
            return 0.0;
        }
        1.0 - (yes_liquidity - no_liquidity).abs() / total
    }

    /// ≥24h → 1.0; 1–24h linear from 0.4; <1h → 0.2 (settlement churn).
    fn time_score(&self, time_to_expiry: Option<Duration>) -> f64 {
        let Some(remaining) = time_to_expiry else {
            return TIME_UNKNOWN_SCORE;
        };
        let hours = remaining.num_minutes() as f64 / 60.0;
        if hours >= 24.0 {
            1.0
        } else if hours >= 1.0 {
            let t = (hours - 1.0) / 23.0;
            0.4 + 0.6 * t
        } else {
            0.2
        }
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
