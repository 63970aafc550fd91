//! Opportunity detection.
//!
//! Examines each market snapshot for a YES+NO price sum away from 1.0,
//! prices the round trip, and emits ranked opportunities. Detection is
//! pure per-market: one malformed snapshot is logged and skipped, never
//! aborting the scan.

use chrono::{Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{SignalsConfig, TradingConfig};
use crate::signals::{combined_boost, SignalBooster};
use crate::strategy::{ConfidenceScorer, ProfitConfig, ProfitEstimator};
use crate::types::{ArbKind, MarketSnapshot, Opportunity};

/// Capital below this isn't worth the fee load or the operational risk.
const REQUIRED_CAPITAL_FLOOR: f64 = 100.0;

/// Fraction of the thinner leg's book we're willing to consume.
const LIQUIDITY_USE_FRACTION: f64 = 0.5;

pub struct OpportunityDetector {
    trading: TradingConfig,
    profit: ProfitEstimator,
    confidence: ConfidenceScorer,
    boosters: Vec<Box<dyn SignalBooster>>,
    max_total_boost: f64,
}

impl OpportunityDetector {
    pub fn new(
        trading: TradingConfig,
        boosters: Vec<Box<dyn SignalBooster>>,
        signals: &SignalsConfig,
    ) -> Self {
        let profit = ProfitEstimator::new(ProfitConfig {
            fee_rate_per_leg: trading.fee_rate_per_leg,
            base_slippage_rate: trading.base_slippage_rate,
            position_ratio_factor: trading.position_ratio_slippage_factor,
            slippage_tolerance: trading.slippage_tolerance,
        });
        let boosters = if signals.enabled { boosters } else { Vec::new() };
        Self {
            trading,
            profit,
            confidence: ConfidenceScorer::new(),
            boosters,
            max_total_boost: signals.max_total_boost,
        }
    }

    /// Scan all snapshots, returning opportunities sorted by confidence
    /// descending.
    pub fn scan(&self, snapshots: &[MarketSnapshot]) -> Vec<Opportunity> {
        let mut opportunities: Vec<Opportunity> =
            snapshots.iter().filter_map(|s| self.analyze(s)).collect();

        opportunities.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        opportunities
    }

    /// Analyze one snapshot. None means "no actionable opportunity", for
    /// any reason from malformed data to insufficient profit.
    pub fn analyze(&self, snapshot: &MarketSnapshot) -> Option<Opportunity> {
        if !snapshot.prices_valid() {
            warn!(
                event_id = %snapshot.event_id,
                yes = snapshot.yes.price,
                no = snapshot.no.price,
                "Skipping snapshot with out-of-range prices"
            );
            return None;
        }
        if snapshot.yes.token_id.is_empty() || snapshot.no.token_id.is_empty() {
            debug!(event_id = %snapshot.event_id, "Skipping snapshot without token ids");
            return None;
        }

        let spread = snapshot.spread();
        if spread < self.trading.min_discrepancy {
            return None;
        }

        let combined_liquidity = snapshot.yes.liquidity + snapshot.no.liquidity;
        if combined_liquidity < self.trading.min_liquidity {
            debug!(
                event_id = %snapshot.event_id,
                combined_liquidity,
                "Skipping thin market"
            );
            return None;
        }

        let min_liquidity = snapshot.min_liquidity();
        let required_capital =
            (LIQUIDITY_USE_FRACTION * min_liquidity).min(self.trading.max_position_size);
        if required_capital < REQUIRED_CAPITAL_FLOOR {
            return None;
        }

        let estimate = match self.profit.estimate(spread, required_capital, min_liquidity) {
            Ok(e) => e,
            Err(e) => {
                debug!(event_id = %snapshot.event_id, error = %e, "Profit estimation failed");
                return None;
            }
        };
        if estimate.net_profit_pct < self.trading.min_profit_threshold {
            return None;
        }

        // Venues without a resolution time score the neutral band.
        let time_to_expiry = snapshot.time_to_expiry(Utc::now());
        let base_confidence = self.confidence.score(
            spread,
            snapshot.yes.liquidity,
            snapshot.no.liquidity,
            time_to_expiry,
        );
        let boost = combined_boost(&self.boosters, &snapshot.event_title, self.max_total_boost);
        let confidence = (base_confidence + boost).clamp(0.0, 1.0);

        let now = Utc::now();
        let opportunity = Opportunity {
            id: Uuid::new_v4().to_string(),
            event_id: snapshot.event_id.clone(),
            event_title: snapshot.event_title.clone(),
            yes_token_id: snapshot.yes.token_id.clone(),
            yes_price: snapshot.yes.price,
            yes_liquidity: snapshot.yes.liquidity,
            no_token_id: snapshot.no.token_id.clone(),
            no_price: snapshot.no.price,
            no_liquidity: snapshot.no.liquidity,
            price_sum: snapshot.price_sum(),
            spread,
            kind: ArbKind::from_price_sum(snapshot.price_sum()),
            gross_profit_pct: estimate.gross_profit_pct,
            gross_profit_usd: estimate.gross_profit_usd,
            estimated_fees: estimate.fees_usd,
            estimated_slippage: estimate.slippage_usd,
            net_profit_pct: estimate.net_profit_pct,
            net_profit_usd: estimate.net_profit_usd,
            confidence,
            required_capital,
            detected_at: now,
            valid_until: now + Duration::seconds(self.trading.opportunity_ttl_secs),
        };

        debug!(opportunity = %opportunity, "Opportunity detected");
        Some(opportunity)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
