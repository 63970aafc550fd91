//! Shared fixtures for integration tests.
//!
//! Builds fully-wired engines on top of the in-crate paper venue, plus
//! market snapshots with known arbitrage characteristics.

use std::sync::Arc;

use chrono::Utc;

use arbiter::config::{ExecutionConfig, SignalsConfig, TradingConfig};
use arbiter::engine::{Engine, ExecutionCoordinator, OpportunityDetector};
use arbiter::gateway::paper::PaperGateway;
use arbiter::storage::Ledger;
use arbiter::strategy::{KellyConfig, KellySizer, RiskGate, RiskLimits};
use arbiter::types::{
    ArbKind, ExecutionResult, LegFill, LegStatus, MarketSnapshot, Opportunity, OutcomeQuote,
};

pub const BANKROLL: f64 = 10_000.0;

pub fn market(
    event_id: &str,
    title: &str,
    yes_price: f64,
    no_price: f64,
    per_leg_liquidity: f64,
) -> MarketSnapshot {
    MarketSnapshot {
        event_id: event_id.to_string(),
        event_title: title.to_string(),
        yes: OutcomeQuote {
            token_id: format!("{event_id}-yes"),
            price: yes_price,
            liquidity: per_leg_liquidity,
        },
        no: OutcomeQuote {
            token_id: format!("{event_id}-no"),
            price: no_price,
            liquidity: per_leg_liquidity,
        },
        observed_at: Utc::now(),
        expires_at: None,
    }
}

/// Deep book, 7% overpriced: survives every filter and Kelly's pessimism.
pub fn deep_arb() -> MarketSnapshot {
    market("deep", "Will BTC close above $100k on Friday?", 0.55, 0.52, 60_000.0)
}

/// Priced exactly at 1.0: nothing to do.
pub fn efficient() -> MarketSnapshot {
    market("flat", "Will it rain in Paris tomorrow?", 0.60, 0.40, 60_000.0)
}

/// Wire up a full engine against one paper venue and one ledger.
pub fn build_engine(venue: Arc<PaperGateway>, ledger: Arc<dyn Ledger>) -> Engine {
    let trading = TradingConfig::default();
    let detector = OpportunityDetector::new(trading.clone(), Vec::new(), &SignalsConfig::default());
    let coordinator = ExecutionCoordinator::new(
        venue.clone(),
        venue.clone(),
        ExecutionConfig::default(),
        trading.slippage_tolerance,
    );
    Engine::new(
        venue,
        detector,
        RiskGate::new(RiskLimits {
            max_daily_loss: 100.0,
            max_open_positions: 10,
            bankroll: BANKROLL,
        }),
        KellySizer::new(KellyConfig::default()),
        coordinator,
        ledger,
        BANKROLL,
        trading.max_position_size,
        trading.slippage_tolerance,
    )
}

/// Temp file path for a throwaway ledger.
pub fn temp_ledger_path() -> String {
    let mut p = std::env::temp_dir();
    p.push(format!("arbiter_itest_ledger_{}.json", uuid::Uuid::new_v4()));
    p.to_string_lossy().to_string()
}

/// An opportunity/result pair representing a realized loss, for seeding
/// ledger state without going through the engine.
pub fn losing_execution(loss_usd: f64) -> (Opportunity, ExecutionResult) {
    let now = Utc::now();
    let opportunity = Opportunity {
        id: "seed-opp".to_string(),
        event_id: "seed-evt".to_string(),
        event_title: "Seed event".to_string(),
        yes_token_id: "seed-yes".to_string(),
        yes_price: 0.55,
        yes_liquidity: 20_000.0,
        no_token_id: "seed-no".to_string(),
        no_price: 0.50,
        no_liquidity: 18_000.0,
        price_sum: 1.05,
        spread: 0.05,
        kind: ArbKind::Overpriced,
        gross_profit_pct: 0.05,
        gross_profit_usd: 50.0,
        estimated_fees: 8.0,
        estimated_slippage: 2.0,
        net_profit_pct: 0.04,
        net_profit_usd: 40.0,
        confidence: 0.85,
        required_capital: 1000.0,
        detected_at: now,
        valid_until: now + chrono::Duration::seconds(60),
    };
    let filled = LegFill {
        filled_size: 500.0,
        avg_price: 0.55,
        status: LegStatus::Filled,
    };
    let result = ExecutionResult {
        opportunity_id: "seed-opp".to_string(),
        success: true,
        yes: filled,
        no: LegFill {
            filled_size: 500.0,
            avg_price: 0.50,
            status: LegStatus::Filled,
        },
        capital_used: 500.0,
        actual_profit_usd: -loss_usd,
        actual_profit_pct: -loss_usd / 500.0,
        duration_ms: 100.0,
        error: None,
        partial_fill_risk: false,
        executed_at: now,
    };
    (opportunity, result)
}
