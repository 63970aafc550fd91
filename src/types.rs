//! Shared types for the ARBITER engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that gateway, strategy,
//! and engine modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Market snapshot
// ---------------------------------------------------------------------------

/// A single tradable outcome (one leg) of a binary market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeQuote {
    /// CLOB token id for this outcome.
    pub token_id: String,
    /// Current price (0.0–1.0).
    pub price: f64,
    /// Available liquidity in USDC.
    pub liquidity: f64,
}

impl fmt::Display for OutcomeQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}¢ (liq ${:.0})",
            self.price * 100.0,
            self.liquidity,
        )
    }
}

/// A point-in-time observation of a two-outcome market.
///
/// Ephemeral: produced once per scan cycle and discarded afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub event_id: String,
    pub event_title: String,
    pub yes: OutcomeQuote,
    pub no: OutcomeQuote,
    /// When this snapshot was observed.
    pub observed_at: DateTime<Utc>,
    /// Market resolution time, when the venue reports one.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Display for MarketSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (YES: {} | NO: {} | sum: {:.3})",
            self.event_title,
            self.yes,
            self.no,
            self.price_sum(),
        )
    }
}

impl MarketSnapshot {
    /// Sum of both outcome prices. Should be 1.0 in an efficient market.
    pub fn price_sum(&self) -> f64 {
        self.yes.price + self.no.price
    }

    /// Absolute deviation of the price sum from 1.0 — the arbitrage signal.
    pub fn spread(&self) -> f64 {
        (self.price_sum() - 1.0).abs()
    }

    /// Whether both outcome prices are in the open interval (0, 1).
    pub fn prices_valid(&self) -> bool {
        self.yes.price > 0.0
            && self.yes.price < 1.0
            && self.no.price > 0.0
            && self.no.price < 1.0
    }

    /// The thinner of the two legs' liquidity.
    pub fn min_liquidity(&self) -> f64 {
        self.yes.liquidity.min(self.no.liquidity)
    }

    /// Time remaining until resolution, if the venue reported one.
    pub fn time_to_expiry(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.expires_at.map(|e| e - now)
    }

    /// Helper to build a test snapshot with sensible defaults.
    #[cfg(test)]
    pub fn sample(yes_price: f64, no_price: f64) -> Self {
        MarketSnapshot {
            event_id: "evt-001".to_string(),
            event_title: "Will BTC close above $100k on Friday?".to_string(),
            yes: OutcomeQuote {
                token_id: "tok-yes".to_string(),
                price: yes_price,
                liquidity: 20_000.0,
            },
            no: OutcomeQuote {
                token_id: "tok-no".to_string(),
                price: no_price,
                liquidity: 18_000.0,
            },
            observed_at: Utc::now(),
            expires_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Order direction for a single leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Which direction the mispricing runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArbKind {
    /// YES + NO > 1.0 — sell both legs to collect the premium.
    Overpriced,
    /// YES + NO < 1.0 — buy both legs at the discount.
    Underpriced,
}

impl ArbKind {
    /// Classify a price sum. Sums of exactly 1.0 never reach this point
    /// because the spread filter rejects them first.
    pub fn from_price_sum(price_sum: f64) -> Self {
        if price_sum > 1.0 {
            ArbKind::Overpriced
        } else {
            ArbKind::Underpriced
        }
    }

    /// The order side used for both legs of this arbitrage.
    pub fn leg_side(&self) -> Side {
        match self {
            ArbKind::Overpriced => Side::Sell,
            ArbKind::Underpriced => Side::Buy,
        }
    }
}

impl fmt::Display for ArbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArbKind::Overpriced => write!(f, "OVERPRICED"),
            ArbKind::Underpriced => write!(f, "UNDERPRICED"),
        }
    }
}

/// State of a single leg's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegStatus {
    /// Order accepted but nothing filled yet.
    Pending,
    /// Filled at or above the 95% fill-ratio threshold.
    Filled,
    /// Partially filled below the threshold.
    Partial,
    /// Submission errored or timed out.
    Failed,
}

impl LegStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LegStatus::Pending)
    }
}

impl fmt::Display for LegStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegStatus::Pending => write!(f, "PENDING"),
            LegStatus::Filled => write!(f, "FILLED"),
            LegStatus::Partial => write!(f, "PARTIAL"),
            LegStatus::Failed => write!(f, "FAILED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Opportunity
// ---------------------------------------------------------------------------

/// A detected intra-market arbitrage opportunity.
///
/// Created per scan and either consumed immediately or discarded on
/// expiry. Prices are re-validated at execution time rather than trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub event_id: String,
    pub event_title: String,

    pub yes_token_id: String,
    pub yes_price: f64,
    pub yes_liquidity: f64,

    pub no_token_id: String,
    pub no_price: f64,
    pub no_liquidity: f64,

    /// yes_price + no_price.
    pub price_sum: f64,
    /// |price_sum - 1.0|.
    pub spread: f64,
    pub kind: ArbKind,

    pub gross_profit_pct: f64,
    pub gross_profit_usd: f64,
    pub estimated_fees: f64,
    pub estimated_slippage: f64,
    pub net_profit_pct: f64,
    pub net_profit_usd: f64,

    /// Composite reliability score (0–1).
    pub confidence: f64,
    /// Capital this opportunity needs, already capped by liquidity and the
    /// configured position limit.
    pub required_capital: f64,

    pub detected_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} | spread={:.2}% net={:.2}% (${:.2}) | conf={:.2} | cap=${:.0}",
            self.kind,
            self.event_title,
            self.spread * 100.0,
            self.net_profit_pct * 100.0,
            self.net_profit_usd,
            self.confidence,
            self.required_capital,
        )
    }
}

impl Opportunity {
    /// Whether the opportunity is still inside its validity window.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.detected_at && now <= self.valid_until
    }

    /// The thinner leg's liquidity.
    pub fn min_liquidity(&self) -> f64 {
        self.yes_liquidity.min(self.no_liquidity)
    }
}

// ---------------------------------------------------------------------------
// Sizing & risk
// ---------------------------------------------------------------------------

/// Output of the Kelly sizer for one opportunity. Derived per opportunity
/// and discarded after use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizingDecision {
    /// Bankroll fraction after caps and the conservative factor.
    pub fraction: f64,
    /// Final position size in USD.
    pub amount_usd: f64,
}

impl fmt::Display for SizingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}% → ${:.2}", self.fraction * 100.0, self.amount_usd)
    }
}

impl SizingDecision {
    /// A zero-size decision — "don't bet" is a valid, expected outcome.
    pub fn skip() -> Self {
        Self {
            fraction: 0.0,
            amount_usd: 0.0,
        }
    }

    pub fn is_skip(&self) -> bool {
        self.amount_usd <= 0.0
    }
}

/// Result of the pre-trade risk gate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskStatus {
    pub daily_loss_ok: bool,
    pub position_count_ok: bool,
    pub capital_available: bool,
}

impl RiskStatus {
    /// Overall go/no-go: all three sub-checks must pass. A method rather
    /// than a stored field so it can never disagree with the sub-checks.
    pub fn can_trade(&self) -> bool {
        self.daily_loss_ok && self.position_count_ok && self.capital_available
    }

    /// Human-readable list of which limits tripped.
    pub fn blocked_reasons(&self) -> Vec<&'static str> {
        let mut reasons = Vec::new();
        if !self.daily_loss_ok {
            reasons.push("daily loss limit exceeded");
        }
        if !self.position_count_ok {
            reasons.push("max open positions reached");
        }
        if !self.capital_available {
            reasons.push("insufficient capital");
        }
        reasons
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.can_trade() {
            write!(f, "OK")
        } else {
            write!(f, "BLOCKED ({})", self.blocked_reasons().join(", "))
        }
    }
}

// ---------------------------------------------------------------------------
// Execution types
// ---------------------------------------------------------------------------

/// What the order gateway reports for one submitted leg.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LegFill {
    pub filled_size: f64,
    pub avg_price: f64,
    pub status: LegStatus,
}

impl LegFill {
    pub fn failed() -> Self {
        Self {
            filled_size: 0.0,
            avg_price: 0.0,
            status: LegStatus::Failed,
        }
    }

    pub fn has_fills(&self) -> bool {
        self.filled_size > 0.0
    }
}

impl fmt::Display for LegFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.2} @ {:.2}¢",
            self.status,
            self.filled_size,
            self.avg_price * 100.0,
        )
    }
}

/// Outcome of executing one opportunity — handed to the ledger for
/// persistence; the engine keeps no state beyond the current cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub opportunity_id: String,
    /// True iff both legs reached FILLED.
    pub success: bool,

    pub yes: LegFill,
    pub no: LegFill,

    pub capital_used: f64,
    pub actual_profit_usd: f64,
    pub actual_profit_pct: f64,
    pub duration_ms: f64,

    pub error: Option<String>,
    /// True iff exactly one leg reached FILLED — the unhedged exposure
    /// state, surfaced for external hedge/cancel handling.
    pub partial_fill_risk: bool,

    pub executed_at: DateTime<Utc>,
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | YES: {} | NO: {} | P&L ${:.2} ({:.2}%) in {:.0}ms{}",
            if self.success { "SUCCESS" } else { "FAILED" },
            self.yes,
            self.no,
            self.actual_profit_usd,
            self.actual_profit_pct * 100.0,
            self.duration_ms,
            if self.partial_fill_risk {
                " [PARTIAL FILL RISK]"
            } else {
                ""
            },
        )
    }
}

impl ExecutionResult {
    pub fn both_legs_filled(&self) -> bool {
        self.yes.status == LegStatus::Filled && self.no.status == LegStatus::Filled
    }

    pub fn any_leg_failed(&self) -> bool {
        self.yes.status == LegStatus::Failed || self.no.status == LegStatus::Failed
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Tagged error kinds for the arbitrage core. Returned, never panicked:
/// callers must handle every case explicitly.
#[derive(Debug, thiserror::Error)]
pub enum ArbError {
    #[error("Insufficient liquidity: need ${required:.2}, safely tradable ${available:.2}")]
    InsufficientLiquidity { required: f64, available: f64 },

    #[error("Stale price on {leg} leg: {quoted:.4} -> {current:.4} (moved {moved_pct:.2}%, tolerance {tolerance_pct:.2}%)")]
    PriceStale {
        leg: &'static str,
        quoted: f64,
        current: f64,
        moved_pct: f64,
        tolerance_pct: f64,
    },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Risk limit exceeded: {0}")]
    RiskLimitExceeded(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Side / ArbKind tests --

    #[test]
    fn test_side_display() {
        assert_eq!(format!("{}", Side::Buy), "BUY");
        assert_eq!(format!("{}", Side::Sell), "SELL");
    }

    #[test]
    fn test_arb_kind_from_price_sum() {
        assert_eq!(ArbKind::from_price_sum(1.05), ArbKind::Overpriced);
        assert_eq!(ArbKind::from_price_sum(0.93), ArbKind::Underpriced);
    }

    #[test]
    fn test_arb_kind_leg_side() {
        assert_eq!(ArbKind::Overpriced.leg_side(), Side::Sell);
        assert_eq!(ArbKind::Underpriced.leg_side(), Side::Buy);
    }

    #[test]
    fn test_arb_kind_display() {
        assert_eq!(format!("{}", ArbKind::Overpriced), "OVERPRICED");
        assert_eq!(format!("{}", ArbKind::Underpriced), "UNDERPRICED");
    }

    #[test]
    fn test_arb_kind_serialization_roundtrip() {
        for kind in [ArbKind::Overpriced, ArbKind::Underpriced] {
            let json = serde_json::to_string(&kind).unwrap();
            let parsed: ArbKind = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, parsed);
        }
    }

    // -- LegStatus tests --

    #[test]
    fn test_leg_status_terminal() {
        assert!(!LegStatus::Pending.is_terminal());
        assert!(LegStatus::Filled.is_terminal());
        assert!(LegStatus::Partial.is_terminal());
        assert!(LegStatus::Failed.is_terminal());
    }

    #[test]
    fn test_leg_status_display() {
        assert_eq!(format!("{}", LegStatus::Filled), "FILLED");
        assert_eq!(format!("{}", LegStatus::Partial), "PARTIAL");
    }

    // -- MarketSnapshot tests --

    #[test]
    fn test_snapshot_spread_overpriced() {
        let snap = MarketSnapshot::sample(0.55, 0.50);
        assert!((snap.price_sum() - 1.05).abs() < 1e-10);
        assert!((snap.spread() - 0.05).abs() < 1e-10);
        assert_eq!(ArbKind::from_price_sum(snap.price_sum()), ArbKind::Overpriced);
    }

    #[test]
    fn test_snapshot_spread_underpriced() {
        let snap = MarketSnapshot::sample(0.45, 0.48);
        assert!((snap.spread() - 0.07).abs() < 1e-10);
        assert_eq!(ArbKind::from_price_sum(snap.price_sum()), ArbKind::Underpriced);
    }

    #[test]
    fn test_snapshot_prices_valid() {
        assert!(MarketSnapshot::sample(0.50, 0.49).prices_valid());
        assert!(!MarketSnapshot::sample(0.0, 0.50).prices_valid());
        assert!(!MarketSnapshot::sample(0.50, 1.0).prices_valid());
        assert!(!MarketSnapshot::sample(-0.1, 0.50).prices_valid());
    }

    #[test]
    fn test_snapshot_min_liquidity() {
        let snap = MarketSnapshot::sample(0.50, 0.49); // yes 20k, no 18k
        assert!((snap.min_liquidity() - 18_000.0).abs() < 1e-10);
    }

    #[test]
    fn test_snapshot_serialization_roundtrip() {
        let snap = MarketSnapshot::sample(0.55, 0.50);
        let json = serde_json::to_string(&snap).unwrap();
        let parsed: MarketSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_id, "evt-001");
        assert!((parsed.yes.price - 0.55).abs() < 1e-10);
    }

    // -- Opportunity tests --

    fn make_opportunity() -> Opportunity {
        let now = Utc::now();
        Opportunity {
            id: "opp-1".to_string(),
            event_id: "evt-001".to_string(),
            event_title: "Test event".to_string(),
            yes_token_id: "tok-yes".to_string(),
            yes_price: 0.55,
            yes_liquidity: 20_000.0,
            no_token_id: "tok-no".to_string(),
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
        }
    }

    #[test]
    fn test_opportunity_validity_window() {
        let opp = make_opportunity();
        assert!(opp.is_valid_at(Utc::now()));
        assert!(!opp.is_valid_at(opp.valid_until + chrono::Duration::seconds(1)));
        assert!(!opp.is_valid_at(opp.detected_at - chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_opportunity_min_liquidity() {
        assert!((make_opportunity().min_liquidity() - 18_000.0).abs() < 1e-10);
    }

    #[test]
    fn test_opportunity_display() {
        let display = format!("{}", make_opportunity());
        assert!(display.contains("OVERPRICED"));
        assert!(display.contains("Test event"));
    }

    #[test]
    fn test_opportunity_serialization_roundtrip() {
        let opp = make_opportunity();
        let json = serde_json::to_string(&opp).unwrap();
        let parsed: Opportunity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.kind, ArbKind::Overpriced);
        assert!((parsed.net_profit_usd - 40.0).abs() < 1e-10);
    }

    // -- SizingDecision tests --

    #[test]
    fn test_sizing_skip() {
        let skip = SizingDecision::skip();
        assert!(skip.is_skip());
        assert_eq!(skip.amount_usd, 0.0);
    }

    #[test]
    fn test_sizing_display() {
        let s = SizingDecision {
            fraction: 0.125,
            amount_usd: 1250.0,
        };
        let display = format!("{s}");
        assert!(display.contains("12.50%"));
        assert!(display.contains("1250.00"));
    }

    // -- RiskStatus tests --

    #[test]
    fn test_risk_status_all_ok() {
        let status = RiskStatus {
            daily_loss_ok: true,
            position_count_ok: true,
            capital_available: true,
        };
        assert!(status.can_trade());
        assert!(status.blocked_reasons().is_empty());
    }

    #[test]
    fn test_risk_status_any_failure_blocks() {
        for i in 0..3 {
            let status = RiskStatus {
                daily_loss_ok: i != 0,
                position_count_ok: i != 1,
                capital_available: i != 2,
            };
            assert!(!status.can_trade());
            assert_eq!(status.blocked_reasons().len(), 1);
        }
    }

    #[test]
    fn test_risk_status_display() {
        let blocked = RiskStatus {
            daily_loss_ok: false,
            position_count_ok: true,
            capital_available: true,
        };
        assert!(format!("{blocked}").contains("daily loss"));
    }

    // -- LegFill / ExecutionResult tests --

    #[test]
    fn test_leg_fill_failed() {
        let fill = LegFill::failed();
        assert_eq!(fill.status, LegStatus::Failed);
        assert!(!fill.has_fills());
    }

    #[test]
    fn test_execution_result_helpers() {
        let result = ExecutionResult {
            opportunity_id: "opp-1".to_string(),
            success: false,
            yes: LegFill {
                filled_size: 100.0,
                avg_price: 0.55,
                status: LegStatus::Filled,
            },
            no: LegFill::failed(),
            capital_used: 100.0,
            actual_profit_usd: 0.0,
            actual_profit_pct: 0.0,
            duration_ms: 250.0,
            error: Some("NO leg timed out".to_string()),
            partial_fill_risk: true,
            executed_at: Utc::now(),
        };
        assert!(!result.both_legs_filled());
        assert!(result.any_leg_failed());
        let display = format!("{result}");
        assert!(display.contains("PARTIAL FILL RISK"));
    }

    #[test]
    fn test_execution_result_serialization_roundtrip() {
        let result = ExecutionResult {
            opportunity_id: "opp-2".to_string(),
            success: true,
            yes: LegFill {
                filled_size: 500.0,
                avg_price: 0.55,
                status: LegStatus::Filled,
            },
            no: LegFill {
                filled_size: 500.0,
                avg_price: 0.50,
                status: LegStatus::Filled,
            },
            capital_used: 500.0,
            actual_profit_usd: 25.0,
            actual_profit_pct: 0.05,
            duration_ms: 180.0,
            error: None,
            partial_fill_risk: false,
            executed_at: Utc::now(),
        };
        let json = serde_json::to_string(&result).unwrap();
        let parsed: ExecutionResult = serde_json::from_str(&json).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.yes.status, LegStatus::Filled);
    }

    // -- ArbError tests --

    #[test]
    fn test_error_display() {
        let e = ArbError::InsufficientLiquidity {
            required: 5000.0,
            available: 1200.0,
        };
        assert!(format!("{e}").contains("5000.00"));
        assert!(format!("{e}").contains("1200.00"));

        let e = ArbError::PriceStale {
            leg: "YES",
            quoted: 0.55,
            current: 0.60,
            moved_pct: 9.09,
            tolerance_pct: 1.0,
        };
        let msg = format!("{e}");
        assert!(msg.contains("YES"));
        assert!(msg.contains("0.5500"));
    }
}
