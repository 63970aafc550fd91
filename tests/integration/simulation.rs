//! End-to-end cycles through the full pipeline.
//!
//! Paper venue in, JSON ledger out: these tests drive the same wiring
//! `main` builds in paper mode, with no network or clock dependencies.

use std::sync::Arc;

use arbiter::gateway::paper::PaperGateway;
use arbiter::storage::{JsonLedger, Ledger};
use arbiter::types::Side;

use crate::fixtures;

#[tokio::test]
async fn test_profitable_arb_executes_end_to_end() {
    let path = fixtures::temp_ledger_path();
    let ledger: Arc<dyn Ledger> = Arc::new(JsonLedger::open(Some(&path)).unwrap());
    let venue = Arc::new(PaperGateway::new(vec![
        fixtures::deep_arb(),
        fixtures::efficient(),
    ]));

    let engine = fixtures::build_engine(venue.clone(), ledger.clone());
    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.markets_scanned, 2);
    assert_eq!(report.opportunities_found, 1);
    assert_eq!(report.trades_executed, 1);
    assert!(report.realized_pnl > 0.0);

    // Overpriced market: both legs sold, one order per leg.
    let orders = venue.orders();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.side == Side::Sell));
    assert!(orders.iter().any(|o| o.token_id == "deep-yes"));
    assert!(orders.iter().any(|o| o.token_id == "deep-no"));

    // Clean execution leaves nothing on the book and a profitable day.
    assert_eq!(ledger.open_position_count().await.unwrap(), 0);
    assert_eq!(ledger.daily_loss().await.unwrap(), 0.0);

    JsonLedger::delete(Some(&path)).unwrap();
}

#[tokio::test]
async fn test_one_leg_failure_opens_position_in_ledger() {
    let path = fixtures::temp_ledger_path();
    let ledger: Arc<dyn Ledger> = Arc::new(JsonLedger::open(Some(&path)).unwrap());
    let venue = Arc::new(PaperGateway::new(vec![fixtures::deep_arb()]));
    venue.set_fill_ratio("deep-no", 0.0);

    let engine = fixtures::build_engine(venue.clone(), ledger.clone());
    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.trades_executed, 0);
    assert_eq!(report.trades_failed, 1);

    // The filled YES leg is unhedged: it must land on the book.
    assert_eq!(ledger.open_position_count().await.unwrap(), 1);
    assert!(ledger.capital_at_risk().await.unwrap() > 0.0);

    JsonLedger::delete(Some(&path)).unwrap();
}

#[tokio::test]
async fn test_daily_loss_limit_halts_cycle() {
    let path = fixtures::temp_ledger_path();
    let ledger: Arc<dyn Ledger> = Arc::new(JsonLedger::open(Some(&path)).unwrap());

    // Seed a $150 realized loss — over the $100 daily limit.
    let (opportunity, result) = fixtures::losing_execution(150.0);
    ledger.save_execution(&result, &opportunity).await.unwrap();

    let venue = Arc::new(PaperGateway::new(vec![fixtures::deep_arb()]));
    let engine = fixtures::build_engine(venue.clone(), ledger.clone());
    let report = engine.run_cycle().await.unwrap();

    // Opportunity is detected but the gate stops everything.
    assert_eq!(report.opportunities_found, 1);
    assert!(report.halted.is_some());
    assert_eq!(report.trades_executed, 0);
    assert!(venue.orders().is_empty());

    JsonLedger::delete(Some(&path)).unwrap();
}

#[tokio::test]
async fn test_marginal_market_detected_but_not_sized() {
    let path = fixtures::temp_ledger_path();
    let ledger: Arc<dyn Ledger> = Arc::new(JsonLedger::open(Some(&path)).unwrap());

    // 4% spread on a modest book: clears detection, loses to Kelly.
    let venue = Arc::new(PaperGateway::new(vec![fixtures::market(
        "thin",
        "Will the Senate pass the bill?",
        0.52,
        0.52,
        12_000.0,
    )]));

    let engine = fixtures::build_engine(venue.clone(), ledger.clone());
    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.opportunities_found, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.trades_executed, 0);
    assert!(venue.orders().is_empty());

    JsonLedger::delete(Some(&path)).unwrap();
}

#[tokio::test]
async fn test_price_move_between_cycles_aborts_execution() {
    let path = fixtures::temp_ledger_path();
    let ledger: Arc<dyn Ledger> = Arc::new(JsonLedger::open(Some(&path)).unwrap());
    let venue = Arc::new(PaperGateway::new(vec![fixtures::deep_arb()]));

    // The book reprices after detection: re-check must refuse to trade.
    venue.set_price("deep-yes", 0.48);

    let engine = fixtures::build_engine(venue.clone(), ledger.clone());
    let report = engine.run_cycle().await.unwrap();

    assert_eq!(report.trades_failed, 1);
    assert!(venue.orders().is_empty());
    assert_eq!(ledger.open_position_count().await.unwrap(), 0);

    JsonLedger::delete(Some(&path)).unwrap();
}

#[tokio::test]
async fn test_consecutive_cycles_accumulate_ledger_history() {
    let path = fixtures::temp_ledger_path();
    let ledger: Arc<dyn Ledger> = Arc::new(JsonLedger::open(Some(&path)).unwrap());
    let venue = Arc::new(PaperGateway::new(vec![fixtures::deep_arb()]));

    let engine = fixtures::build_engine(venue.clone(), ledger.clone());
    let first = engine.run_cycle().await.unwrap();
    let second = engine.run_cycle().await.unwrap();

    assert_eq!(first.trades_executed, 1);
    assert_eq!(second.trades_executed, 1);
    assert_eq!(venue.orders().len(), 4);

    // Profitable both times: the gate never intervened.
    assert!(first.halted.is_none() && second.halted.is_none());
    assert_eq!(ledger.daily_loss().await.unwrap(), 0.0);

    JsonLedger::delete(Some(&path)).unwrap();
}
