//! ARBITER — Intra-Market Arbitrage Engine for Binary Prediction Markets
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the ledger, and runs the scan→detect→execute loop with graceful
//! shutdown.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use arbiter::config::AppConfig;
use arbiter::engine::{Engine, ExecutionCoordinator, OpportunityDetector};
use arbiter::gateway::paper::PaperGateway;
use arbiter::gateway::polymarket::PolymarketGateway;
use arbiter::gateway::{MarketDataSource, OrderGateway};
use arbiter::signals::{KeywordBooster, SignalBooster};
use arbiter::storage::{JsonLedger, Ledger};
use arbiter::strategy::{KellyConfig, KellySizer, RiskGate, RiskLimits};

const BANNER: &str = r#"
    _    ____  ____ ___ _____ _____ ____
   / \  |  _ \| __ )_ _|_   _| ____|  _ \
  / _ \ | |_) |  _ \| |  | | |  _| | |_) |
 / ___ \|  _ <| |_) | |  | | | |___|  _ <
/_/   \_\_| \_\____/___| |_| |_____|_| \_\

  Intra-Market Arbitrage Engine
  v0.1.0 — Binary Prediction Markets
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        engine_name = %cfg.engine.name,
        mode = %cfg.engine.mode,
        scan_interval_secs = cfg.engine.scan_interval_secs,
        bankroll = cfg.engine.initial_bankroll,
        "ARBITER starting up"
    );

    // -- Initialise components -------------------------------------------

    let ledger: Arc<dyn Ledger> = Arc::new(JsonLedger::open(None)?);

    let (data, order_gateway): (Arc<dyn MarketDataSource>, Arc<dyn OrderGateway>) =
        if cfg.engine.is_paper() {
            warn!("Paper mode: orders go to the in-memory venue");
            let polymarket = Arc::new(PolymarketGateway::new(&cfg.gateway)?);
            let paper = Arc::new(PaperGateway::new(Vec::new()));
            // Real market data, simulated fills.
            (polymarket, paper)
        } else {
            let polymarket = Arc::new(PolymarketGateway::new(&cfg.gateway)?);
            (polymarket.clone(), polymarket)
        };

    let boosters: Vec<Box<dyn SignalBooster>> =
        vec![Box::new(KeywordBooster::with_default_rules())];
    let detector = OpportunityDetector::new(cfg.trading.clone(), boosters, &cfg.signals);

    let gate = RiskGate::new(RiskLimits {
        max_daily_loss: cfg.risk.max_daily_loss,
        max_open_positions: cfg.risk.max_open_positions,
        bankroll: cfg.engine.initial_bankroll,
    });

    let sizer = KellySizer::new(KellyConfig {
        max_fraction: cfg.risk.max_kelly_fraction,
        conservative_factor: cfg.risk.conservative_factor,
    });

    let coordinator = ExecutionCoordinator::new(
        data.clone(),
        order_gateway,
        cfg.execution.clone(),
        cfg.trading.slippage_tolerance,
    );

    let engine = Engine::new(
        data,
        detector,
        gate,
        sizer,
        coordinator,
        ledger,
        cfg.engine.initial_bankroll,
        cfg.trading.max_position_size,
        cfg.trading.slippage_tolerance,
    );

    // -- Main loop -------------------------------------------------------

    let mut interval = tokio::time::interval(Duration::from_secs(cfg.engine.scan_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.engine.scan_interval_secs,
        "Entering scan loop. Press Ctrl+C to stop."
    );

    let mut cycle_count: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                cycle_count += 1;
                info!(cycle = cycle_count, "Starting cycle");
                match engine.run_cycle().await {
                    Ok(report) => info!(cycle = cycle_count, report = %report, "Cycle finished"),
                    Err(e) => error!(cycle = cycle_count, error = %e, "Cycle failed — continuing to next"),
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!(cycles = cycle_count, "ARBITER shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arbiter=info"));

    let json_logging = std::env::var("ARBITER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
