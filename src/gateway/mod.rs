//! Market access.
//!
//! Defines the `MarketDataSource` and `OrderGateway` traits and provides:
//! - Polymarket (Gamma + CLOB APIs) — real market discovery; order
//!   submission stays simulated until CLOB signing is wired
//! - Paper gateway — deterministic in-memory venue for dry runs and tests

pub mod paper;
pub mod polymarket;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

use crate::types::{LegFill, MarketSnapshot, Side};

/// Read side of a venue: market discovery and spot price re-checks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch current snapshots of all active binary markets.
    async fn snapshots(&self) -> Result<Vec<MarketSnapshot>>;

    /// Current prices for the given outcome tokens. Tokens the venue no
    /// longer quotes are simply absent from the map.
    async fn prices(&self, token_ids: &[String]) -> Result<HashMap<String, f64>>;
}

/// Write side of a venue: order submission for one leg.
///
/// Implementations do not enforce deadlines; the caller wraps each
/// submission in its own timeout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit a limit order and report what actually filled.
    async fn submit_order(
        &self,
        token_id: &str,
        side: Side,
        price: f64,
        size: f64,
    ) -> Result<LegFill>;

    /// Venue name for logging and identification.
    fn name(&self) -> &str;
}
