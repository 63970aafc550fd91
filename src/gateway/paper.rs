//! Paper trading venue.
//!
//! A deterministic in-memory implementation of both gateway traits.
//! Drives dry-run mode and integration tests: markets, prices, and fill
//! behavior are fully controllable, and every submitted order is recorded
//! for inspection.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::gateway::{MarketDataSource, OrderGateway};
use crate::types::{LegFill, LegStatus, MarketSnapshot, Side};

/// A record of one order the paper venue accepted.
#[derive(Debug, Clone)]
pub struct SubmittedOrder {
    pub token_id: String,
    pub side: Side,
    pub price: f64,
    pub size: f64,
}

/// In-memory venue with controllable behavior.
pub struct PaperGateway {
    snapshots: Mutex<Vec<MarketSnapshot>>,
    /// Overrides returned by `prices` instead of the snapshot price.
    price_overrides: Mutex<HashMap<String, f64>>,
    /// Per-token fraction of requested size that fills (default 1.0).
    fill_ratios: Mutex<HashMap<String, f64>>,
    /// If set, order submission fails with this message.
    force_error: Mutex<Option<String>>,
    submitted: Mutex<Vec<SubmittedOrder>>,
}

impl PaperGateway {
    pub fn new(snapshots: Vec<MarketSnapshot>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots),
            price_overrides: Mutex::new(HashMap::new()),
            fill_ratios: Mutex::new(HashMap::new()),
            force_error: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Replace the market set for the next scan.
    pub fn set_snapshots(&self, snapshots: Vec<MarketSnapshot>) {
        *self.snapshots.lock().unwrap() = snapshots;
    }

    /// Make `prices` report a moved price for one token.
    pub fn set_price(&self, token_id: &str, price: f64) {
        self.price_overrides
            .lock()
            .unwrap()
            .insert(token_id.to_string(), price);
    }

    /// Make orders on one token fill only a fraction of the request.
    pub fn set_fill_ratio(&self, token_id: &str, ratio: f64) {
        self.fill_ratios
            .lock()
            .unwrap()
            .insert(token_id.to_string(), ratio);
    }

    /// Force all subsequent order submissions to fail.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Clear any forced error.
    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    /// All orders submitted so far.
    pub fn orders(&self) -> Vec<SubmittedOrder> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataSource for PaperGateway {
    async fn snapshots(&self) -> Result<Vec<MarketSnapshot>> {
        let mut snaps = self.snapshots.lock().unwrap().clone();
        // Fresh observation time on every scan, like a live feed.
        let now = Utc::now();
        for s in &mut snaps {
            s.observed_at = now;
        }
        Ok(snaps)
    }

    async fn prices(&self, token_ids: &[String]) -> Result<HashMap<String, f64>> {
        let overrides = self.price_overrides.lock().unwrap();
        let snaps = self.snapshots.lock().unwrap();

        let mut out = HashMap::new();
        for id in token_ids {
            if let Some(p) = overrides.get(id) {
                out.insert(id.clone(), *p);
                continue;
            }
            let quoted = snaps.iter().find_map(|s| {
                if &s.yes.token_id == id {
                    Some(s.yes.price)
                } else if &s.no.token_id == id {
                    Some(s.no.price)
                } else {
                    None
                }
            });
            if let Some(p) = quoted {
                out.insert(id.clone(), p);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl OrderGateway for PaperGateway {
    async fn submit_order(
        &self,
        token_id: &str,
        side: Side,
        price: f64,
        size: f64,
    ) -> Result<LegFill> {
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(anyhow!("paper venue error: {msg}"));
        }

        self.submitted.lock().unwrap().push(SubmittedOrder {
            token_id: token_id.to_string(),
            side,
            price,
            size,
        });

        let ratio = self
            .fill_ratios
            .lock()
            .unwrap()
            .get(token_id)
            .copied()
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);
        let filled = size * ratio;

        let status = if filled <= 0.0 {
            LegStatus::Pending
        } else if ratio >= 1.0 {
            LegStatus::Filled
        } else {
            LegStatus::Partial
        };

        debug!(token_id, %side, price, size, filled, "Paper fill");

        Ok(LegFill {
            filled_size: filled,
            avg_price: price,
            status,
        })
    }

    fn name(&self) -> &str {
        "paper"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot::sample(0.55, 0.50)
    }

    #[tokio::test]
    async fn test_snapshots_returned_with_fresh_timestamp() {
        let gw = PaperGateway::new(vec![snapshot()]);
        let snaps = gw.snapshots().await.unwrap();
        assert_eq!(snaps.len(), 1);
        assert!((Utc::now() - snaps[0].observed_at).num_seconds() < 2);
    }

    #[tokio::test]
    async fn test_prices_from_snapshot_and_override() {
        let gw = PaperGateway::new(vec![snapshot()]);
        gw.set_price("tok-no", 0.60);

        let prices = gw
            .prices(&["tok-yes".to_string(), "tok-no".to_string()])
            .await
            .unwrap();
        assert!((prices["tok-yes"] - 0.55).abs() < 1e-10);
        assert!((prices["tok-no"] - 0.60).abs() < 1e-10);
    }

    #[tokio::test]
    async fn test_prices_unknown_token_absent() {
        let gw = PaperGateway::new(vec![snapshot()]);
        let prices = gw.prices(&["nonexistent".to_string()]).await.unwrap();
        assert!(prices.is_empty());
    }

    #[tokio::test]
    async fn test_full_fill_by_default() {
        let gw = PaperGateway::new(vec![snapshot()]);
        let fill = gw
            .submit_order("tok-yes", Side::Sell, 0.55, 500.0)
            .await
            .unwrap();
        assert_eq!(fill.status, LegStatus::Filled);
        assert!((fill.filled_size - 500.0).abs() < 1e-10);
        assert_eq!(gw.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_fill_ratio() {
        let gw = PaperGateway::new(vec![snapshot()]);
        gw.set_fill_ratio("tok-yes", 0.5);
        let fill = gw
            .submit_order("tok-yes", Side::Sell, 0.55, 500.0)
            .await
            .unwrap();
        assert_eq!(fill.status, LegStatus::Partial);
        assert!((fill.filled_size - 250.0).abs() < 1e-10);
    }

    #[tokio::test]
    async fn test_zero_fill_is_pending() {
        let gw = PaperGateway::new(vec![snapshot()]);
        gw.set_fill_ratio("tok-yes", 0.0);
        let fill = gw
            .submit_order("tok-yes", Side::Sell, 0.55, 500.0)
            .await
            .unwrap();
        assert_eq!(fill.status, LegStatus::Pending);
    }

    #[tokio::test]
    async fn test_forced_error() {
        let gw = PaperGateway::new(vec![snapshot()]);
        gw.set_error("venue down");
        assert!(gw
            .submit_order("tok-yes", Side::Sell, 0.55, 500.0)
            .await
            .is_err());

        gw.clear_error();
        assert!(gw
            .submit_order("tok-yes", Side::Sell, 0.55, 500.0)
            .await
            .is_ok());
    }
}
