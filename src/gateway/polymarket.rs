//! Polymarket integration.
//!
//! Uses the Gamma API for market discovery (no auth required) and the
//! CLOB API for midpoint price checks. Order placement requires a Polygon
//! wallet with USDC and EIP-712 order signing, which is not wired yet, so
//! `submit_order` returns a simulated fill at the quoted price.
//!
//! Gamma API: https://gamma-api.polymarket.com
//! CLOB API: https://clob.polymarket.com

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::gateway::{MarketDataSource, OrderGateway};
use crate::types::{LegFill, LegStatus, MarketSnapshot, OutcomeQuote, Side};

// ---------------------------------------------------------------------------
// Gamma API response types (market discovery)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
#[allow(dead_code)]
pub struct GammaMarket {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub question: String,
    #[serde(default, rename = "conditionId")]
    pub condition_id: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
    /// Outcome prices as JSON string: "[\"0.65\",\"0.35\"]"
    #[serde(default, rename = "outcomePrices")]
    pub outcome_prices: Option<String>,
    /// CLOB token ids in the same string-array format.
    #[serde(default, rename = "clobTokenIds")]
    pub clob_token_ids: Option<String>,
    #[serde(default)]
    pub liquidity: Option<f64>,
    #[serde(default, rename = "liquidityNum")]
    pub liquidity_num: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MidpointResponse {
    mid: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct PolymarketGateway {
    http: Client,
    gamma_url: String,
    clob_url: String,
    market_limit: usize,
}

impl PolymarketGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build Polymarket HTTP client")?;

        Ok(Self {
            http,
            gamma_url: config.gamma_api_url.clone(),
            clob_url: config.clob_api_url.clone(),
            market_limit: config.market_limit,
        })
    }

    /// Fetch active markets from the Gamma API (no auth required).
    async fn fetch_gamma_markets(&self) -> Result<Vec<GammaMarket>> {
        let url = format!("{}/markets", self.gamma_url);
        debug!("Fetching Polymarket markets from Gamma API");

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("active", "true"),
                ("closed", "false"),
                ("limit", &self.market_limit.to_string()),
            ])
            .send()
            .await
            .context("Gamma API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gamma API error {status}: {body}");
        }

        let markets: Vec<GammaMarket> = resp
            .json()
            .await
            .context("Failed to parse Gamma markets response")?;

        info!(count = markets.len(), "Fetched raw Gamma markets");
        Ok(markets)
    }

    /// Midpoint price for one CLOB token.
    async fn fetch_midpoint(&self, token_id: &str) -> Result<f64> {
        let url = format!("{}/midpoint", self.clob_url);
        let resp: MidpointResponse = self
            .http
            .get(&url)
            .query(&[("token_id", token_id)])
            .send()
            .await
            .context("CLOB midpoint request failed")?
            .json()
            .await
            .context("Failed to parse CLOB midpoint response")?;

        resp.mid
            .parse::<f64>()
            .with_context(|| format!("Unparseable midpoint for token {token_id}: {}", resp.mid))
    }

    /// Convert a Gamma market into a snapshot. Returns None for markets
    /// that are missing prices or token ids.
    pub fn convert_market(gm: &GammaMarket) -> Option<MarketSnapshot> {
        if gm.condition_id.is_empty() || gm.question.is_empty() {
            return None;
        }

        let (yes_price, no_price) =
            Self::parse_string_pair(gm.outcome_prices.as_deref().unwrap_or(""))
                .and_then(|(y, n)| Some((y.parse::<f64>().ok()?, n.parse::<f64>().ok()?)))?;

        let (yes_token, no_token) =
            Self::parse_string_pair(gm.clob_token_ids.as_deref().unwrap_or(""))?;
        if yes_token.is_empty() || no_token.is_empty() {
            return None;
        }

        // Gamma reports one liquidity figure per market; attribute half to
        // each leg until per-book depth is pulled from the CLOB.
        let liquidity = gm.liquidity.or(gm.liquidity_num).unwrap_or(0.0);
        let per_leg = liquidity / 2.0;

        // Unparseable end dates degrade to "unknown expiry", never a skip.
        let expires_at = gm
            .end_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc));

        Some(MarketSnapshot {
            event_id: gm.condition_id.clone(),
            event_title: gm.question.clone(),
            yes: OutcomeQuote {
                token_id: yes_token,
                price: yes_price,
                liquidity: per_leg,
            },
            no: OutcomeQuote {
                token_id: no_token,
                price: no_price,
                liquidity: per_leg,
            },
            observed_at: Utc::now(),
            expires_at,
        })
    }

    /// Parse Gamma's stringified two-element arrays.
    /// Handles: "[\"0.65\",\"0.35\"]", "0.65, 0.35", etc.
    pub fn parse_string_pair(s: &str) -> Option<(String, String)> {
        let cleaned = s.replace(['[', ']', '"', '\\'], "");
        let parts: Vec<&str> = cleaned.split(',').map(|p| p.trim()).collect();
        if parts.len() >= 2 && !parts[0].is_empty() && !parts[1].is_empty() {
            Some((parts[0].to_string(), parts[1].to_string()))
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Trait implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl MarketDataSource for PolymarketGateway {
    async fn snapshots(&self) -> Result<Vec<MarketSnapshot>> {
        let gamma_markets = self.fetch_gamma_markets().await?;

        let snapshots: Vec<MarketSnapshot> = gamma_markets
            .iter()
            .filter_map(Self::convert_market)
            .collect();

        info!(count = snapshots.len(), "Polymarket snapshots after conversion");
        Ok(snapshots)
    }

    async fn prices(&self, token_ids: &[String]) -> Result<HashMap<String, f64>> {
        let fetches = token_ids.iter().map(|id| async move {
            let price = self.fetch_midpoint(id).await?;
            Ok::<_, anyhow::Error>((id.clone(), price))
        });

        let pairs = futures::future::try_join_all(fetches).await?;
        Ok(pairs.into_iter().collect())
    }
}

#[async_trait]
impl OrderGateway for PolymarketGateway {
    async fn submit_order(
        &self,
        token_id: &str,
        side: Side,
        price: f64,
        size: f64,
    ) -> Result<LegFill> {
        // TODO: Implement CLOB order placement.
        // Requires:
        //   1. Polygon wallet private key
        //   2. EIP-712 order signing
        //   3. HMAC-SHA256 L2 authentication
        //   4. Token approval for USDC + CTF contracts
        warn!(
            token_id = %token_id,
            side = %side,
            price,
            size,
            "Polymarket execution not yet wired — returning simulated fill"
        );
        Ok(LegFill {
            filled_size: size,
            avg_price: price,
            status: LegStatus::Filled,
        })
    }

    fn name(&self) -> &str {
        "polymarket"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
