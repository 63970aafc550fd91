//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub trading: TradingConfig,
    pub risk: RiskConfig,
    pub execution: ExecutionConfig,
    pub gateway: GatewayConfig,
    pub signals: SignalsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub name: String,
    /// Seconds between market scans.
    pub scan_interval_secs: u64,
    pub initial_bankroll: f64,
    /// "paper" runs through the simulated gateway; "live" hits the CLOB.
    pub mode: String,
}

impl EngineConfig {
    pub fn is_paper(&self) -> bool {
        self.mode != "live"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TradingConfig {
    /// Minimum net profit ratio for an opportunity to be actionable.
    pub min_profit_threshold: f64,
    /// Minimum |YES + NO - 1.0| worth looking at.
    pub min_discrepancy: f64,
    /// Minimum combined per-leg liquidity in USDC.
    pub min_liquidity: f64,
    /// Hard cap on a single position in USD.
    pub max_position_size: f64,
    /// Per-leg fee rate (maker and taker each pay this).
    pub fee_rate_per_leg: f64,
    /// Base slippage rate before the position-size adjustment.
    pub base_slippage_rate: f64,
    /// Additional slippage per unit of capital/liquidity ratio.
    pub position_ratio_slippage_factor: f64,
    /// Maximum total slippage rate and stale-price tolerance.
    pub slippage_tolerance: f64,
    /// Seconds a detected opportunity stays actionable.
    pub opportunity_ttl_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RiskConfig {
    pub max_daily_loss: f64,
    pub max_open_positions: usize,
    /// Kelly fraction ceiling before the conservative factor.
    pub max_kelly_fraction: f64,
    /// Multiplier applied after capping (fractional Kelly).
    pub conservative_factor: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExecutionConfig {
    /// Timeout for the pre-flight price re-check.
    pub price_check_timeout_secs: u64,
    /// Per-leg order submission timeout.
    pub order_timeout_secs: u64,
    /// Fraction of requested size that counts as a full fill.
    pub fill_ratio_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub gamma_api_url: String,
    pub clob_api_url: String,
    pub api_key_env: Option<String>,
    /// Max markets fetched per scan.
    pub market_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SignalsConfig {
    pub enabled: bool,
    /// Cap on the absolute total confidence adjustment from boosters.
    pub max_total_boost: f64,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Reject configurations that would make the engine misbehave silently.
    fn validate(&self) -> Result<()> {
        if self.engine.initial_bankroll <= 0.0 {
            anyhow::bail!("initial_bankroll must be positive");
        }
        if !(0.0..=1.0).contains(&self.risk.max_kelly_fraction) {
            anyhow::bail!("max_kelly_fraction must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.risk.conservative_factor) {
            anyhow::bail!("conservative_factor must be in [0, 1]");
        }
        if self.trading.min_discrepancy <= 0.0 {
            anyhow::bail!("min_discrepancy must be positive");
        }
        if self.execution.fill_ratio_threshold <= 0.0 || self.execution.fill_ratio_threshold > 1.0 {
            anyhow::bail!("fill_ratio_threshold must be in (0, 1]");
        }
        Ok(())
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            min_profit_threshold: 0.02,
            min_discrepancy: 0.03,
            min_liquidity: 10_000.0,
            max_position_size: 1000.0,
            fee_rate_per_leg: 0.002,
            base_slippage_rate: 0.001,
            position_ratio_slippage_factor: 0.005,
            slippage_tolerance: 0.01,
            opportunity_ttl_secs: 60,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_daily_loss: 100.0,
            max_open_positions: 10,
            max_kelly_fraction: 0.25,
            conservative_factor: 0.5,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            price_check_timeout_secs: 5,
            order_timeout_secs: 10,
            fill_ratio_threshold: 0.95,
        }
    }
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_total_boost: 0.10,
        }
    }
}
