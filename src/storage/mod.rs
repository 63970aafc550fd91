//! Ledger: execution records and risk accounting.
//!
//! Persists to a JSON file. The daily realized loss counter rolls over at
//! UTC midnight; open positions accumulate from one-sided or partial
//! executions until resolved externally. SQLite can replace the JSON file
//! later, but a single file is sufficient for one engine instance.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::types::{ExecutionResult, Opportunity};

/// Default ledger file path.
const DEFAULT_LEDGER_FILE: &str = "arbiter_ledger.json";

// ---------------------------------------------------------------------------
// Ledger trait
// ---------------------------------------------------------------------------

/// Risk-accounting view of past executions. The risk gate reads it before
/// every trade; the cycle writes to it after every execution attempt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Magnitude of today's net realized losses in USD.
    /// Zero when flat or profitable on the day.
    async fn daily_loss(&self) -> Result<f64>;

    /// Number of unresolved positions from partial or one-sided fills.
    async fn open_position_count(&self) -> Result<usize>;

    /// Capital currently tied up in unresolved positions.
    async fn capital_at_risk(&self) -> Result<f64>;

    /// Append an execution record and update the risk counters.
    /// Returns the record id.
    async fn save_execution(
        &self,
        result: &ExecutionResult,
        opportunity: &Opportunity,
    ) -> Result<String>;
}

// ---------------------------------------------------------------------------
// JSON-file implementation
// ---------------------------------------------------------------------------

/// One persisted execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: String,
    pub opportunity: Opportunity,
    pub result: ExecutionResult,
}

/// A position left open by an execution that didn't fully hedge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub record_id: String,
    pub event_id: String,
    pub capital: f64,
    pub opened_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerState {
    /// UTC day the daily counter belongs to.
    day: NaiveDate,
    /// Net realized P&L for `day`. Negative when losing.
    daily_realized_pnl: f64,
    open_positions: Vec<OpenPosition>,
    executions: Vec<ExecutionRecord>,
}

impl LedgerState {
    fn fresh() -> Self {
        Self {
            day: Utc::now().date_naive(),
            daily_realized_pnl: 0.0,
            open_positions: Vec::new(),
            executions: Vec::new(),
        }
    }

    /// Reset the daily counter if the UTC day has advanced.
    fn roll_over(&mut self, today: NaiveDate) {
        if self.day != today {
            info!(
                from = %self.day,
                to = %today,
                closed_pnl = format!("${:.2}", self.daily_realized_pnl),
                "Daily counter rollover"
            );
            self.day = today;
            self.daily_realized_pnl = 0.0;
        }
    }
}

/// File-backed [`Ledger`]. State is held in memory behind a mutex and
/// flushed to disk on every write.
pub struct JsonLedger {
    path: String,
    state: Mutex<LedgerState>,
}

impl JsonLedger {
    /// Open the ledger file, or start fresh if it doesn't exist.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let path = path.unwrap_or(DEFAULT_LEDGER_FILE).to_string();

        let state = if Path::new(&path).exists() {
            let json = std::fs::read_to_string(&path)
                .context(format!("Failed to read ledger from {path}"))?;
            let state: LedgerState = serde_json::from_str(&json)
                .context(format!("Failed to parse ledger from {path}"))?;
            info!(
                path,
                executions = state.executions.len(),
                open = state.open_positions.len(),
                "Ledger loaded from disk"
            );
            state
        } else {
            info!(path, "No ledger file found, starting fresh");
            LedgerState::fresh()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn persist(&self, state: &LedgerState) -> Result<()> {
        let json =
            serde_json::to_string_pretty(state).context("Failed to serialise ledger state")?;
        std::fs::write(&self.path, &json)
            .context(format!("Failed to write ledger to {}", self.path))?;
        debug!(path = %self.path, "Ledger saved");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        // Poisoning only happens if a writer panicked; the state itself is
        // still the last consistent snapshot.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Delete the ledger file (for testing or reset).
    pub fn delete(path: Option<&str>) -> Result<()> {
        let path = path.unwrap_or(DEFAULT_LEDGER_FILE);
        if Path::new(path).exists() {
            std::fs::remove_file(path)
                .context(format!("Failed to delete ledger file {path}"))?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn rewind_day(&self, days: i64) {
        let mut state = self.lock();
        state.day = state.day - chrono::Duration::days(days);
    }
}

#[async_trait]
impl Ledger for JsonLedger {
    async fn daily_loss(&self) -> Result<f64> {
        let mut state = self.lock();
        state.roll_over(Utc::now().date_naive());
        Ok((-state.daily_realized_pnl).max(0.0))
    }

    async fn open_position_count(&self) -> Result<usize> {
        Ok(self.lock().open_positions.len())
    }

    async fn capital_at_risk(&self) -> Result<f64> {
        Ok(self.lock().open_positions.iter().map(|p| p.capital).sum())
    }

    async fn save_execution(
        &self,
        result: &ExecutionResult,
        opportunity: &Opportunity,
    ) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();

        let mut state = self.lock();
        state.roll_over(Utc::now().date_naive());

        // Profit on matched fills is realized regardless of overall success.
        state.daily_realized_pnl += result.actual_profit_usd;

        // Anything filled but unhedged stays on the book until resolved.
        if !result.success && (result.yes.has_fills() || result.no.has_fills()) {
            warn!(
                opportunity_id = %result.opportunity_id,
                capital = format!("${:.2}", result.capital_used),
                partial_fill_risk = result.partial_fill_risk,
                "Recording open position from incomplete execution"
            );
            state.open_positions.push(OpenPosition {
                record_id: id.clone(),
                event_id: opportunity.event_id.clone(),
                capital: result.capital_used,
                opened_at: result.executed_at,
            });
        }

        state.executions.push(ExecutionRecord {
            id: id.clone(),
            opportunity: opportunity.clone(),
            result: result.clone(),
        });

        self.persist(&state)?;
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
