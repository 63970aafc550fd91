//! Confidence boosters.
//!
//! Optional signal sources that nudge an opportunity's confidence up or
//! down based on the event itself rather than the order book. Individual
//! scores are summed and the total is clamped to a configured ceiling, so
//! no booster (or pile of boosters) can swamp the book-derived score.

use tracing::debug;

/// A source of small confidence adjustments for an event.
pub trait SignalBooster: Send + Sync {
    fn name(&self) -> &'static str;

    /// Signed adjustment for this event. Implementations should stay well
    /// inside [-1, 1]; the combiner clamps the total regardless.
    fn score(&self, event_title: &str) -> f64;
}

/// Sum all booster scores for an event, clamped to ±`max_total_boost`.
/// No boosters configured → 0.
pub fn combined_boost(boosters: &[Box<dyn SignalBooster>], event_title: &str, max_total_boost: f64) -> f64 {
    if boosters.is_empty() {
        return 0.0;
    }
    let total: f64 = boosters
        .iter()
        .map(|b| {
            let s = b.score(event_title);
            debug!(booster = b.name(), score = s, "Booster scored event");
            s
        })
        .sum();
    total.clamp(-max_total_boost, max_total_boost)
}

// ---------------------------------------------------------------------------
// Keyword booster
// ---------------------------------------------------------------------------

/// Case-insensitive keyword matcher with per-keyword weights.
///
/// Events in the middle of a live news cycle reprice violently between
/// detection and execution, so churn words carry negative weight;
/// mechanical, schedule-driven events carry a small positive one.
pub struct KeywordBooster {
    rules: Vec<(&'static str, f64)>,
}

impl KeywordBooster {
    pub fn new(rules: Vec<(&'static str, f64)>) -> Self {
        Self { rules }
    }

    pub fn with_default_rules() -> Self {
        Self::new(vec![
            // Live-news churn: prices move faster than we can hedge.
            ("breaking", -0.05),
            ("recount", -0.04),
            ("disputed", -0.04),
            ("halted", -0.05),
            ("emergency", -0.03),
            // Schedule-driven events settle mechanically.
            ("close above", 0.02),
            ("close below", 0.02),
            ("fed rate", 0.02),
            ("official", 0.01),
        ])
    }
}

impl SignalBooster for KeywordBooster {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn score(&self, event_title: &str) -> f64 {
        let title = event_title.to_lowercase();
        self.rules
            .iter()
            .filter(|(keyword, _)| title.contains(keyword))
            .map(|(_, weight)| weight)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
