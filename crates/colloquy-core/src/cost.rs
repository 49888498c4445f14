//! Pricing table and cost tracker.
//!
//! Pure accounting: given a model name and token counts, compute the
//! USD cost from a static pricing table and accumulate a running total.
//! The tracker is an explicitly constructed, injectable component owned
//! by whoever assembles the gateway -- not a module-level singleton --
//! and its accumulator is guarded by a mutex so concurrent completions
//! never lose an update.

use std::sync::Mutex;

use chrono::Utc;

use colloquy_types::cost::{CostRecord, CostStats};
use colloquy_types::llm::ProviderKind;

/// Per-1K-token USD pricing for one model family.
struct PricingTier {
    /// Lowercase substring matched against the reported model name.
    model: &'static str,
    input_per_1k: f64,
    output_per_1k: f64,
}

/// Priority-ordered pricing table.
///
/// Lookup is first-match by substring containment, so more specific
/// names must precede their prefixes (`gpt-4-turbo` before `gpt-4`).
/// This is a best-effort mapping, not exact billing.
const PRICING: &[PricingTier] = &[
    PricingTier { model: "gpt-4-turbo", input_per_1k: 0.01, output_per_1k: 0.03 },
    PricingTier { model: "gpt-3.5-turbo", input_per_1k: 0.0005, output_per_1k: 0.0015 },
    PricingTier { model: "gpt-4", input_per_1k: 0.03, output_per_1k: 0.06 },
    PricingTier { model: "claude-3-opus", input_per_1k: 0.015, output_per_1k: 0.075 },
    PricingTier { model: "claude-3-sonnet", input_per_1k: 0.003, output_per_1k: 0.015 },
    PricingTier { model: "claude-3-haiku", input_per_1k: 0.00025, output_per_1k: 0.00125 },
];

/// Fallback pricing when no tier matches.
const DEFAULT_INPUT_PER_1K: f64 = 0.01;
const DEFAULT_OUTPUT_PER_1K: f64 = 0.03;

/// How many records a stats snapshot includes.
const RECENT_LIMIT: usize = 10;

/// Resolve the per-1K prices for a model name.
///
/// The model is lowercased and matched by substring containment against
/// the table in order; the first hit wins, the default tier otherwise.
fn prices_for(model: &str) -> (f64, f64) {
    let model = model.to_lowercase();
    for tier in PRICING {
        if model.contains(tier.model) {
            return (tier.input_per_1k, tier.output_per_1k);
        }
    }
    (DEFAULT_INPUT_PER_1K, DEFAULT_OUTPUT_PER_1K)
}

#[derive(Default)]
struct CostState {
    total_cost: f64,
    records: Vec<CostRecord>,
    /// The alert fires once per threshold crossing. The total never
    /// decreases, so once set this stays set.
    alerted: bool,
}

/// In-process cost accumulator with a one-shot alert threshold.
///
/// Records accumulate for the lifetime of the process; there is no
/// persistence across restarts.
pub struct CostTracker {
    alert_threshold: f64,
    state: Mutex<CostState>,
}

impl CostTracker {
    pub fn new(alert_threshold: f64) -> Self {
        Self {
            alert_threshold,
            state: Mutex::new(CostState::default()),
        }
    }

    /// Compute and record the cost of one completed call, returning it.
    ///
    /// Emits a warning the first time the running total crosses the
    /// alert threshold.
    pub fn track_usage(
        &self,
        model: &str,
        input_tokens: u32,
        output_tokens: u32,
        provider: ProviderKind,
    ) -> f64 {
        let (input_per_1k, output_per_1k) = prices_for(model);
        let cost = (f64::from(input_tokens) / 1000.0) * input_per_1k
            + (f64::from(output_tokens) / 1000.0) * output_per_1k;

        let mut state = self.lock();
        state.total_cost += cost;
        state.records.push(CostRecord {
            timestamp: Utc::now(),
            model: model.to_string(),
            provider,
            input_tokens,
            output_tokens,
            cost,
        });

        tracing::info!(
            model,
            provider = %provider,
            input_tokens,
            output_tokens,
            cost,
            total_cost = state.total_cost,
            "usage tracked"
        );

        if state.total_cost > self.alert_threshold && !state.alerted {
            state.alerted = true;
            tracing::warn!(
                total_cost = state.total_cost,
                threshold = self.alert_threshold,
                "cost alert threshold exceeded"
            );
        }

        cost
    }

    /// Read-only snapshot: running total, request count, and the last
    /// 10 records.
    pub fn stats(&self) -> CostStats {
        let state = self.lock();
        let start = state.records.len().saturating_sub(RECENT_LIMIT);
        CostStats {
            total_cost: state.total_cost,
            total_requests: state.records.len(),
            recent_requests: state.records[start..].to_vec(),
        }
    }

    /// Current running total in USD.
    pub fn total_cost(&self) -> f64 {
        self.lock().total_cost
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CostState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_pricing() {
        let tracker = CostTracker::new(100.0);
        // gpt-4: (1000/1000)*0.03 + (500/1000)*0.06 = 0.06
        let cost = tracker.track_usage("gpt-4", 1000, 500, ProviderKind::OpenAi);
        assert!((cost - 0.06).abs() < 1e-9, "got {cost}");
    }

    #[test]
    fn test_turbo_matches_its_own_tier_not_gpt4() {
        // "gpt-4-turbo-preview" contains both "gpt-4-turbo" and "gpt-4";
        // the more specific tier is listed first and must win.
        let tracker = CostTracker::new(100.0);
        let cost = tracker.track_usage("gpt-4-turbo-preview", 1000, 1000, ProviderKind::OpenAi);
        // 0.01 + 0.03 = 0.04 (not gpt-4's 0.09)
        assert!((cost - 0.04).abs() < 1e-9, "got {cost}");
    }

    #[test]
    fn test_match_is_case_insensitive_substring() {
        let tracker = CostTracker::new(100.0);
        let cost = tracker.track_usage(
            "CLAUDE-3-SONNET-20240229",
            1000,
            1000,
            ProviderKind::Anthropic,
        );
        // 0.003 + 0.015 = 0.018
        assert!((cost - 0.018).abs() < 1e-9, "got {cost}");
    }

    #[test]
    fn test_unknown_model_uses_default_tier() {
        let tracker = CostTracker::new(100.0);
        let cost = tracker.track_usage("mystery-model-9000", 1000, 1000, ProviderKind::OpenAi);
        // default: 0.01 + 0.03 = 0.04
        assert!((cost - 0.04).abs() < 1e-9, "got {cost}");
    }

    #[test]
    fn test_total_accumulates_across_calls() {
        let tracker = CostTracker::new(100.0);
        tracker.track_usage("gpt-4", 1000, 0, ProviderKind::OpenAi); // 0.03
        tracker.track_usage("gpt-4", 1000, 0, ProviderKind::OpenAi); // 0.03
        assert!((tracker.total_cost() - 0.06).abs() < 1e-9);
        let stats = tracker.stats();
        assert_eq!(stats.total_requests, 2);
    }

    #[test]
    fn test_stats_keeps_only_last_ten_recent() {
        let tracker = CostTracker::new(1_000_000.0);
        for i in 0..15 {
            tracker.track_usage(&format!("gpt-4-{i}"), 100, 100, ProviderKind::OpenAi);
        }
        let stats = tracker.stats();
        assert_eq!(stats.total_requests, 15);
        assert_eq!(stats.recent_requests.len(), 10);
        assert_eq!(stats.recent_requests[0].model, "gpt-4-5");
        assert_eq!(stats.recent_requests[9].model, "gpt-4-14");
    }

    #[test]
    fn test_alert_fires_once_per_crossing() {
        let tracker = CostTracker::new(0.05);
        tracker.track_usage("gpt-4", 1000, 0, ProviderKind::OpenAi); // total 0.03, below
        {
            let state = tracker.lock();
            assert!(!state.alerted);
        }
        tracker.track_usage("gpt-4", 1000, 0, ProviderKind::OpenAi); // total 0.06, crosses
        {
            let state = tracker.lock();
            assert!(state.alerted);
        }
        // Further calls stay alerted; no state flapping.
        tracker.track_usage("gpt-4", 1000, 0, ProviderKind::OpenAi);
        let state = tracker.lock();
        assert!(state.alerted);
    }

    #[test]
    fn test_stats_on_empty_tracker() {
        let tracker = CostTracker::new(100.0);
        let stats = tracker.stats();
        assert_eq!(stats.total_requests, 0);
        assert!(stats.recent_requests.is_empty());
        assert!(stats.total_cost.abs() < f64::EPSILON);
    }
}
