//! Cost accounting records and snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::ProviderKind;

/// One tracked completion. Appended, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecord {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub provider: ProviderKind,
    pub input_tokens: u32,
    pub output_tokens: u32,
    /// Cost of this call in USD.
    pub cost: f64,
}

/// Read-only snapshot of the cost tracker state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostStats {
    /// Running total in USD since process start.
    pub total_cost: f64,
    pub total_requests: usize,
    /// The 10 most recent records, oldest first.
    pub recent_requests: Vec<CostRecord>,
}
