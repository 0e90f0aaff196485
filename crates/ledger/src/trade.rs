//! Immutable trade records.

use serde::{Deserialize, Serialize};

use sentinel_core::types::{DecisionContext, Side, Symbol, Timestamp};

/// One executed buy or sell. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Monotonically increasing, starting at 1 after each (re)initialization.
    pub id: u64,
    pub symbol: Symbol,
    pub side: Side,
    pub price: f64,
    pub notional: f64,
    pub confidence: f64,
    /// Realized profit; present on sells only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit: Option<f64>,
    /// Advisor context the trade was made on.
    #[serde(flatten)]
    pub context: DecisionContext,
    pub executed_at: Timestamp,
}
