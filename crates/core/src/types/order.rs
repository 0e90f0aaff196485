//! Order-related types: side, symbol, strategy identifier and the order
//! request submitted to the risk gate.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::timestamp::Timestamp;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy / open long.
    Buy,
    /// Sell / close long.
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Trading pair symbol (e.g., "BTC/USDT").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Symbol {
    /// Create a new symbol.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifies the strategy that produced an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyId(pub String);

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StrategyId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

/// A single trade attempt submitted for pre-trade validation.
///
/// `quantity` is a notional amount in quote currency, not base-asset units.
/// The request is immutable once built; every attempt gets its own instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub strategy_id: StrategyId,
    pub symbol: Symbol,
    pub side: Side,
    /// Notional order size in quote currency.
    pub quantity: f64,
    pub price: f64,
    pub leverage: f64,
    /// Advisor confidence in `[0, 1]`.
    pub confidence: f64,
    /// Current net asset value of the account.
    pub nav: f64,
    /// Notional value of the position already held in `symbol`.
    #[serde(default)]
    pub existing_position_value: f64,
    /// Number of positions currently open across all symbols.
    #[serde(default)]
    pub open_positions: usize,
    pub timestamp: Timestamp,
}

impl OrderRequest {
    /// Whether this order would open a new position rather than grow or
    /// reduce an existing one.
    pub fn is_opening(&self) -> bool {
        self.side == Side::Buy && self.existing_position_value <= 0.0
    }
}
