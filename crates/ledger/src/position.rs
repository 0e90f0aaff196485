//! Open positions.

use serde::{Deserialize, Serialize};

use sentinel_core::types::{Symbol, Timestamp};

/// A long position in a single symbol. At most one per symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub entry_price: f64,
    /// Quote-currency amount committed when the position was opened.
    pub notional: f64,
    pub leverage: f64,
    pub opened_at: Timestamp,
}

impl Position {
    /// Fractional price change since entry.
    pub fn return_at(&self, price: f64) -> f64 {
        price / self.entry_price - 1.0
    }

    /// Mark-to-market value of the position at `price`.
    pub fn value_at(&self, price: f64) -> f64 {
        self.notional * price / self.entry_price
    }

    /// Profit or loss if the position were closed at `price`.
    pub fn pnl_at(&self, price: f64) -> f64 {
        self.notional * self.return_at(price)
    }
}
