//! Market-health signals consumed by the kill switch.

use serde::{Deserialize, Serialize};

/// Live health metrics pushed by the market-data monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketHealth {
    /// Perpetual funding rate as a fraction (0.0005 = 5 bps).
    pub funding_rate: f64,
    /// 99th percentile exchange API latency in milliseconds.
    pub api_latency_p99_ms: f64,
    /// Divergence between reference and venue price, in basis points.
    pub price_divergence_bps: f64,
    /// Equity drop over the last bar as a fraction, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity_drop_pct: Option<f64>,
}

impl MarketHealth {
    /// The part of this reading evaluated at trigger time rather than stored.
    pub fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            equity_drop_pct: self.equity_drop_pct,
        }
    }
}

/// Per-evaluation input to trigger checks.
///
/// An empty snapshot is valid: only the stored state is evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Equity drop over the last bar as a fraction.
    #[serde(default)]
    pub equity_drop_pct: Option<f64>,
}
