//! Kill switch trigger conditions.
//!
//! Five independent conditions, any one of which is enough to halt trading.
//! Comparisons are written as `!(value <= limit)` so that a NaN metric
//! counts as a breach: a feed reporting garbage is treated like a feed
//! reporting danger.

use sentinel_core::config::KillSwitchThresholds;
use sentinel_core::types::{MarketSnapshot, Timestamp};

use crate::kill_switch::RiskState;

/// A kill switch trigger condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// No market data for longer than the staleness limit.
    Staleness,
    FundingSpike,
    LatencySpike,
    PriceDivergence,
    /// Single-bar equity drop beyond the limit.
    EquityDrop,
}

/// A breached trigger and its human-readable reason.
#[derive(Debug, Clone, PartialEq)]
pub struct Breach {
    pub trigger: Trigger,
    pub reason: String,
}

impl Trigger {
    /// Evaluation order. The first breach supplies the halt reason.
    pub const ALL: [Trigger; 5] = [
        Trigger::Staleness,
        Trigger::FundingSpike,
        Trigger::LatencySpike,
        Trigger::PriceDivergence,
        Trigger::EquityDrop,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Trigger::Staleness => "staleness",
            Trigger::FundingSpike => "funding_spike",
            Trigger::LatencySpike => "latency_spike",
            Trigger::PriceDivergence => "price_divergence",
            Trigger::EquityDrop => "equity_drop",
        }
    }

    /// Returns the halt reason if this condition is breached.
    pub fn evaluate(
        &self,
        state: &RiskState,
        market: &MarketSnapshot,
        limits: &KillSwitchThresholds,
        now: Timestamp,
    ) -> Option<String> {
        match self {
            Trigger::Staleness => {
                let age = now.duration_since(&state.last_data_update).as_secs_f64();
                (age > limits.staleness_limit_secs).then(|| {
                    format!(
                        "market data outage: no update for {:.1}s (limit {:.1}s)",
                        age, limits.staleness_limit_secs
                    )
                })
            }
            Trigger::FundingSpike => {
                let rate = state.funding_rate;
                (!(rate.abs() <= limits.funding_rate_limit)).then(|| {
                    format!(
                        "funding rate spike: {:.4} exceeds {:.4}",
                        rate, limits.funding_rate_limit
                    )
                })
            }
            Trigger::LatencySpike => {
                let p99 = state.api_latency_p99_ms;
                (!(p99 <= limits.api_latency_limit_ms)).then(|| {
                    format!(
                        "API latency spike: p99 {:.0}ms exceeds {:.0}ms",
                        p99, limits.api_latency_limit_ms
                    )
                })
            }
            Trigger::PriceDivergence => {
                let bps = state.price_divergence_bps;
                (!(bps <= limits.price_divergence_limit_bps)).then(|| {
                    format!(
                        "price divergence: {:.1} bps exceeds {:.1} bps",
                        bps, limits.price_divergence_limit_bps
                    )
                })
            }
            Trigger::EquityDrop => {
                let drop = market.equity_drop_pct?;
                (!(drop <= limits.equity_drop_limit)).then(|| {
                    format!(
                        "equity drop: {:.2}% in one bar exceeds {:.2}%",
                        drop * 100.0,
                        limits.equity_drop_limit * 100.0
                    )
                })
            }
        }
    }
}

/// The first breached condition in [`Trigger::ALL`] order, if any.
pub fn first_breach(
    state: &RiskState,
    market: &MarketSnapshot,
    limits: &KillSwitchThresholds,
    now: Timestamp,
) -> Option<Breach> {
    Trigger::ALL.iter().find_map(|trigger| {
        trigger
            .evaluate(state, market, limits, now)
            .map(|reason| Breach {
                trigger: *trigger,
                reason,
            })
    })
}
