//! Latching kill switch over the shared [`RiskState`].
//!
//! All state lives behind one `parking_lot::RwLock`, so the halted flag, its
//! reason and the market-health metrics are always observed together. A
//! reader can never see a halt without a reason or a reason without a halt:
//! both are the single `Option<Halt>` field.
//!
//! The switch latches. Trigger conditions clearing on their own never
//! resume trading; only [`KillSwitch::deactivate`] does.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use sentinel_core::config::KillSwitchThresholds;
use sentinel_core::types::{MarketHealth, MarketSnapshot, Timestamp};

use crate::pipeline::RiskReject;
use crate::triggers;

/// Why and when the switch was tripped.
#[derive(Debug, Clone, PartialEq)]
struct Halt {
    reason: String,
    activated_at: Timestamp,
}

/// Process-wide risk state. One instance per [`KillSwitch`].
#[derive(Debug, Clone)]
pub struct RiskState {
    /// When the monitor last delivered market data.
    pub last_data_update: Timestamp,
    /// Funding rate as a fraction.
    pub funding_rate: f64,
    pub api_latency_p99_ms: f64,
    pub price_divergence_bps: f64,
    halt: Option<Halt>,
}

impl RiskState {
    pub(crate) fn new(now: Timestamp) -> Self {
        Self {
            last_data_update: now,
            funding_rate: 0.0,
            api_latency_p99_ms: 0.0,
            price_divergence_bps: 0.0,
            halt: None,
        }
    }

    pub fn kill_switch_active(&self) -> bool {
        self.halt.is_some()
    }

    pub fn kill_switch_reason(&self) -> Option<&str> {
        self.halt.as_ref().map(|h| h.reason.as_str())
    }
}

/// Read-only view of [`RiskState`] for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskStateSnapshot {
    pub kill_switch_active: bool,
    pub kill_switch_reason: Option<String>,
    pub activated_at: Option<Timestamp>,
    pub last_data_update: Timestamp,
    pub funding_rate: f64,
    pub api_latency_p99_ms: f64,
    pub price_divergence_bps: f64,
}

/// The shared circuit breaker consulted by every order validation.
pub struct KillSwitch {
    thresholds: KillSwitchThresholds,
    state: RwLock<RiskState>,
}

impl KillSwitch {
    /// Create a clear kill switch. Market data counts as fresh at creation.
    pub fn new(thresholds: KillSwitchThresholds) -> Self {
        Self {
            thresholds,
            state: RwLock::new(RiskState::new(Timestamp::now())),
        }
    }

    pub fn thresholds(&self) -> &KillSwitchThresholds {
        &self.thresholds
    }

    /// Returns `true` while trading is halted.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.read().kill_switch_active()
    }

    /// The reason trading was halted, if it is.
    pub fn reason(&self) -> Option<String> {
        self.state.read().kill_switch_reason().map(str::to_owned)
    }

    /// Halt trading.
    ///
    /// If already halted the original reason is kept. Returns `true` only
    /// when this call performed the transition.
    pub fn activate(&self, reason: impl Into<String>) -> bool {
        let mut state = self.state.write();
        Self::halt(&mut state, reason.into(), Timestamp::now())
    }

    /// Resume trading. Always permitted, including when already clear.
    pub fn deactivate(&self) {
        let previous = self.state.write().halt.take();
        match previous {
            Some(halt) => tracing::warn!(
                previous_reason = %halt.reason,
                "kill switch deactivated, trading re-enabled"
            ),
            None => tracing::debug!("kill switch deactivate requested while clear"),
        }
    }

    /// Store a market-health reading received now.
    pub fn record_market_data(&self, health: &MarketHealth) {
        self.record_market_data_at(health, Timestamp::now());
    }

    /// Store a market-health reading received at `at`.
    pub fn record_market_data_at(&self, health: &MarketHealth, at: Timestamp) {
        let mut state = self.state.write();
        state.last_data_update = at;
        state.funding_rate = health.funding_rate;
        state.api_latency_p99_ms = health.api_latency_p99_ms;
        state.price_divergence_bps = health.price_divergence_bps;
    }

    /// Evaluate every trigger condition against the stored state and
    /// `market`, halting on the first breach.
    ///
    /// Returns `true` if any condition is breached (whether or not the
    /// switch was already active); `false` leaves the state untouched.
    pub fn check_triggers(&self, market: &MarketSnapshot) -> bool {
        self.check_triggers_at(market, Timestamp::now())
    }

    /// [`check_triggers`](Self::check_triggers) evaluated at a given time.
    pub fn check_triggers_at(&self, market: &MarketSnapshot, now: Timestamp) -> bool {
        let mut state = self.state.write();
        match triggers::first_breach(&state, market, &self.thresholds, now) {
            Some(breach) => {
                tracing::warn!(trigger = breach.trigger.name(), "kill switch trigger breached");
                Self::halt(&mut state, breach.reason, now);
                true
            }
            None => false,
        }
    }

    /// Run `f` while holding the state read lock, unless trading is halted.
    ///
    /// An activation cannot land between the halt check and `f`, so a
    /// caller that gets `Ok` knows the switch was clear for the whole call.
    /// `f` must not call back into this kill switch.
    pub fn while_clear<T>(
        &self,
        f: impl FnOnce() -> Result<T, RiskReject>,
    ) -> Result<T, RiskReject> {
        let state = self.state.read();
        if let Some(halt) = &state.halt {
            return Err(RiskReject::KillSwitchActive {
                reason: halt.reason.clone(),
            });
        }
        f()
    }

    pub fn snapshot(&self) -> RiskStateSnapshot {
        let state = self.state.read();
        RiskStateSnapshot {
            kill_switch_active: state.kill_switch_active(),
            kill_switch_reason: state.halt.as_ref().map(|h| h.reason.clone()),
            activated_at: state.halt.as_ref().map(|h| h.activated_at),
            last_data_update: state.last_data_update,
            funding_rate: state.funding_rate,
            api_latency_p99_ms: state.api_latency_p99_ms,
            price_divergence_bps: state.price_divergence_bps,
        }
    }

    fn halt(state: &mut RiskState, reason: String, now: Timestamp) -> bool {
        if let Some(existing) = &state.halt {
            tracing::debug!(
                kept_reason = %existing.reason,
                ignored_reason = %reason,
                "kill switch already active"
            );
            return false;
        }
        tracing::error!(reason = %reason, "KILL SWITCH ACTIVATED, trading halted");
        state.halt = Some(Halt {
            reason,
            activated_at: now,
        });
        true
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new(KillSwitchThresholds::default())
    }
}
