//! Background market-health monitor.
//!
//! On a fixed cadence the monitor pulls every [`MarketHealth`] reading that
//! arrived since the previous tick from a [`MarketHealthSource`], stores each
//! in the kill switch and evaluates the trigger conditions against it, in
//! arrival order. A poll that yields nothing, or fails, does not refresh the
//! data timestamp, so a silent feed eventually trips the staleness trigger.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use sentinel_core::types::{MarketHealth, MarketSnapshot};

use crate::kill_switch::KillSwitch;

/// Where the monitor gets market-health readings from.
#[async_trait]
pub trait MarketHealthSource: Send + Sync {
    /// Every reading received since the previous poll, oldest first.
    async fn poll(&self) -> anyhow::Result<Vec<MarketHealth>>;
}

pub struct MarketMonitor {
    kill_switch: Arc<KillSwitch>,
    source: Arc<dyn MarketHealthSource>,
    interval: Duration,
}

impl MarketMonitor {
    pub fn new(
        kill_switch: Arc<KillSwitch>,
        source: Arc<dyn MarketHealthSource>,
        interval: Duration,
    ) -> Self {
        Self {
            kill_switch,
            source,
            interval,
        }
    }

    /// One monitor step. Returns `true` if any reading, or the staleness
    /// check, breached a trigger condition.
    pub async fn tick(&self) -> bool {
        let readings = match self.source.poll().await {
            Ok(readings) => readings,
            Err(e) => {
                tracing::warn!(error = %e, "market health poll failed");
                Vec::new()
            }
        };
        if readings.is_empty() {
            return self.kill_switch.check_triggers(&MarketSnapshot::default());
        }

        let mut breached = false;
        for health in &readings {
            self.kill_switch.record_market_data(health);
            breached |= self.kill_switch.check_triggers(&health.snapshot());
        }
        breached
    }

    /// Run until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "market monitor started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                _ = cancel.cancelled() => break,
            }
        }

        tracing::info!("market monitor stopped");
    }
}
