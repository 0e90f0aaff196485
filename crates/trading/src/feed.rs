//! Market-health readings pushed in over HTTP.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use sentinel_core::types::MarketHealth;
use sentinel_risk::MarketHealthSource;

/// Queues pushed readings until the monitor drains them.
///
/// Every reading is kept, so a breach followed by a calm reading within one
/// monitor interval is still evaluated.
#[derive(Default)]
pub struct PushedHealthSource {
    pending: Mutex<VecDeque<MarketHealth>>,
}

impl PushedHealthSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, health: MarketHealth) {
        self.pending.lock().push_back(health);
    }

    /// Readings not yet taken by the monitor.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}

#[async_trait]
impl MarketHealthSource for PushedHealthSource {
    async fn poll(&self) -> anyhow::Result<Vec<MarketHealth>> {
        Ok(self.pending.lock().drain(..).collect())
    }
}
