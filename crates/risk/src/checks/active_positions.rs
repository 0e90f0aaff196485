//! Maximum concurrently open positions check.

use sentinel_core::types::OrderRequest;

use crate::pipeline::{RiskCheck, RiskLimit, RiskReject};

/// Rejects orders that would open a position once the cap is reached.
///
/// Only opening orders are counted; closing or adding to an existing
/// position does not change the number of open positions.
pub struct MaxActivePositionsCheck {
    pub max_active_positions: usize,
}

impl RiskCheck for MaxActivePositionsCheck {
    fn name(&self) -> &str {
        "max_active_positions"
    }

    fn check(&self, order: &OrderRequest) -> Result<(), RiskReject> {
        if !order.is_opening() || order.open_positions < self.max_active_positions {
            return Ok(());
        }
        Err(RiskReject::limit(
            RiskLimit::MaxActivePositions,
            format!(
                "{} positions open, limit {}",
                order.open_positions, self.max_active_positions
            ),
        ))
    }
}
