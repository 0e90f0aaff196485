//! Maximum position size check.
//!
//! Rejects buys that would take the position in the symbol above the
//! configured fraction of NAV. Sells only shrink exposure and pass.

use sentinel_core::types::{OrderRequest, Side};

use crate::pipeline::{RiskCheck, RiskLimit, RiskReject};

/// Rejects orders that would breach the maximum position fraction.
pub struct MaxPositionSizeCheck {
    /// Maximum position notional as a fraction of NAV.
    pub max_position_pct: f64,
}

impl RiskCheck for MaxPositionSizeCheck {
    fn name(&self) -> &str {
        "max_position_size"
    }

    fn check(&self, order: &OrderRequest) -> Result<(), RiskReject> {
        if order.side == Side::Sell {
            return Ok(());
        }

        // Without a positive NAV the size cannot be judged; refuse.
        if !(order.nav > 0.0) {
            return Err(RiskReject::limit(
                RiskLimit::MaxPositionSize,
                format!("NAV {} is not positive", order.nav),
            ));
        }

        let resulting = order.existing_position_value.max(0.0) + order.quantity;
        let fraction = resulting / order.nav;
        if fraction <= self.max_position_pct {
            return Ok(());
        }

        Err(RiskReject::limit(
            RiskLimit::MaxPositionSize,
            format!(
                "position {:.2} is {:.1}% of NAV {:.2}, limit {:.1}%",
                resulting,
                fraction * 100.0,
                order.nav,
                self.max_position_pct * 100.0
            ),
        ))
    }
}
