//! Maximum leverage check.

use sentinel_core::types::OrderRequest;

use crate::pipeline::{RiskCheck, RiskLimit, RiskReject};

/// Rejects orders requesting more leverage than allowed.
pub struct MaxLeverageCheck {
    pub max_leverage: f64,
}

impl RiskCheck for MaxLeverageCheck {
    fn name(&self) -> &str {
        "max_leverage"
    }

    fn check(&self, order: &OrderRequest) -> Result<(), RiskReject> {
        if order.leverage <= self.max_leverage {
            return Ok(());
        }
        Err(RiskReject::limit(
            RiskLimit::MaxLeverage,
            format!(
                "leverage {:.2} exceeds {:.2}",
                order.leverage, self.max_leverage
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_order;
    use sentinel_core::types::Side;

    #[test]
    fn test_within_limit_passes() {
        let check = MaxLeverageCheck { max_leverage: 3.0 };
        let mut order = test_order(Side::Buy);
        order.leverage = 3.0;
        assert!(check.check(&order).is_ok());
    }

    #[test]
    fn test_exceeds_limit_rejects() {
        let check = MaxLeverageCheck { max_leverage: 3.0 };
        let mut order = test_order(Side::Buy);
        order.leverage = 5.0;
        let result = check.check(&order);
        assert!(matches!(
            result,
            Err(RiskReject::RiskLimitExceeded {
                limit: RiskLimit::MaxLeverage,
                ..
            })
        ));
    }

    #[test]
    fn test_applies_to_sells_too() {
        let check = MaxLeverageCheck { max_leverage: 2.0 };
        let mut order = test_order(Side::Sell);
        order.leverage = 10.0;
        assert!(check.check(&order).is_err());
    }
}
