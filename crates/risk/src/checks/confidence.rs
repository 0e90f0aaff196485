//! Minimum advisor confidence check.

use sentinel_core::types::OrderRequest;

use crate::pipeline::{RiskCheck, RiskLimit, RiskReject};

/// Rejects orders whose advisor confidence is below the configured floor.
pub struct MinConfidenceCheck {
    pub min_confidence: f64,
}

impl RiskCheck for MinConfidenceCheck {
    fn name(&self) -> &str {
        "min_confidence"
    }

    fn check(&self, order: &OrderRequest) -> Result<(), RiskReject> {
        // NaN confidence fails this comparison and is rejected.
        if order.confidence >= self.min_confidence {
            return Ok(());
        }
        Err(RiskReject::limit(
            RiskLimit::MinConfidence,
            format!(
                "confidence {:.2} below minimum {:.2}",
                order.confidence, self.min_confidence
            ),
        ))
    }
}
