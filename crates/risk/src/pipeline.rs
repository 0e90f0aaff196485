//! Risk check pipeline.
//!
//! While the kill switch is clear, every order passes through a sequence of
//! [`RiskCheck`] implementations. The first check that fails short-circuits
//! the pipeline and returns the rejection.

use std::fmt;

use serde::{Deserialize, Serialize};

use sentinel_core::config::RiskLimits;
use sentinel_core::types::OrderRequest;

use crate::checks::{
    MaxActivePositionsCheck, MaxLeverageCheck, MaxPositionSizeCheck, MinConfidenceCheck,
};

/// A named per-order limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLimit {
    MinConfidence,
    MaxLeverage,
    MaxPositionSize,
    MaxActivePositions,
}

impl RiskLimit {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLimit::MinConfidence => "min_confidence",
            RiskLimit::MaxLeverage => "max_leverage",
            RiskLimit::MaxPositionSize => "max_position_size",
            RiskLimit::MaxActivePositions => "max_active_positions",
        }
    }
}

impl fmt::Display for RiskLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason an order is refused admission.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskReject {
    /// The kill switch is active; every order is refused.
    #[error("trading halted: kill switch active: {reason}")]
    KillSwitchActive { reason: String },
    /// A per-order limit was violated.
    #[error("{limit}: {detail}")]
    RiskLimitExceeded { limit: RiskLimit, detail: String },
    /// A remote gate could not be asked. Never treated as approval.
    #[error("risk gate unreachable: {detail}")]
    UnreachableGate { detail: String },
}

impl RiskReject {
    pub(crate) fn limit(limit: RiskLimit, detail: impl Into<String>) -> Self {
        RiskReject::RiskLimitExceeded {
            limit,
            detail: detail.into(),
        }
    }
}

/// Trait for individual pre-trade risk checks.
pub trait RiskCheck: Send + Sync {
    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &str;

    /// Evaluate the order, returning `Err` if it must be blocked.
    fn check(&self, order: &OrderRequest) -> Result<(), RiskReject>;
}

/// Pipeline that runs all registered risk checks in insertion order.
pub struct RiskPipeline {
    checks: Vec<Box<dyn RiskCheck>>,
}

impl RiskPipeline {
    /// Create a new, empty risk pipeline.
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// The standard pipeline: confidence, leverage, position size, then
    /// active position count.
    pub fn from_limits(limits: &RiskLimits) -> Self {
        let mut pipeline = Self::new();
        pipeline.add_check(MinConfidenceCheck {
            min_confidence: limits.min_confidence,
        });
        pipeline.add_check(MaxLeverageCheck {
            max_leverage: limits.max_leverage,
        });
        pipeline.add_check(MaxPositionSizeCheck {
            max_position_pct: limits.max_position_pct,
        });
        pipeline.add_check(MaxActivePositionsCheck {
            max_active_positions: limits.max_active_positions,
        });
        pipeline
    }

    /// Append a risk check to the end of the pipeline.
    pub fn add_check(&mut self, check: impl RiskCheck + 'static) {
        self.checks.push(Box::new(check));
    }

    /// Run all checks, returning the first rejection.
    pub fn check_order(&self, order: &OrderRequest) -> Result<(), RiskReject> {
        for check in &self.checks {
            if let Err(reject) = check.check(order) {
                tracing::debug!(check = check.name(), %reject, "risk check failed");
                return Err(reject);
            }
        }
        Ok(())
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }
}

impl Default for RiskPipeline {
    fn default() -> Self {
        Self::new()
    }
}
