//! Order admission.
//!
//! [`RiskGate`] combines the shared [`KillSwitch`] with the per-order
//! [`RiskPipeline`] and turns the outcome into an [`OrderValidationResult`].
//! Validation never mutates risk state and never returns an error: every
//! refusal is a structured result.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sentinel_core::config::RiskLimits;
use sentinel_core::types::OrderRequest;

use crate::kill_switch::KillSwitch;
use crate::pipeline::{RiskPipeline, RiskReject};

/// Outcome category of an order validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Approved,
    Rejected,
    KillSwitch,
}

/// Result of validating one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderValidationResult {
    pub status: ValidationStatus,
    /// Empty when approved.
    pub reason: String,
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl OrderValidationResult {
    pub fn approved() -> Self {
        Self {
            status: ValidationStatus::Approved,
            reason: String::new(),
            details: Map::new(),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == ValidationStatus::Approved
    }
}

impl From<RiskReject> for OrderValidationResult {
    fn from(reject: RiskReject) -> Self {
        let reason = reject.to_string();
        let mut details = Map::new();
        let status = match &reject {
            RiskReject::KillSwitchActive { .. } => {
                details.insert("kill_switch".into(), Value::Bool(true));
                ValidationStatus::KillSwitch
            }
            RiskReject::RiskLimitExceeded { limit, .. } => {
                details.insert("violated_limit".into(), Value::from(limit.as_str()));
                ValidationStatus::Rejected
            }
            RiskReject::UnreachableGate { .. } => {
                details.insert("gate_unreachable".into(), Value::Bool(true));
                ValidationStatus::Rejected
            }
        };
        Self {
            status,
            reason,
            details,
        }
    }
}

/// Anything that can admit or refuse an order: the in-process
/// [`RiskGate`] or a remote one reached over HTTP.
#[async_trait]
pub trait OrderGate: Send + Sync {
    async fn validate_order(&self, order: &OrderRequest) -> OrderValidationResult;
}

/// In-process risk gate.
pub struct RiskGate {
    kill_switch: Arc<KillSwitch>,
    pipeline: RiskPipeline,
    limits: RiskLimits,
}

impl RiskGate {
    pub fn new(kill_switch: Arc<KillSwitch>, limits: RiskLimits) -> Self {
        Self {
            kill_switch,
            pipeline: RiskPipeline::from_limits(&limits),
            limits,
        }
    }

    pub fn kill_switch(&self) -> &Arc<KillSwitch> {
        &self.kill_switch
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Validate an order. An active kill switch dominates every limit.
    pub fn validate(&self, order: &OrderRequest) -> OrderValidationResult {
        match self
            .kill_switch
            .while_clear(|| self.pipeline.check_order(order))
        {
            Ok(()) => {
                self.warn_on_fee_impact(order);
                OrderValidationResult::approved()
            }
            Err(reject) => {
                tracing::info!(
                    strategy = %order.strategy_id,
                    symbol = %order.symbol,
                    side = %order.side,
                    reason = %reject,
                    "order rejected"
                );
                reject.into()
            }
        }
    }

    fn warn_on_fee_impact(&self, order: &OrderRequest) {
        if !(order.nav > 0.0) {
            return;
        }
        let impact = 2.0 * self.limits.fee_rate * order.quantity / order.nav;
        if impact > self.limits.fee_impact_warn_pct {
            tracing::warn!(
                symbol = %order.symbol,
                fee_impact_pct = impact * 100.0,
                threshold_pct = self.limits.fee_impact_warn_pct * 100.0,
                "estimated round-trip fees are a large share of NAV"
            );
        }
    }
}

#[async_trait]
impl OrderGate for RiskGate {
    async fn validate_order(&self, order: &OrderRequest) -> OrderValidationResult {
        self.validate(order)
    }
}
