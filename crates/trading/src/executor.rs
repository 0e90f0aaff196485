//! Advisor decision → risk gate → ledger.
//!
//! [`DecisionExecutor`] turns a validated [`AdvisorDecision`] into an
//! [`OrderRequest`], asks the gate, and only on approval touches the
//! ledger. A rejected order is dropped with its reason; it never reaches
//! the ledger.
//!
//! Portfolio value is marked at one price, so an executor trades exactly
//! one symbol. Decisions for any other symbol fail before sizing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use sentinel_core::types::{
    Action, AdvisorDecision, OrderRequest, Side, StrategyId, Symbol, Timestamp,
};
use sentinel_ledger::{Ledger, LedgerError, Trade};
use sentinel_risk::{OrderGate, OrderValidationResult};

/// What became of one decision.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Nothing to do (hold).
    Skipped { reason: String },
    /// The gate refused the order.
    Rejected { validation: OrderValidationResult },
    Executed { trade: Trade },
    /// Not applicable to the ledger: another symbol, no position to
    /// close, or an approved order the ledger refused.
    Failed { reason: String },
}

impl ExecutionOutcome {
    fn failed(err: LedgerError) -> Self {
        ExecutionOutcome::Failed {
            reason: err.to_string(),
        }
    }
}

/// Running totals of decision outcomes.
#[derive(Debug, Default)]
pub struct ExecutorStats {
    pub executed: AtomicU64,
    pub rejected: AtomicU64,
    pub skipped: AtomicU64,
    pub failed: AtomicU64,
}

impl ExecutorStats {
    fn count(&self, outcome: &ExecutionOutcome) {
        let counter = match outcome {
            ExecutionOutcome::Skipped { .. } => &self.skipped,
            ExecutionOutcome::Rejected { .. } => &self.rejected,
            ExecutionOutcome::Executed { .. } => &self.executed,
            ExecutionOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct DecisionExecutor {
    strategy_id: StrategyId,
    symbol: Symbol,
    gate: Arc<dyn OrderGate>,
    ledger: Arc<Ledger>,
    stats: ExecutorStats,
}

impl DecisionExecutor {
    pub fn new(
        strategy_id: StrategyId,
        symbol: Symbol,
        gate: Arc<dyn OrderGate>,
        ledger: Arc<Ledger>,
    ) -> Self {
        Self {
            strategy_id,
            symbol,
            gate,
            ledger,
            stats: ExecutorStats::default(),
        }
    }

    /// The one symbol this executor trades.
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn stats(&self) -> &ExecutorStats {
        &self.stats
    }

    /// Act on `decision` for `symbol` at the current `price`.
    pub async fn execute(
        &self,
        symbol: &Symbol,
        price: f64,
        decision: &AdvisorDecision,
    ) -> ExecutionOutcome {
        let outcome = match decision.action {
            Action::Buy | Action::Sell if *symbol != self.symbol => {
                tracing::warn!(
                    symbol = %symbol,
                    traded = %self.symbol,
                    "decision for untraded symbol refused"
                );
                ExecutionOutcome::Failed {
                    reason: format!(
                        "symbol {symbol} is not traded here (trading {})",
                        self.symbol
                    ),
                }
            }
            Action::Hold => ExecutionOutcome::Skipped {
                reason: "advisor chose to hold".into(),
            },
            Action::Buy => self.buy(symbol, price, decision).await,
            Action::Sell => self.sell(symbol, price, decision).await,
        };
        self.stats.count(&outcome);
        outcome
    }

    async fn buy(
        &self,
        symbol: &Symbol,
        price: f64,
        decision: &AdvisorDecision,
    ) -> ExecutionOutcome {
        let nav = self.ledger.portfolio_value(price);
        let notional = decision.context.position_size * nav;
        let existing = self
            .ledger
            .position(symbol)
            .map(|p| p.value_at(price))
            .unwrap_or(0.0);

        let order = self.order(symbol, Side::Buy, notional, price, nav, existing, decision);
        let validation = self.gate.validate_order(&order).await;
        if !validation.is_approved() {
            return ExecutionOutcome::Rejected { validation };
        }

        match self.ledger.execute_buy(
            symbol,
            price,
            notional,
            decision.confidence,
            Some(&decision.context),
        ) {
            Ok(trade) => ExecutionOutcome::Executed { trade },
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "approved buy not applied");
                ExecutionOutcome::failed(e)
            }
        }
    }

    async fn sell(
        &self,
        symbol: &Symbol,
        price: f64,
        decision: &AdvisorDecision,
    ) -> ExecutionOutcome {
        // Nothing to close; the gate is not consulted.
        let Some(position) = self.ledger.position(symbol) else {
            return ExecutionOutcome::failed(LedgerError::PositionNotFound(symbol.clone()));
        };

        let nav = self.ledger.portfolio_value(price);
        let value = position.value_at(price);
        let order = self.order(symbol, Side::Sell, value, price, nav, value, decision);
        let validation = self.gate.validate_order(&order).await;
        if !validation.is_approved() {
            return ExecutionOutcome::Rejected { validation };
        }

        match self
            .ledger
            .execute_sell(symbol, price, decision.confidence, Some(&decision.context))
        {
            Ok(trade) => ExecutionOutcome::Executed { trade },
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "approved sell not applied");
                ExecutionOutcome::failed(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn order(
        &self,
        symbol: &Symbol,
        side: Side,
        quantity: f64,
        price: f64,
        nav: f64,
        existing_position_value: f64,
        decision: &AdvisorDecision,
    ) -> OrderRequest {
        OrderRequest {
            strategy_id: self.strategy_id.clone(),
            symbol: symbol.clone(),
            side,
            quantity,
            price,
            leverage: self.ledger.default_leverage(),
            confidence: decision.confidence,
            nav,
            existing_position_value,
            open_positions: self.ledger.open_position_count(),
            timestamp: Timestamp::now(),
        }
    }
}
