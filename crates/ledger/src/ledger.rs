//! Balance, open positions and trade history.
//!
//! Concurrency: buys and sells on one symbol are serialized by the
//! `DashMap` entry lock for that symbol; different symbols proceed in
//! parallel. Every mutation also holds the valuation fence for reading, so
//! valuation and re-initialization (which take it for writing) always see a
//! balance and a position set that belong together.
//!
//! Lock order: fence, then position shard, then cash, then trade log.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use sentinel_core::types::{DecisionContext, Side, Symbol, Timestamp};

use crate::position::Position;
use crate::trade::Trade;

/// Ledger operation errors. None of them mutate the ledger.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient balance: requested {requested:.2}, available {available:.2}")]
    InsufficientBalance { requested: f64, available: f64 },
    #[error("no open position in {0}")]
    PositionNotFound(Symbol),
    #[error("position already open in {0}")]
    PositionAlreadyOpen(Symbol),
    #[error("invalid order: {0}")]
    InvalidOrder(String),
}

/// Point-in-time portfolio figures, valued at a single price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub balance: f64,
    pub open_positions: usize,
    pub total_trades: usize,
    /// `(total_value - initial) / initial * 100`.
    pub total_return_pct: f64,
    /// Sum of profit over every sell since initialization.
    pub realized_pnl: f64,
}

#[derive(Debug)]
struct Cash {
    initial: f64,
    balance: f64,
    realized_pnl: f64,
}

impl Cash {
    fn new(initial: f64) -> Self {
        Self {
            initial,
            balance: initial,
            realized_pnl: 0.0,
        }
    }
}

#[derive(Debug, Default)]
struct TradeLog {
    next_id: u64,
    trades: Vec<Trade>,
}

/// Paper-trading ledger.
pub struct Ledger {
    default_leverage: f64,
    positions: DashMap<Symbol, Position>,
    cash: Mutex<Cash>,
    log: Mutex<TradeLog>,
    fence: RwLock<()>,
}

struct Execution<'a> {
    symbol: &'a Symbol,
    side: Side,
    price: f64,
    notional: f64,
    confidence: f64,
    profit: Option<f64>,
    decision: Option<&'a DecisionContext>,
}

impl Ledger {
    pub fn new(initial_balance: f64, default_leverage: f64) -> Self {
        Self {
            default_leverage,
            positions: DashMap::new(),
            cash: Mutex::new(Cash::new(initial_balance)),
            log: Mutex::new(TradeLog::default()),
            fence: RwLock::new(()),
        }
    }

    /// Open a position in `symbol` worth `notional` at `price`.
    ///
    /// Fails without touching the ledger if `notional` exceeds the free
    /// balance or a position in `symbol` is already open.
    pub fn execute_buy(
        &self,
        symbol: &Symbol,
        price: f64,
        notional: f64,
        confidence: f64,
        decision: Option<&DecisionContext>,
    ) -> Result<Trade, LedgerError> {
        ensure_positive("price", price)?;
        ensure_positive("notional", notional)?;

        let _fence = self.fence.read();
        let slot = match self.positions.entry(symbol.clone()) {
            Entry::Occupied(_) => return Err(LedgerError::PositionAlreadyOpen(symbol.clone())),
            Entry::Vacant(slot) => slot,
        };

        let mut cash = self.cash.lock();
        if notional > cash.balance {
            return Err(LedgerError::InsufficientBalance {
                requested: notional,
                available: cash.balance,
            });
        }
        cash.balance -= notional;

        let now = Timestamp::now();
        slot.insert(Position {
            symbol: symbol.clone(),
            entry_price: price,
            notional,
            leverage: self.default_leverage,
            opened_at: now,
        });

        let trade = self.record(
            Execution {
                symbol,
                side: Side::Buy,
                price,
                notional,
                confidence,
                profit: None,
                decision,
            },
            now,
        );
        tracing::info!(
            trade_id = trade.id,
            symbol = %symbol,
            price,
            notional,
            balance = cash.balance,
            "buy executed"
        );
        Ok(trade)
    }

    /// Close the whole position in `symbol` at `price`.
    pub fn execute_sell(
        &self,
        symbol: &Symbol,
        price: f64,
        confidence: f64,
        decision: Option<&DecisionContext>,
    ) -> Result<Trade, LedgerError> {
        ensure_positive("price", price)?;

        let _fence = self.fence.read();
        let position = match self.positions.entry(symbol.clone()) {
            Entry::Occupied(slot) => slot,
            Entry::Vacant(_) => return Err(LedgerError::PositionNotFound(symbol.clone())),
        };

        let mut cash = self.cash.lock();
        let position = position.remove();
        let profit = position.pnl_at(price);
        cash.balance += position.notional + profit;
        cash.realized_pnl += profit;

        let trade = self.record(
            Execution {
                symbol,
                side: Side::Sell,
                price,
                notional: position.notional,
                confidence,
                profit: Some(profit),
                decision,
            },
            Timestamp::now(),
        );
        tracing::info!(
            trade_id = trade.id,
            symbol = %symbol,
            entry_price = position.entry_price,
            price,
            profit,
            balance = cash.balance,
            "sell executed"
        );
        Ok(trade)
    }

    fn record(&self, exec: Execution<'_>, at: Timestamp) -> Trade {
        let mut log = self.log.lock();
        log.next_id += 1;
        let trade = Trade {
            id: log.next_id,
            symbol: exec.symbol.clone(),
            side: exec.side,
            price: exec.price,
            notional: exec.notional,
            confidence: exec.confidence,
            profit: exec.profit,
            context: exec.decision.cloned().unwrap_or_default(),
            executed_at: at,
        };
        log.trades.push(trade.clone());
        trade
    }

    /// Free balance plus every open position marked at `current_price`.
    ///
    /// All positions are marked at the one price given.
    pub fn portfolio_value(&self, current_price: f64) -> f64 {
        let _fence = self.fence.write();
        self.value_locked(current_price)
    }

    fn value_locked(&self, current_price: f64) -> f64 {
        let balance = self.cash.lock().balance;
        let open: f64 = self
            .positions
            .iter()
            .map(|p| p.value().value_at(current_price))
            .sum();
        balance + open
    }

    pub fn portfolio_summary(&self, current_price: f64) -> PortfolioSummary {
        let _fence = self.fence.write();
        let total_value = self.value_locked(current_price);
        let (initial, balance, realized_pnl) = {
            let cash = self.cash.lock();
            (cash.initial, cash.balance, cash.realized_pnl)
        };
        let total_return_pct = if initial > 0.0 {
            (total_value - initial) / initial * 100.0
        } else {
            0.0
        };
        PortfolioSummary {
            total_value,
            balance,
            open_positions: self.positions.len(),
            total_trades: self.log.lock().trades.len(),
            total_return_pct,
            realized_pnl,
        }
    }

    pub fn balance(&self) -> f64 {
        self.cash.lock().balance
    }

    pub fn initial_balance(&self) -> f64 {
        self.cash.lock().initial
    }

    /// Leverage recorded on every position this ledger opens.
    pub fn default_leverage(&self) -> f64 {
        self.default_leverage
    }

    pub fn position(&self, symbol: &Symbol) -> Option<Position> {
        self.positions.get(symbol).map(|p| p.clone())
    }

    /// All open positions, ordered by symbol.
    pub fn open_positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> =
            self.positions.iter().map(|e| e.value().clone()).collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        positions
    }

    pub fn open_position_count(&self) -> usize {
        self.positions.len()
    }

    /// Trade history in execution order.
    pub fn trade_history(&self) -> Vec<Trade> {
        self.log.lock().trades.clone()
    }

    pub fn trade_count(&self) -> usize {
        self.log.lock().trades.len()
    }

    /// Discard all positions and history and start over with
    /// `initial_balance`.
    pub fn reinitialize(&self, initial_balance: f64) {
        let _fence = self.fence.write();
        self.positions.clear();
        *self.cash.lock() = Cash::new(initial_balance);
        *self.log.lock() = TradeLog::default();
        tracing::warn!(initial_balance, "ledger re-initialized");
    }
}

fn ensure_positive(field: &str, value: f64) -> Result<(), LedgerError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidOrder(format!(
            "{field} must be positive and finite, got {value}"
        )))
    }
}
