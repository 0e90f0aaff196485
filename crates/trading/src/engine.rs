//! Trading engine — wires all components and manages lifecycle.
//!
//! [`TradingEngine`] owns the shared state (kill switch, risk gate, ledger,
//! decision executor, pushed market-health feed) and spawns the HTTP server
//! and the market monitor.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use sentinel_core::config::{AppConfig, GateMode};
use sentinel_core::types::{StrategyId, Symbol};
use sentinel_ledger::Ledger;
use sentinel_risk::{KillSwitch, MarketMonitor, OrderGate, RemoteRiskGate, RiskGate};

use crate::executor::DecisionExecutor;
use crate::feed::PushedHealthSource;
use crate::server;

/// Shared state accessible by all engine components.
pub struct SharedState {
    pub gate: Arc<RiskGate>,
    pub ledger: Arc<Ledger>,
    pub executor: Arc<DecisionExecutor>,
    pub feed: Arc<PushedHealthSource>,
    /// The symbol the portfolio is marked against.
    pub symbol: Symbol,
    pub config: AppConfig,
}

impl SharedState {
    /// Build every component from configuration.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let kill_switch = Arc::new(KillSwitch::new(config.kill_switch.clone()));
        let gate = Arc::new(RiskGate::new(kill_switch, config.risk.clone()));
        let ledger = Arc::new(Ledger::new(
            config.ledger.initial_balance,
            config.ledger.default_leverage,
        ));

        let order_gate: Arc<dyn OrderGate> = match config.gate.mode {
            GateMode::Local => gate.clone(),
            GateMode::Remote => {
                tracing::info!(url = %config.gate.url, "validating orders on remote risk gate");
                Arc::new(RemoteRiskGate::from_config(&config.gate)?)
            }
        };
        let symbol = Symbol::new(config.trading.symbol.clone());
        let executor = Arc::new(DecisionExecutor::new(
            StrategyId::new(config.trading.strategy_id.clone()),
            symbol.clone(),
            order_gate,
            ledger.clone(),
        ));

        Ok(Self {
            gate,
            ledger,
            executor,
            feed: Arc::new(PushedHealthSource::new()),
            symbol,
            config,
        })
    }
}

/// The main trading engine.
pub struct TradingEngine {
    state: Arc<SharedState>,
    cancel: CancellationToken,
}

impl TradingEngine {
    /// Build a new engine from configuration.
    pub fn new(config: AppConfig) -> Result<Self> {
        Ok(Self {
            state: Arc::new(SharedState::from_config(config)?),
            cancel: CancellationToken::new(),
        })
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// The combined HTTP router, without binding a socket.
    pub fn router(&self) -> Router {
        server::build_router(self.state.clone())
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the trading engine.
    ///
    /// Spawns the HTTP server and the market monitor, then blocks until
    /// SIGINT or cancellation.
    pub async fn run(self) -> Result<()> {
        let config = &self.state.config;
        let cancel = self.cancel.clone();

        tracing::info!(
            strategy = %config.trading.strategy_id,
            symbol = %self.state.symbol,
            gate = ?config.gate.mode,
            initial_balance = config.ledger.initial_balance,
            "engine starting"
        );

        // ── 1. HTTP server ───────────────────────────────────────
        let server_state = self.state.clone();
        let server_cancel = cancel.clone();
        let port = config.server.port;
        let server_task = tokio::spawn(async move {
            if let Err(e) = server::run_server(server_state, port, server_cancel.clone()).await {
                tracing::error!(error = %e, "HTTP server failed");
                server_cancel.cancel();
            }
        });

        // ── 2. Market monitor ────────────────────────────────────
        let monitor = MarketMonitor::new(
            self.state.gate.kill_switch().clone(),
            self.state.feed.clone(),
            Duration::from_millis(config.monitor.interval_ms),
        );
        let monitor_task = tokio::spawn(monitor.run(cancel.clone()));

        // ── Shutdown signal ──────────────────────────────────────
        tokio::select! {
            _ = signal::ctrl_c() => {
                tracing::info!("received SIGINT, shutting down");
            }
            _ = cancel.cancelled() => {
                tracing::info!("cancellation token triggered");
            }
        }

        cancel.cancel();
        let (server_res, monitor_res) = tokio::join!(server_task, monitor_task);
        if let Err(e) = server_res {
            tracing::error!(error = %e, "HTTP server task panicked");
        }
        if let Err(e) = monitor_res {
            tracing::error!(error = %e, "market monitor task panicked");
        }

        tracing::info!("engine stopped");
        Ok(())
    }
}
