//! # sentinel-risk
//!
//! Order admission control. A latching kill switch guards all trading; while
//! it is clear, every order passes through a chain of per-order limit checks
//! (confidence, leverage, position size, open position count). Also provides
//! the HTTP control/validation router, a fail-closed client for a remote
//! gate and the background market-health monitor.

pub mod checks;
pub mod client;
pub mod gate;
pub mod kill_switch;
pub mod monitor;
pub mod pipeline;
pub mod server;
pub mod triggers;

pub use checks::{
    MaxActivePositionsCheck, MaxLeverageCheck, MaxPositionSizeCheck, MinConfidenceCheck,
};
pub use client::RemoteRiskGate;
pub use gate::{OrderGate, OrderValidationResult, RiskGate, ValidationStatus};
pub use kill_switch::{KillSwitch, RiskState, RiskStateSnapshot};
pub use monitor::{MarketHealthSource, MarketMonitor};
pub use pipeline::{RiskCheck, RiskLimit, RiskPipeline, RiskReject};
pub use server::{gate_router, ControlResponse, GateServerState};
pub use triggers::{Breach, Trigger};
