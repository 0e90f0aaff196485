//! # sentinel-trading
//!
//! The trading agent: wires advisor decisions through the risk gate into
//! the ledger, feeds pushed market-health readings to the monitor and
//! serves the combined HTTP API. Library interface for integration tests.

pub mod engine;
pub mod executor;
pub mod feed;
pub mod server;
