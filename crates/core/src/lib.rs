//! # sentinel-core
//!
//! Shared types, configuration and logging for the Sentinel trading core.
//!
//! Holds the order request submitted to the risk gate, advisor decision
//! payloads, market-health signals, wall-clock timestamps, the layered
//! application configuration and tracing initialization.

pub mod config;
pub mod logging;
pub mod types;
