//! Sentinel trading binary.
//!
//! Loads configuration, initializes tracing, and starts the
//! [`TradingEngine`](sentinel_trading::engine::TradingEngine).

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use sentinel_core::config::AppConfig;
use sentinel_trading::engine::TradingEngine;

/// Sentinel order admission and execution core
#[derive(Parser, Debug)]
#[command(name = "sentinel", about = "Risk-gated LLM trading agent")]
struct Args {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit JSON logs (overrides `logging.json`).
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(args.config).context("failed to load configuration")?;

    sentinel_core::logging::init_tracing(args.json_logs || config.logging.json)?;

    tracing::info!(
        strategy = %config.trading.strategy_id,
        symbol = %config.trading.symbol,
        port = config.server.port,
        reset_enabled = config.server.reset_token.is_some(),
        "starting sentinel"
    );

    let engine = TradingEngine::new(config)?;
    engine.run().await
}
