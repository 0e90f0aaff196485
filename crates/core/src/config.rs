//! Layered configuration for the Sentinel trading core.
//!
//! Configuration is loaded in layers with increasing priority:
//! 1. Compiled-in defaults (conservative risk parameters, local gate)
//! 2. TOML configuration file (if provided)
//! 3. Environment variable overrides (prefix `SENTINEL_`, nested with `__`)
//! 4. `SENTINEL_RESET_TOKEN` for the kill switch reset token
//!
//! The reset token **must** come from the environment, never from a
//! configuration file, so it cannot be checked in by accident.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

// ── Default value functions ────────────────────────────────────────────

/// Market data older than 30 s counts as an outage.
fn default_staleness_limit_secs() -> f64 {
    30.0
}

/// Funding rate limit: 0.05 (500 bps).
fn default_funding_rate_limit() -> f64 {
    0.05
}

/// API latency p99 limit: 100 ms.
fn default_api_latency_limit_ms() -> f64 {
    100.0
}

/// Price divergence limit: 50 bps.
fn default_price_divergence_limit_bps() -> f64 {
    50.0
}

/// Single-bar equity drop limit: 5 %.
fn default_equity_drop_limit() -> f64 {
    0.05
}

fn default_max_position_pct() -> f64 {
    0.2
}

fn default_max_leverage() -> f64 {
    3.0
}

fn default_max_active_positions() -> usize {
    3
}

fn default_min_confidence() -> f64 {
    0.6
}

/// Warn when round-trip fees exceed 0.2 % of NAV.
fn default_fee_impact_warn_pct() -> f64 {
    0.002
}

/// Taker fee: 0.1 %.
fn default_fee_rate() -> f64 {
    0.001
}

fn default_initial_balance() -> f64 {
    1_000.0
}

fn default_leverage() -> f64 {
    1.0
}

fn default_monitor_interval_ms() -> u64 {
    1_000
}

fn default_port() -> u16 {
    8080
}

fn default_gate_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_gate_timeout_ms() -> u64 {
    2_000
}

fn default_strategy_id() -> String {
    "llm_advisor".to_string()
}

fn default_symbol() -> String {
    "BTC/USDT".to_string()
}

// ── Configuration structs ──────────────────────────────────────────────

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Kill switch trigger thresholds.
    pub kill_switch: KillSwitchThresholds,
    /// Per-order admission limits.
    pub risk: RiskLimits,
    pub ledger: LedgerConfig,
    pub monitor: MonitorConfig,
    pub server: ServerConfig,
    /// Where orders are validated: in-process or a remote gate.
    pub gate: GateConfig,
    pub trading: TradingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Conditions under which the kill switch trips on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillSwitchThresholds {
    /// Maximum age of the last market-data update, in seconds.
    #[serde(default = "default_staleness_limit_secs")]
    pub staleness_limit_secs: f64,
    /// Maximum absolute funding rate, as a fraction.
    #[serde(default = "default_funding_rate_limit")]
    pub funding_rate_limit: f64,
    /// Maximum API latency p99, in milliseconds.
    #[serde(default = "default_api_latency_limit_ms")]
    pub api_latency_limit_ms: f64,
    /// Maximum reference/venue price divergence, in basis points.
    #[serde(default = "default_price_divergence_limit_bps")]
    pub price_divergence_limit_bps: f64,
    /// Maximum single-bar equity drop, as a fraction.
    #[serde(default = "default_equity_drop_limit")]
    pub equity_drop_limit: f64,
}

impl Default for KillSwitchThresholds {
    fn default() -> Self {
        Self {
            staleness_limit_secs: default_staleness_limit_secs(),
            funding_rate_limit: default_funding_rate_limit(),
            api_latency_limit_ms: default_api_latency_limit_ms(),
            price_divergence_limit_bps: default_price_divergence_limit_bps(),
            equity_drop_limit: default_equity_drop_limit(),
        }
    }
}

/// Limits every order is checked against while the kill switch is clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Maximum position notional as a fraction of NAV.
    #[serde(default = "default_max_position_pct")]
    pub max_position_pct: f64,
    #[serde(default = "default_max_leverage")]
    pub max_leverage: f64,
    /// Maximum number of simultaneously open positions.
    #[serde(default = "default_max_active_positions")]
    pub max_active_positions: usize,
    /// Minimum advisor confidence to trade.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Round-trip fee cost, as a fraction of NAV, above which a warning is logged.
    #[serde(default = "default_fee_impact_warn_pct")]
    pub fee_impact_warn_pct: f64,
    /// Taker fee rate used for the fee-impact estimate.
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_pct: default_max_position_pct(),
            max_leverage: default_max_leverage(),
            max_active_positions: default_max_active_positions(),
            min_confidence: default_min_confidence(),
            fee_impact_warn_pct: default_fee_impact_warn_pct(),
            fee_rate: default_fee_rate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Starting balance in quote currency.
    #[serde(default = "default_initial_balance")]
    pub initial_balance: f64,
    /// Leverage recorded on positions opened by the ledger.
    #[serde(default = "default_leverage")]
    pub default_leverage: f64,
}

/// Market-health monitor cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_monitor_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Token required by `POST /reset`. Loaded from `SENTINEL_RESET_TOKEN`
    /// only; reset is disabled when absent.
    #[serde(skip)]
    pub reset_token: Option<String>,
}

/// Gate deployment selector.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    /// Validate in-process against the shared kill switch.
    Local,
    /// Validate against a separately deployed gate over HTTP.
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    pub mode: GateMode,
    /// Base URL of the remote gate.
    #[serde(default = "default_gate_url")]
    pub url: String,
    /// Per-request timeout; expiry counts as a rejection.
    #[serde(default = "default_gate_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    #[serde(default = "default_strategy_id")]
    pub strategy_id: String,
    /// The single symbol this agent trades and marks its portfolio against.
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON logs instead of pretty output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Load configuration using layered sources.
    ///
    /// 1. Compiled-in defaults.
    /// 2. TOML file at `config_path` (if `Some`).
    /// 3. Environment overrides with prefix `SENTINEL_` and `__` as the
    ///    nesting separator (e.g., `SENTINEL_RISK__MAX_LEVERAGE=2`).
    /// 4. Reset token from `SENTINEL_RESET_TOKEN`.
    ///
    /// The result is validated before it is returned.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder()
            // ── Layer 1: compiled-in defaults ───────────────────────
            .set_default("kill_switch.staleness_limit_secs", default_staleness_limit_secs())?
            .set_default("kill_switch.funding_rate_limit", default_funding_rate_limit())?
            .set_default("kill_switch.api_latency_limit_ms", default_api_latency_limit_ms())?
            .set_default(
                "kill_switch.price_divergence_limit_bps",
                default_price_divergence_limit_bps(),
            )?
            .set_default("kill_switch.equity_drop_limit", default_equity_drop_limit())?
            .set_default("risk.max_position_pct", default_max_position_pct())?
            .set_default("risk.max_leverage", default_max_leverage())?
            .set_default("risk.max_active_positions", default_max_active_positions() as i64)?
            .set_default("risk.min_confidence", default_min_confidence())?
            .set_default("risk.fee_impact_warn_pct", default_fee_impact_warn_pct())?
            .set_default("risk.fee_rate", default_fee_rate())?
            .set_default("ledger.initial_balance", default_initial_balance())?
            .set_default("ledger.default_leverage", default_leverage())?
            .set_default("monitor.interval_ms", default_monitor_interval_ms() as i64)?
            .set_default("server.port", default_port() as i64)?
            .set_default("gate.mode", "local")?
            .set_default("gate.url", default_gate_url())?
            .set_default("gate.timeout_ms", default_gate_timeout_ms() as i64)?
            .set_default("trading.strategy_id", default_strategy_id())?
            .set_default("trading.symbol", default_symbol())?
            .set_default("logging.json", false)?;

        // ── Layer 2: TOML file ─────────────────────────────────────
        if let Some(path) = config_path {
            let path_str = path.to_str().context("config path is not valid UTF-8")?;
            builder = builder.add_source(File::with_name(path_str).required(true));
        }

        // ── Layer 3: env var overrides (SENTINEL_ prefix) ─────────
        // The prefix separator is set explicitly; otherwise the `config`
        // crate reuses `__` and expects `SENTINEL__RISK__...`.
        builder = builder.add_source(
            Environment::with_prefix("SENTINEL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut cfg: AppConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        // ── Layer 4: dedicated secret env var ──────────────────────
        cfg.server.reset_token = std::env::var("SENTINEL_RESET_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        cfg.validate()?;

        Ok(cfg)
    }

    /// Validate configuration invariants.
    fn validate(&self) -> Result<()> {
        let ks = &self.kill_switch;
        for (name, value) in [
            ("kill_switch.staleness_limit_secs", ks.staleness_limit_secs),
            ("kill_switch.funding_rate_limit", ks.funding_rate_limit),
            ("kill_switch.api_latency_limit_ms", ks.api_latency_limit_ms),
            ("kill_switch.price_divergence_limit_bps", ks.price_divergence_limit_bps),
            ("kill_switch.equity_drop_limit", ks.equity_drop_limit),
            ("risk.max_position_pct", self.risk.max_position_pct),
            ("risk.max_leverage", self.risk.max_leverage),
            ("ledger.initial_balance", self.ledger.initial_balance),
            ("ledger.default_leverage", self.ledger.default_leverage),
        ] {
            if !(value.is_finite() && value > 0.0) {
                bail!("{name} must be a positive number, got {value}");
            }
        }
        if self.risk.max_active_positions == 0 {
            bail!("risk.max_active_positions must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.risk.min_confidence) {
            bail!(
                "risk.min_confidence must be within [0, 1], got {}",
                self.risk.min_confidence
            );
        }
        if self.monitor.interval_ms == 0 {
            bail!("monitor.interval_ms must be non-zero");
        }
        if self.gate.mode == GateMode::Remote {
            if self.gate.url.trim().is_empty() {
                bail!("gate.url is required when gate.mode = \"remote\"");
            }
            if self.gate.timeout_ms == 0 {
                bail!("gate.timeout_ms must be non-zero for a remote gate");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Serializes tests that touch process environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn clear_env() {
        std::env::remove_var("SENTINEL_RISK__MAX_LEVERAGE");
        std::env::remove_var("SENTINEL_KILL_SWITCH__STALENESS_LIMIT_SECS");
        std::env::remove_var("SENTINEL_GATE__MODE");
        std::env::remove_var("SENTINEL_RESET_TOKEN");
    }

    /// Uses a `.toml` suffix so the `config` crate detects the format.
    fn write_temp_toml(content: &str) -> (tempfile::NamedTempFile, PathBuf) {
        let mut f = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("create temp file");
        write!(f, "{}", content).expect("write temp file");
        let path = f.path().to_path_buf();
        (f, path)
    }

    #[test]
    fn test_load_defaults_only() {
        let _lock = lock_env();
        clear_env();

        let cfg = AppConfig::load(None).expect("load defaults");
        assert_eq!(cfg.kill_switch, KillSwitchThresholds::default());
        assert_eq!(cfg.risk, RiskLimits::default());
        assert_eq!(cfg.kill_switch.staleness_limit_secs, 30.0);
        assert_eq!(cfg.kill_switch.funding_rate_limit, 0.05);
        assert_eq!(cfg.kill_switch.api_latency_limit_ms, 100.0);
        assert_eq!(cfg.kill_switch.price_divergence_limit_bps, 50.0);
        assert_eq!(cfg.kill_switch.equity_drop_limit, 0.05);
        assert_eq!(cfg.ledger.initial_balance, 1_000.0);
        assert_eq!(cfg.monitor.interval_ms, 1_000);
        assert_eq!(cfg.gate.mode, GateMode::Local);
        assert_eq!(cfg.trading.symbol, "BTC/USDT");
        assert!(cfg.server.reset_token.is_none());
        assert!(!cfg.logging.json);
    }

    #[test]
    fn test_load_from_toml() {
        let _lock = lock_env();
        clear_env();

        let toml_content = r#"
[kill_switch]
staleness_limit_secs = 10.0
api_latency_limit_ms = 250.0

[risk]
max_leverage = 5.0
max_active_positions = 1

[gate]
mode = "remote"
url = "http://gate.internal:9000"
timeout_ms = 500

[trading]
symbol = "ETH/USDT"

[logging]
json = true
"#;
        let (_f, path) = write_temp_toml(toml_content);
        let cfg = AppConfig::load(Some(path)).expect("load from toml");

        assert_eq!(cfg.kill_switch.staleness_limit_secs, 10.0);
        assert_eq!(cfg.kill_switch.api_latency_limit_ms, 250.0);
        // untouched keys keep their defaults
        assert_eq!(cfg.kill_switch.funding_rate_limit, 0.05);
        assert_eq!(cfg.risk.max_leverage, 5.0);
        assert_eq!(cfg.risk.max_active_positions, 1);
        assert_eq!(cfg.gate.mode, GateMode::Remote);
        assert_eq!(cfg.gate.url, "http://gate.internal:9000");
        assert_eq!(cfg.gate.timeout_ms, 500);
        assert_eq!(cfg.trading.symbol, "ETH/USDT");
        assert!(cfg.logging.json);
    }

    #[test]
    fn test_env_var_overrides() {
        let _lock = lock_env();
        clear_env();
        std::env::set_var("SENTINEL_RISK__MAX_LEVERAGE", "2.5");
        std::env::set_var("SENTINEL_KILL_SWITCH__STALENESS_LIMIT_SECS", "12");

        let cfg = AppConfig::load(None).expect("load with env override");
        assert_eq!(cfg.risk.max_leverage, 2.5);
        assert_eq!(cfg.kill_switch.staleness_limit_secs, 12.0);

        clear_env();
    }

    #[test]
    fn test_reset_token_from_env() {
        let _lock = lock_env();
        clear_env();
        std::env::set_var("SENTINEL_RESET_TOKEN", "rotate-me");

        let cfg = AppConfig::load(None).expect("load with reset token");
        assert_eq!(cfg.server.reset_token.as_deref(), Some("rotate-me"));

        clear_env();
    }

    #[test]
    fn test_non_positive_threshold_fails() {
        let _lock = lock_env();
        clear_env();

        let (_f, path) = write_temp_toml("[kill_switch]\nfunding_rate_limit = 0.0\n");
        let err = AppConfig::load(Some(path)).unwrap_err();
        assert!(format!("{}", err).contains("funding_rate_limit"));
    }

    #[test]
    fn test_min_confidence_out_of_range_fails() {
        let _lock = lock_env();
        clear_env();

        let (_f, path) = write_temp_toml("[risk]\nmin_confidence = 1.5\n");
        let err = AppConfig::load(Some(path)).unwrap_err();
        assert!(format!("{}", err).contains("min_confidence"));
    }

    #[test]
    fn test_remote_gate_without_url_fails() {
        let _lock = lock_env();
        clear_env();

        let (_f, path) = write_temp_toml("[gate]\nmode = \"remote\"\nurl = \"\"\n");
        let err = AppConfig::load(Some(path)).unwrap_err();
        assert!(format!("{}", err).contains("gate.url"));
    }
}
