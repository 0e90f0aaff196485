//! HTTP server — merges risk gate routes with trading endpoints.
//!
//! Exposes `/market-data`, `/decisions`, `/portfolio`, `/trades` and
//! `/metrics` alongside the gate routes (`/kill`, `/status`, `/reset`,
//! `/validate`, `/health`).

use std::fmt::Write as _;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use sentinel_core::types::{AdvisorDecision, MarketHealth, Symbol};
use sentinel_ledger::{PortfolioSummary, Trade};
use sentinel_risk::{gate_router, GateServerState};

use crate::engine::SharedState;

/// Body of `POST /decisions`.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    /// Defaults to the configured trading symbol; any other symbol is
    /// refused, since the portfolio is marked at one price.
    #[serde(default)]
    pub symbol: Option<String>,
    pub price: f64,
    /// Raw advisor payload; validated here before anything else happens.
    pub decision: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PriceQuery {
    price: f64,
}

#[derive(Debug, Serialize)]
struct AcceptedResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// `POST /market-data` — hand a health reading to the monitor.
async fn market_data_handler(
    State(state): State<Arc<SharedState>>,
    Json(health): Json<MarketHealth>,
) -> (StatusCode, Json<AcceptedResponse>) {
    state.feed.push(health);
    (
        StatusCode::ACCEPTED,
        Json(AcceptedResponse { status: "accepted" }),
    )
}

/// `POST /decisions` — run an advisor decision through gate and ledger.
async fn decisions_handler(
    State(state): State<Arc<SharedState>>,
    Json(req): Json<DecisionRequest>,
) -> Response {
    let decision = match AdvisorDecision::from_value(req.decision) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(error = %e, "advisor decision refused");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };
    let symbol = req
        .symbol
        .map(Symbol::new)
        .unwrap_or_else(|| state.symbol.clone());
    if symbol != state.symbol {
        tracing::warn!(symbol = %symbol, traded = %state.symbol, "decision for untraded symbol");
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: format!("symbol {symbol} is not traded here (trading {})", state.symbol),
            }),
        )
            .into_response();
    }

    let outcome = state.executor.execute(&symbol, req.price, &decision).await;
    Json(outcome).into_response()
}

/// `GET /portfolio?price=<P>` — portfolio summary marked at `price`.
async fn portfolio_handler(
    State(state): State<Arc<SharedState>>,
    Query(query): Query<PriceQuery>,
) -> Json<PortfolioSummary> {
    Json(state.ledger.portfolio_summary(query.price))
}

/// `GET /trades` — full trade history in execution order.
async fn trades_handler(State(state): State<Arc<SharedState>>) -> Json<Vec<Trade>> {
    Json(state.ledger.trade_history())
}

/// `GET /metrics` — simple Prometheus-style text metrics.
async fn metrics_handler(State(state): State<Arc<SharedState>>) -> String {
    let snapshot = state.gate.kill_switch().snapshot();
    let stats = state.executor.stats();

    let mut out = String::new();
    let mut gauge = |name: &str, help: &str, kind: &str, value: f64| {
        let _ = write!(
            out,
            "# HELP {name} {help}\n# TYPE {name} {kind}\n{name} {value}\n"
        );
    };

    gauge(
        "sentinel_kill_switch_active",
        "Whether trading is halted",
        "gauge",
        if snapshot.kill_switch_active { 1.0 } else { 0.0 },
    );
    gauge(
        "sentinel_funding_rate",
        "Last reported funding rate",
        "gauge",
        snapshot.funding_rate,
    );
    gauge(
        "sentinel_api_latency_p99_ms",
        "Last reported API latency p99",
        "gauge",
        snapshot.api_latency_p99_ms,
    );
    gauge(
        "sentinel_price_divergence_bps",
        "Last reported price divergence",
        "gauge",
        snapshot.price_divergence_bps,
    );
    gauge(
        "sentinel_balance",
        "Free balance",
        "gauge",
        state.ledger.balance(),
    );
    gauge(
        "sentinel_open_positions",
        "Number of open positions",
        "gauge",
        state.ledger.open_position_count() as f64,
    );
    gauge(
        "sentinel_trades_total",
        "Trades executed",
        "counter",
        state.ledger.trade_count() as f64,
    );
    gauge(
        "sentinel_orders_rejected_total",
        "Orders refused by the risk gate",
        "counter",
        stats.rejected.load(Ordering::Relaxed) as f64,
    );
    gauge(
        "sentinel_orders_failed_total",
        "Approved orders the ledger could not apply",
        "counter",
        stats.failed.load(Ordering::Relaxed) as f64,
    );

    out
}

/// Build the combined router.
pub fn build_router(state: Arc<SharedState>) -> Router {
    let gate_state = Arc::new(GateServerState {
        gate: state.gate.clone(),
        reset_token: state.config.server.reset_token.clone(),
    });

    let trading_router = Router::new()
        .route("/market-data", post(market_data_handler))
        .route("/decisions", post(decisions_handler))
        .route("/portfolio", get(portfolio_handler))
        .route("/trades", get(trades_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    trading_router.merge(gate_router(gate_state))
}

/// Build and run the combined HTTP server.
pub async fn run_server(
    state: Arc<SharedState>,
    port: u16,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "HTTP server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await?;

    Ok(())
}
