//! End-to-end tests over the combined HTTP API.
//!
//! Builds the full engine state from configuration and drives it through
//! the router (no sockets) except where a remote gate needs a real one.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use sentinel_core::config::{AppConfig, GateMode};
use sentinel_risk::MarketMonitor;
use sentinel_trading::engine::TradingEngine;

const TOKEN: &str = "let-me-in";

fn config() -> AppConfig {
    let mut cfg = AppConfig::load(None).expect("default config loads");
    cfg.server.reset_token = Some(TOKEN.to_string());
    cfg
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn buy(confidence: f64, size: f64, price: f64) -> Value {
    json!({
        "price": price,
        "decision": {
            "action": "BUY",
            "confidence": confidence,
            "reasoning": "momentum",
            "risk_assessment": "low",
            "position_size": size,
        }
    })
}

fn sell(price: f64) -> Value {
    json!({
        "price": price,
        "decision": { "action": "sell", "confidence": 0.9 }
    })
}

#[tokio::test]
async fn test_decision_round_trip_through_gate_and_ledger() {
    let engine = TradingEngine::new(config()).unwrap();
    let app = engine.router();

    let (status, body) = call(&app, "POST", "/decisions", Some(buy(0.8, 0.1, 50_000.0))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "executed");
    assert_eq!(body["trade"]["side"], "buy");
    assert_eq!(body["trade"]["reasoning"], "momentum");
    assert_eq!(body["trade"]["risk_assessment"], "low");

    let (_, summary) = call(&app, "GET", "/portfolio?price=50000", None).await;
    assert_eq!(summary["open_positions"], 1);
    assert!((summary["balance"].as_f64().unwrap() - 900.0).abs() < 1e-9);

    let (_, body) = call(&app, "POST", "/decisions", Some(sell(51_000.0))).await;
    assert_eq!(body["outcome"], "executed");
    let profit = body["trade"]["profit"].as_f64().unwrap();
    assert!((profit - 2.0).abs() < 1e-9);

    let (_, trades) = call(&app, "GET", "/trades", None).await;
    let trades = trades.as_array().unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0]["id"], 1);
    assert_eq!(trades[1]["id"], 2);

    let ledger = &engine.state().ledger;
    assert!((ledger.balance() - 1_002.0).abs() < 1e-9);
    assert_eq!(ledger.open_position_count(), 0);
}

#[tokio::test]
async fn test_rejections_do_not_touch_ledger() {
    let engine = TradingEngine::new(config()).unwrap();
    let app = engine.router();

    let (_, body) = call(&app, "POST", "/decisions", Some(buy(0.4, 0.1, 50_000.0))).await;
    assert_eq!(body["outcome"], "rejected");
    assert_eq!(body["validation"]["status"], "rejected");
    assert_eq!(body["validation"]["details"]["violated_limit"], "min_confidence");

    let (_, body) = call(&app, "POST", "/decisions", Some(buy(0.9, 0.9, 50_000.0))).await;
    assert_eq!(body["validation"]["details"]["violated_limit"], "max_position_size");

    let (_, body) = call(&app, "POST", "/decisions", Some(json!({
        "price": 50_000.0,
        "decision": { "action": "hold", "confidence": 0.9 }
    })))
    .await;
    assert_eq!(body["outcome"], "skipped");

    assert_eq!(engine.state().ledger.trade_count(), 0);
    assert_eq!(engine.state().ledger.balance(), 1_000.0);

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("sentinel_orders_rejected_total 2"));
    assert!(text.contains("sentinel_kill_switch_active 0"));
}

#[tokio::test]
async fn test_malformed_decision_is_unprocessable() {
    let engine = TradingEngine::new(config()).unwrap();
    let app = engine.router();

    let (status, body) = call(&app, "POST", "/decisions", Some(json!({
        "price": 50_000.0,
        "decision": { "action": "moon", "confidence": 0.9 }
    })))
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("moon"));

    let (status, _) = call(&app, "POST", "/decisions", Some(buy(1.5, 0.1, 50_000.0))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_monitor_trip_halts_then_reset_resumes() {
    let engine = TradingEngine::new(config()).unwrap();
    let app = engine.router();
    let state = engine.state();

    let (status, _) = call(&app, "POST", "/market-data", Some(json!({
        "funding_rate": 0.06,
        "api_latency_p99_ms": 20.0,
        "price_divergence_bps": 1.0
    })))
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let monitor = MarketMonitor::new(
        state.gate.kill_switch().clone(),
        state.feed.clone(),
        Duration::from_millis(10),
    );
    assert!(monitor.tick().await);

    let (_, status_body) = call(&app, "GET", "/status", None).await;
    assert_eq!(status_body["kill_switch_active"], true);
    assert!(status_body["kill_switch_reason"].as_str().unwrap().contains("funding"));

    let (_, body) = call(&app, "POST", "/decisions", Some(buy(0.9, 0.1, 50_000.0))).await;
    assert_eq!(body["validation"]["status"], "kill_switch");
    assert_eq!(body["validation"]["details"]["kill_switch"], true);

    // a calm reading does not clear a latched switch
    call(&app, "POST", "/market-data", Some(json!({
        "funding_rate": 0.0001,
        "api_latency_p99_ms": 20.0,
        "price_divergence_bps": 1.0
    })))
    .await;
    assert!(!monitor.tick().await);
    assert!(state.gate.kill_switch().is_active());

    let (status, _) = call(&app, "POST", "/reset?token=nope", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "POST", &format!("/reset?token={TOKEN}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&app, "POST", "/decisions", Some(buy(0.9, 0.1, 50_000.0))).await;
    assert_eq!(body["outcome"], "executed");
}

#[tokio::test]
async fn test_spike_between_ticks_is_not_lost() {
    let engine = TradingEngine::new(config()).unwrap();
    let app = engine.router();
    let state = engine.state();

    for latency in [900.0, 10.0] {
        let (status, _) = call(&app, "POST", "/market-data", Some(json!({
            "funding_rate": 0.0001,
            "api_latency_p99_ms": latency,
            "price_divergence_bps": 1.0
        })))
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    let monitor = MarketMonitor::new(
        state.gate.kill_switch().clone(),
        state.feed.clone(),
        Duration::from_millis(10),
    );
    assert!(monitor.tick().await);
    assert!(state.gate.kill_switch().is_active());
    assert!(state.gate.kill_switch().reason().unwrap().contains("latency"));
    assert_eq!(state.feed.pending(), 0);
}

#[tokio::test]
async fn test_decision_for_untraded_symbol_refused() {
    let engine = TradingEngine::new(config()).unwrap();
    let app = engine.router();

    let mut req = buy(0.9, 0.19, 3_000.0);
    req["symbol"] = json!("ETH/USDT");
    let (status, body) = call(&app, "POST", "/decisions", Some(req)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("ETH/USDT"));
    assert_eq!(engine.state().ledger.trade_count(), 0);

    let (_, body) = call(&app, "POST", "/decisions", Some(buy(0.9, 0.19, 50_000.0))).await;
    assert_eq!(body["outcome"], "executed");
    assert!((body["trade"]["notional"].as_f64().unwrap() - 190.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_manual_kill_keeps_first_reason() {
    let engine = TradingEngine::new(config()).unwrap();
    let app = engine.router();

    call(&app, "POST", "/kill?reason=operator", None).await;
    let (_, body) = call(&app, "POST", "/kill?reason=second", None).await;
    assert_eq!(body["changed"], false);

    let (_, status) = call(&app, "GET", "/status", None).await;
    assert_eq!(status["kill_switch_reason"], "operator");
}

/// Serve an engine's router on an ephemeral local port.
async fn serve(engine: &TradingEngine) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = engine.router();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_remote_gate_mode() {
    let gate_engine = TradingEngine::new(config()).unwrap();
    let url = serve(&gate_engine).await;

    let mut cfg = config();
    cfg.gate.mode = GateMode::Remote;
    cfg.gate.url = url;
    let agent = TradingEngine::new(cfg).unwrap();
    let app = agent.router();

    let (_, body) = call(&app, "POST", "/decisions", Some(buy(0.8, 0.1, 50_000.0))).await;
    assert_eq!(body["outcome"], "executed");

    gate_engine.state().gate.kill_switch().activate("remote desk halt");
    let (_, body) = call(&app, "POST", "/decisions", Some(sell(51_000.0))).await;
    assert_eq!(body["validation"]["status"], "kill_switch");
    assert_eq!(agent.state().ledger.open_position_count(), 1);
}

#[tokio::test]
async fn test_unreachable_remote_gate_rejects() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut cfg = config();
    cfg.gate.mode = GateMode::Remote;
    cfg.gate.url = format!("http://{addr}");
    cfg.gate.timeout_ms = 500;
    let agent = TradingEngine::new(cfg).unwrap();
    let app = agent.router();

    let (_, body) = call(&app, "POST", "/decisions", Some(buy(0.9, 0.1, 50_000.0))).await;
    assert_eq!(body["outcome"], "rejected");
    assert_eq!(body["validation"]["details"]["gate_unreachable"], true);
    assert_eq!(agent.state().ledger.trade_count(), 0);
}

#[tokio::test]
async fn test_engine_run_stops_on_cancel() {
    let mut cfg = config();
    cfg.server.port = 0;
    let engine = TradingEngine::new(cfg).unwrap();
    let cancel = engine.cancel_token();
    let state = Arc::clone(engine.state());
    let handle = tokio::spawn(engine.run());

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("engine did not stop")
        .unwrap()
        .unwrap();
    assert!(!state.gate.kill_switch().is_active());
}
