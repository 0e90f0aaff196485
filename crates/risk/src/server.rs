//! Risk gate HTTP router.
//!
//! A small axum API for emergency control and remote order validation. It
//! only touches the [`RiskGate`] and its kill switch, so it keeps answering
//! when the rest of the trading engine is wedged.
//!
//! ## Endpoints
//!
//! - `POST /kill?reason=<TEXT>` — halt trading (no auth required; safety first)
//! - `GET /status` — current risk state as JSON
//! - `POST /reset?token=<TOKEN>` — resume trading (requires auth token)
//! - `POST /validate` — validate a JSON `OrderRequest`
//! - `GET /health` — simple health check

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use sentinel_core::types::OrderRequest;

use crate::gate::{OrderValidationResult, RiskGate};
use crate::kill_switch::RiskStateSnapshot;

/// Shared state for risk gate HTTP handlers.
pub struct GateServerState {
    pub gate: Arc<RiskGate>,
    /// Token required for the reset endpoint. If `None`, reset is disabled.
    pub reset_token: Option<String>,
}

/// JSON response for `/kill` and `/reset`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ControlResponse {
    pub status: String,
    /// `false` when the request did not change the state.
    pub changed: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct KillQuery {
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResetQuery {
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

const DEFAULT_KILL_REASON: &str = "manual halt via HTTP";

/// Build the risk gate axum router.
pub fn gate_router(state: Arc<GateServerState>) -> Router {
    Router::new()
        .route("/kill", post(kill_handler))
        .route("/status", get(status_handler))
        .route("/reset", post(reset_handler))
        .route("/validate", post(validate_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `POST /kill` — halt trading immediately.
///
/// No authentication required. In an emergency, speed is more important
/// than access control.
async fn kill_handler(
    State(state): State<Arc<GateServerState>>,
    Query(query): Query<KillQuery>,
) -> Json<ControlResponse> {
    let reason = query
        .reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_KILL_REASON.to_string());
    let changed = state.gate.kill_switch().activate(reason);
    Json(ControlResponse {
        status: "ok".into(),
        changed,
        message: "trading halted".into(),
    })
}

/// `GET /status` — return the current risk state.
async fn status_handler(State(state): State<Arc<GateServerState>>) -> Json<RiskStateSnapshot> {
    Json(state.gate.kill_switch().snapshot())
}

/// `POST /reset?token=<TOKEN>` — deactivate the kill switch.
///
/// Requires a valid token in the query string. If no token is configured
/// on the server, reset is disabled.
async fn reset_handler(
    State(state): State<Arc<GateServerState>>,
    Query(query): Query<ResetQuery>,
) -> Result<Json<ControlResponse>, StatusCode> {
    let expected = match &state.reset_token {
        Some(t) => t,
        None => return Err(StatusCode::FORBIDDEN),
    };

    match &query.token {
        Some(token) if token == expected => {
            let kill_switch = state.gate.kill_switch();
            let changed = kill_switch.is_active();
            kill_switch.deactivate();
            Ok(Json(ControlResponse {
                status: "ok".into(),
                changed,
                message: "trading resumed".into(),
            }))
        }
        _ => {
            tracing::warn!("kill switch reset refused: bad token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// `POST /validate` — run an order through the gate.
async fn validate_handler(
    State(state): State<Arc<GateServerState>>,
    Json(order): Json<OrderRequest>,
) -> Json<OrderValidationResult> {
    Json(state.gate.validate(&order))
}

/// `GET /health` — simple liveness check.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_order;
    use crate::gate::ValidationStatus;
    use crate::kill_switch::KillSwitch;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use sentinel_core::config::RiskLimits;
    use sentinel_core::types::Side;
    use tower::ServiceExt;

    fn make_state(token: Option<&str>) -> Arc<GateServerState> {
        Arc::new(GateServerState {
            gate: Arc::new(RiskGate::new(
                Arc::new(KillSwitch::default()),
                RiskLimits::default(),
            )),
            reset_token: token.map(str::to_string),
        })
    }

    fn post(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = gate_router(make_state(None));
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = body_json(resp).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_initially_clear() {
        let app = gate_router(make_state(None));
        let req = Request::builder()
            .uri("/status")
            .body(Body::empty())
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let snap: RiskStateSnapshot = body_json(resp).await;
        assert!(!snap.kill_switch_active);
        assert!(snap.kill_switch_reason.is_none());
    }

    #[tokio::test]
    async fn test_kill_with_reason() {
        let state = make_state(None);
        let gate = state.gate.clone();
        let app = gate_router(state);

        let resp = app.oneshot(post("/kill?reason=exchange%20down")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: ControlResponse = body_json(resp).await;
        assert!(body.changed);
        assert_eq!(gate.kill_switch().reason().as_deref(), Some("exchange down"));
    }

    #[tokio::test]
    async fn test_kill_without_reason_uses_default() {
        let state = make_state(None);
        let gate = state.gate.clone();
        let app = gate_router(state);

        app.oneshot(post("/kill")).await.unwrap();
        assert_eq!(
            gate.kill_switch().reason().as_deref(),
            Some(DEFAULT_KILL_REASON)
        );
    }

    #[tokio::test]
    async fn test_second_kill_keeps_first_reason() {
        let state = make_state(None);
        let gate = state.gate.clone();
        gate.kill_switch().activate("first");
        let app = gate_router(state);

        let resp = app.oneshot(post("/kill?reason=second")).await.unwrap();
        let body: ControlResponse = body_json(resp).await;
        assert!(!body.changed);
        assert_eq!(gate.kill_switch().reason().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_reset_with_valid_token() {
        let state = make_state(Some("secret123"));
        let gate = state.gate.clone();
        gate.kill_switch().activate("test");
        let app = gate_router(state);

        let resp = app.oneshot(post("/reset?token=secret123")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: ControlResponse = body_json(resp).await;
        assert!(body.changed);
        assert!(!gate.kill_switch().is_active());
    }

    #[tokio::test]
    async fn test_reset_with_invalid_token() {
        let state = make_state(Some("secret123"));
        state.gate.kill_switch().activate("test");
        let gate = state.gate.clone();
        let app = gate_router(state);

        let resp = app.oneshot(post("/reset?token=wrong")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(gate.kill_switch().is_active());
    }

    #[tokio::test]
    async fn test_reset_without_token() {
        let state = make_state(Some("secret123"));
        let app = gate_router(state);

        let resp = app.oneshot(post("/reset")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reset_disabled_when_no_token_configured() {
        let state = make_state(None);
        state.gate.kill_switch().activate("test");
        let app = gate_router(state);

        let resp = app.oneshot(post("/reset?token=anything")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_validate_endpoint() {
        let state = make_state(None);
        let gate = state.gate.clone();
        let app = gate_router(state);

        let order = test_order(Side::Buy);
        let req = Request::builder()
            .method("POST")
            .uri("/validate")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&order).unwrap()))
            .unwrap();

        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let result: OrderValidationResult = body_json(resp).await;
        assert_eq!(result.status, ValidationStatus::Approved);

        gate.kill_switch().activate("halt");
        let req = Request::builder()
            .method("POST")
            .uri("/validate")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&order).unwrap()))
            .unwrap();
        let result: OrderValidationResult = body_json(app.oneshot(req).await.unwrap()).await;
        assert_eq!(result.status, ValidationStatus::KillSwitch);
    }

    #[tokio::test]
    async fn test_validate_rejects_malformed_body() {
        let app = gate_router(make_state(None));
        let req = Request::builder()
            .method("POST")
            .uri("/validate")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"side":"buy"}"#))
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
    }
}
