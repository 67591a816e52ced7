//! Control API server.
//!
//! Serves the scenario registry, call history, and verification endpoints
//! over HTTP+JSON on a fixed port, independent of the proxy data plane.
//! Handlers are thin: parse, call into [`FaultlineCore`], map errors to
//! statuses. A handler fault surfaces as a JSON error response, never as
//! a listener crash.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use faultline_core::{
    FaultlineCore, FaultlineError, ScenarioOverrides, VerificationRequest, MAX_HISTORY,
};

/// The control API listener.
pub struct ControlServer {
    bind_address: String,
    core: Arc<FaultlineCore>,
}

impl ControlServer {
    /// Create a server over shared core state.
    pub fn new(bind_address: String, core: Arc<FaultlineCore>) -> Self {
        Self { bind_address, core }
    }

    /// Bind and serve until the process exits.
    pub async fn start(self) -> anyhow::Result<()> {
        let app = router(self.core);
        let addr: SocketAddr = self.bind_address.parse()?;

        info!("starting control API on {addr}");
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Build the control API router. Exposed separately so tests can drive
/// it in-process.
pub fn router(core: Arc<FaultlineCore>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/scenarios", get(list_scenarios))
        .route("/scenarios/disable-all", post(disable_all))
        .route("/scenarios/:name/enable", post(enable_scenario))
        .route("/scenarios/:name/disable", post(disable_scenario))
        .route("/scenarios/:name/status", get(scenario_status))
        .route("/thrift/calls", get(list_calls))
        .route("/thrift/calls/reset", post(reset_calls))
        .route("/thrift/calls/verify", post(verify_calls))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(core)
}

/// Map a core error to its HTTP status and JSON body.
fn error_response(err: &FaultlineError) -> Response {
    let status = match err {
        FaultlineError::NotFound { .. } => StatusCode::NOT_FOUND,
        FaultlineError::InvalidArgument { .. } | FaultlineError::Decode { .. } => {
            StatusCode::BAD_REQUEST
        }
        FaultlineError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn list_scenarios(State(core): State<Arc<FaultlineCore>>) -> impl IntoResponse {
    Json(json!({ "scenarios": core.list_scenarios() }))
}

async fn enable_scenario(
    Path(name): Path<String>,
    State(core): State<Arc<FaultlineCore>>,
    body: Bytes,
) -> Response {
    let overrides = if body.is_empty() {
        ScenarioOverrides::default()
    } else {
        match serde_json::from_slice::<ScenarioOverrides>(&body) {
            Ok(overrides) => overrides,
            Err(err) => {
                return error_response(&FaultlineError::invalid_argument(format!(
                    "invalid enable request body: {err}"
                )))
            }
        }
    };

    match core.enable_scenario(&name, &overrides) {
        Ok(config) => Json(json!({
            "scenario": name,
            "enabled": true,
            "config": config,
        }))
        .into_response(),
        Err(err) => error_response(&err),
    }
}

async fn disable_scenario(
    Path(name): Path<String>,
    State(core): State<Arc<FaultlineCore>>,
) -> Response {
    match core.disable_scenario(&name) {
        Ok(()) => Json(json!({ "scenario": name, "enabled": false })).into_response(),
        Err(err) => error_response(&err),
    }
}

async fn scenario_status(
    Path(name): Path<String>,
    State(core): State<Arc<FaultlineCore>>,
) -> Response {
    match core.scenario_status(&name) {
        Ok(status) => Json(status).into_response(),
        Err(err) => error_response(&err),
    }
}

async fn disable_all(State(core): State<Arc<FaultlineCore>>) -> impl IntoResponse {
    let disabled = core.disable_all();
    Json(json!({ "message": format!("disabled {disabled} scenarios") }))
}

async fn list_calls(State(core): State<Arc<FaultlineCore>>) -> impl IntoResponse {
    let calls = core.calls();
    Json(json!({
        "count": calls.len(),
        "calls": calls,
        "max_history": MAX_HISTORY,
    }))
}

async fn reset_calls(State(core): State<Arc<FaultlineCore>>) -> impl IntoResponse {
    core.reset_calls();
    Json(json!({ "message": "call history cleared", "count": 0 }))
}

async fn verify_calls(State(core): State<Arc<FaultlineCore>>, body: Bytes) -> Response {
    if body.is_empty() {
        return error_response(&FaultlineError::invalid_argument(
            "missing verification request body",
        ));
    }

    let request = match serde_json::from_slice::<VerificationRequest>(&body) {
        Ok(request) => request,
        Err(err) => {
            return error_response(&FaultlineError::invalid_argument(format!(
                "invalid verification request body: {err}"
            )))
        }
    };

    match core.verify(&request) {
        Ok(result) => Json(result).into_response(),
        Err(err) => error_response(&err),
    }
}
