//! # REST + JSON-RPC API
//!
//! Builds the axum router that exposes the ledger node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                 | Description                        |
//! |--------|----------------------|------------------------------------|
//! | GET    | `/health`            | Liveness probe                     |
//! | GET    | `/status`            | Node status summary                |
//! | POST   | `/rpc`               | JSON-RPC 2.0 gateway               |
//! | GET    | `/root`              | The issuing (Root) account         |
//! | GET    | `/users/:id`         | User account by id                 |
//! | GET    | `/transactions/:id`  | Transaction record by call id      |
//! | GET    | `/metrics`           | Prometheus text exposition         |
//!
//! The RPC gateway is the write path: every mutating method runs under a
//! single async mutex, so conflicting invocations are serialized here and
//! the ledger core below can assume it is the sole writer for the
//! duration of one call. The node mints a UUID v4 call id per mutating
//! invocation; a movement's transaction record is stored under it and the
//! caller reads the id back out of the returned record.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use karma_ledger::dispatch::{dispatch, DispatchReply, Invocation};
use karma_ledger::ledger::{ErrorClass, Ledger, LedgerError, ReadMode};
use karma_ledger::storage::SledStore;

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The ledger engine over the node's sled store.
    pub ledger: Arc<Ledger<SledStore>>,
    /// Serializes mutating invocations. The ledger core assumes sole
    /// writership per call; this lock is where that assumption is made
    /// true.
    pub write_lock: Arc<tokio::sync::Mutex<()>>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// ISO-8601 timestamp of node startup.
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Assembles the state around an opened ledger engine.
    pub fn new(ledger: Ledger<SledStore>, metrics: SharedMetrics, version: String) -> Self {
        Self {
            version,
            ledger: Arc::new(ledger),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
            metrics,
            started_at: chrono::Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured RPC port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/rpc", post(rpc_handler))
        .route("/root", get(root_handler))
        .route("/users/:id", get(user_handler))
        .route("/transactions/:id", get(transaction_handler))
        .route("/metrics", get(node_metrics_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// JSON-RPC Types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version. Must be "2.0".
    pub jsonrpc: String,
    /// The method to invoke.
    pub method: String,
    /// Method parameters: the ledger's positional string argument list.
    pub params: Option<serde_json::Value>,
    /// Request identifier. Echoed back in the response.
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version. Always "2.0".
    pub jsonrpc: String,
    /// The result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// The error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Request identifier, echoed from the request.
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Short human-readable error description.
    pub message: String,
    /// Optional structured error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Maps a ledger error family onto its JSON-RPC error code.
///
/// `-32602` covers the whole InvalidArgument family (the standard "invalid
/// params" code); the ledger-specific families live in the server-defined
/// range. `-32010` for a failed compensation deliberately stands apart
/// from plain storage faults — a client that sees it must not retry.
fn rpc_code(class: ErrorClass) -> i32 {
    match class {
        ErrorClass::InvalidArgument => -32602,
        ErrorClass::NotFound => -32001,
        ErrorClass::InsufficientFunds => -32002,
        ErrorClass::Storage => -32603,
        ErrorClass::RollbackFailed => -32010,
    }
}

fn rpc_error_for(err: &LedgerError) -> JsonRpcError {
    JsonRpcError {
        code: rpc_code(err.class()),
        message: err.to_string(),
        data: Some(serde_json::json!({ "class": err.class().to_string() })),
    }
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Whether a Root record exists in the store.
    pub initialized: bool,
    /// Read-accessor mode: "strict" or "lenient".
    pub read_mode: String,
    /// Seconds since the node started.
    pub uptime_seconds: i64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.).
/// It intentionally does not check store health — that belongs in
/// `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns node status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let initialized = state
        .ledger
        .repository()
        .root_exists()
        .unwrap_or(false);
    state.metrics.root_initialized.set(initialized as i64);

    let read_mode = match state.ledger.read_mode() {
        ReadMode::Strict => "strict",
        ReadMode::Lenient => "lenient",
    };

    let resp = StatusResponse {
        version: state.version.clone(),
        initialized,
        read_mode: read_mode.to_string(),
        uptime_seconds: (chrono::Utc::now() - state.started_at).num_seconds(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `POST /rpc` — JSON-RPC 2.0 gateway.
///
/// Method names are the ledger's wire function names under a `karma_`
/// prefix (`karma_exchange`, `karma_getUser`, ...); params are the
/// positional string argument list. Unknown methods return error code
/// -32601 (Method not found).
async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    if req.jsonrpc != "2.0" {
        return Json(JsonRpcResponse {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(JsonRpcError {
                code: -32600,
                message: "Invalid Request: jsonrpc must be \"2.0\"".into(),
                data: None,
            }),
            id: req.id,
        });
    }

    let Some(function) = req.method.strip_prefix("karma_") else {
        return Json(JsonRpcResponse {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(JsonRpcError {
                code: -32601,
                message: format!("Method not found: {}", req.method),
                data: None,
            }),
            id: req.id,
        });
    };

    if function == "version" {
        return Json(JsonRpcResponse {
            jsonrpc: "2.0".into(),
            result: Some(serde_json::json!(state.version)),
            error: None,
            id: req.id,
        });
    }

    let args = match string_params(req.params.as_ref()) {
        Ok(args) => args,
        Err(message) => {
            return Json(JsonRpcResponse {
                jsonrpc: "2.0".into(),
                result: None,
                error: Some(JsonRpcError {
                    code: -32602,
                    message,
                    data: None,
                }),
                id: req.id,
            });
        }
    };

    let (result, error) = match invoke_ledger(&state, function, args).await {
        Ok(value) => (Some(value), None),
        Err(LedgerError::UnknownFunction(_)) => (
            None,
            Some(JsonRpcError {
                code: -32601,
                message: format!("Method not found: {}", req.method),
                data: None,
            }),
        ),
        Err(err) => (None, Some(rpc_error_for(&err))),
    };

    Json(JsonRpcResponse {
        jsonrpc: "2.0".into(),
        result,
        error,
        id: req.id,
    })
}

/// Extracts the positional string argument list from RPC params.
///
/// Absent params count as an empty list so zero-argument reads like
/// `karma_getRoot` need not send `"params": []`.
fn string_params(params: Option<&serde_json::Value>) -> Result<Vec<String>, String> {
    let Some(params) = params else {
        return Ok(Vec::new());
    };
    let arr = params
        .as_array()
        .ok_or_else(|| "Invalid params: expected an array of strings".to_string())?;
    arr.iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| format!("Invalid params: expected string, got {}", v))
        })
        .collect()
}

/// Dispatches one ledger invocation, serializing mutations and recording
/// metrics around the call.
async fn invoke_ledger(
    state: &AppState,
    function: &str,
    args: Vec<String>,
) -> Result<serde_json::Value, LedgerError> {
    let mutating = matches!(
        function,
        "init" | "additional" | "createUser" | "exchange" | "transfer"
    );

    let call_id = uuid::Uuid::new_v4().to_string();
    let call = Invocation::new(function, args, call_id);

    let timer = state.metrics.operation_latency_seconds.start_timer();
    state.metrics.operations_total.inc();

    let outcome = if mutating {
        let _guard = state.write_lock.lock().await;
        dispatch(&state.ledger, &call)
    } else {
        dispatch(&state.ledger, &call)
    };
    timer.observe_duration();

    match &outcome {
        Ok(DispatchReply::Transaction(record)) if mutating => {
            state.metrics.transactions_recorded_total.inc();
            tracing::info!(function, call_id = %record.id, "movement committed");
        }
        Ok(DispatchReply::User(_)) if function == "createUser" => {
            state.metrics.users_created_total.inc();
        }
        Ok(_) => {}
        Err(err) => {
            state.metrics.operation_failures_total.inc();
            if err.class() == ErrorClass::RollbackFailed {
                state.metrics.rollback_failures_total.inc();
                tracing::error!(function, error = %err, "compensating write failed");
            }
        }
    }

    let reply = outcome?;
    Ok(serde_json::to_value(&reply)
        .expect("ledger records always serialize"))
}

/// `GET /root` — returns the issuing account.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    read_response(state.ledger.get_root())
}

/// `GET /users/:id` — returns a user account by id.
async fn user_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    read_response(state.ledger.get_user(&id))
}

/// `GET /transactions/:id` — returns a transaction record by call id.
async fn transaction_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    read_response(state.ledger.get_transaction(&id))
}

/// Folds a ledger read into a REST response: 200 with the bare record,
/// 404 for a missing record, 500 for a store fault.
fn read_response<T: Serialize>(read: Result<T, LedgerError>) -> axum::response::Response {
    match read {
        Ok(record) => (StatusCode::OK, Json(serde_json::to_value(record).unwrap())).into_response(),
        Err(err @ LedgerError::NotFound { .. }) => {
            let body = ErrorResponse {
                error: err.to_string(),
            };
            (StatusCode::NOT_FOUND, Json(serde_json::to_value(body).unwrap())).into_response()
        }
        Err(err) => {
            let body = ErrorResponse {
                error: err.to_string(),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::to_value(body).unwrap()),
            )
                .into_response()
        }
    }
}

/// `GET /metrics` — renders the node's metrics in Prometheus text format
/// on the API port. The standalone metrics port serves the same registry.
async fn node_metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
