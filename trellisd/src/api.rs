//! HTTP admission API.
//!
//! Thin boundary in front of the workflow runtime:
//! - start an order workflow
//! - forward approve/cancel/address signals
//! - serve the status query
//!
//! Not-found workflows map to 404; everything else surfaces as 500-class.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use trellis_domain::{OrderItem, StartOrderInput};
use trellis_engine::{EngineError, Runtime};
use trellis_workflows::{
    order_workflow_id, start_order, SIGNAL_APPROVE, SIGNAL_CANCEL, SIGNAL_UPDATE_ADDRESS,
};

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState {
    pub runtime: Arc<Runtime>,
    pub orders_queue: String,
    pub shipping_queue: String,
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Body of `POST /orders/{id}/start`.
#[derive(Debug, Deserialize)]
pub struct StartOrderBody {
    pub payment_id: String,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub items: Option<Vec<OrderItem>>,
}

/// Response after starting an order workflow.
#[derive(Debug, Serialize, Deserialize)]
pub struct StartOrderResponse {
    pub workflow_id: String,
    pub run_id: String,
}

/// Body of `POST /orders/{id}/signals/cancel`.
#[derive(Debug, Default, Deserialize)]
pub struct CancelBody {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Body of `POST /orders/{id}/signals/address`.
#[derive(Debug, Deserialize)]
pub struct AddressBody {
    pub address: Value,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/orders/:id/start", post(start_handler))
        .route("/orders/:id/signals/approve", post(approve_handler))
        .route("/orders/:id/signals/cancel", post(cancel_handler))
        .route("/orders/:id/signals/address", post(address_handler))
        .route("/orders/:id/status", get(status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<Value> {
    Json(json!({"ok": true}))
}

/// Start an order workflow.
async fn start_handler(
    State(state): State<Arc<ApiState>>,
    Path(order_id): Path<String>,
    Json(body): Json<StartOrderBody>,
) -> Result<Json<StartOrderResponse>, ApiError> {
    let input = StartOrderInput {
        order_id,
        payment_id: body.payment_id,
        address: body.address,
        items: body.items,
    };

    let handle = start_order(
        &state.runtime,
        input,
        &state.orders_queue,
        &state.shipping_queue,
    )
    .await
    .map_err(to_error_response)?;

    Ok(Json(StartOrderResponse {
        workflow_id: handle.workflow_id.clone(),
        run_id: handle.run_id.to_string(),
    }))
}

/// Forward the approve signal.
async fn approve_handler(
    State(state): State<Arc<ApiState>>,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    deliver_signal(&state, &order_id, SIGNAL_APPROVE, Value::Null).await
}

/// Forward the cancel signal.
async fn cancel_handler(
    State(state): State<Arc<ApiState>>,
    Path(order_id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> Result<Json<Value>, ApiError> {
    let reason = body.and_then(|Json(body)| body.reason);
    deliver_signal(&state, &order_id, SIGNAL_CANCEL, json!({"reason": reason})).await
}

/// Forward the address-update signal.
async fn address_handler(
    State(state): State<Arc<ApiState>>,
    Path(order_id): Path<String>,
    Json(body): Json<AddressBody>,
) -> Result<Json<Value>, ApiError> {
    deliver_signal(&state, &order_id, SIGNAL_UPDATE_ADDRESS, body.address).await
}

/// Serve the status query.
async fn status_handler(
    State(state): State<Arc<ApiState>>,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let handle = state
        .runtime
        .handle(&order_workflow_id(&order_id))
        .await
        .map_err(to_error_response)?;

    Ok(Json(handle.query()))
}

// =============================================================================
// Helpers
// =============================================================================

async fn deliver_signal(
    state: &ApiState,
    order_id: &str,
    signal: &str,
    payload: Value,
) -> Result<Json<Value>, ApiError> {
    state
        .runtime
        .signal_workflow(&order_workflow_id(order_id), signal, payload)
        .await
        .map_err(to_error_response)?;

    Ok(Json(json!({"ok": true})))
}

fn to_error_response(error: EngineError) -> ApiError {
    let status = match &error {
        EngineError::WorkflowNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::WorkflowAlreadyStarted(_) => StatusCode::CONFLICT,
        EngineError::UnknownSignal { .. } | EngineError::Payload(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// =============================================================================
// Tests
// =============================================================================
