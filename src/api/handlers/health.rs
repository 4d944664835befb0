//! Health check handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::{Value, json};

use crate::api::state::AppState;
use crate::error::ErrorCode;

/// Liveness probe - always returns 200 if the service is running.
pub async fn health() -> Json<Value> {
    Json(json!({
        "code": 0,
        "message": "success",
        "data": {
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

/// Readiness probe - checks that the reservation store answers.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let storage_ok = state.board_service.health_check().await.is_ok();

    let status_code = if storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = Json(json!({
        "code": if storage_ok { 0 } else { ErrorCode::SERVICE_UNAVAILABLE.as_i32() },
        "message": if storage_ok { "success" } else { "service unavailable" },
        "data": {
            "ready": storage_ok,
            "components": {
                "storage": storage_ok,
                "backend": state.board_service.backend_name()
            }
        }
    }));

    (status_code, response)
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled\n".to_string()),
    }
}
