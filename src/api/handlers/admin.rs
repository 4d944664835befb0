//! Admin handlers. Every route here sits behind `require_admin`.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};
use serde_json::{Value, json};

use crate::api::state::AppState;
use crate::domain::{ApiResponse, ResetReport, ResetRequest};
use crate::error::{AppError, Result};
use crate::service::EXPORT_FILENAME;

/// Confirms the passphrase; the middleware already rejected bad ones.
pub async fn verify() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({ "admin": true })))
}

/// Download the board as CSV.
pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let csv = state.board_service.export().await?;

    let headers = [
        (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{EXPORT_FILENAME}\""),
        ),
    ];

    Ok((headers, csv))
}

/// Clear every reservation. The body must carry `"confirm": true`; a request
/// without a JSON body counts as unconfirmed.
pub async fn reset(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ResetRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ResetReport>>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => ResetRequest::default(),
        Err(e) => return Err(AppError::BadRequest(e.body_text())),
    };

    if !request.confirm {
        return Err(AppError::ResetNotConfirmed);
    }

    let report = state.board_service.reset().await?;
    Ok(Json(ApiResponse::with_message(report, "Board reset")))
}
