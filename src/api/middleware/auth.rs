//! Admin authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::error::AppError;

/// Extract bearer token from Authorization header.
fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    let auth_header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;

    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

/// Middleware that requires the admin passphrase as a bearer token.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(passphrase) = extract_bearer_token(&req) else {
        debug!(path = %req.uri().path(), "Admin request without passphrase");
        return AppError::Unauthorized.into_response();
    };

    if !state.admin_gate.verify(passphrase) {
        debug!(path = %req.uri().path(), "Admin request with wrong passphrase");
        return AppError::Unauthorized.into_response();
    }

    next.run(req).await
}
