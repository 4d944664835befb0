//! Router setup and configuration.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower::{ServiceBuilder, util::option_layer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::handlers::{admin, board, health};
use crate::api::middleware::auth::require_admin;
use crate::api::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    // Health and metrics routes (no auth required)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics));

    // Board routes (open to participants)
    let board_routes = Router::new()
        .route("/", get(board::get_board))
        .route("/events", get(board::board_events))
        .route("/{number}", get(board::get_slot))
        .route("/{number}/claim", post(board::claim));

    // Admin routes (passphrase required)
    let admin_routes = Router::new()
        .route("/verify", get(admin::verify))
        .route("/export", get(admin::export))
        .route("/reset", post(admin::reset))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // The browser widget may be served from another origin
    let cors = state
        .config
        .server
        .cors_permissive
        .then(CorsLayer::permissive);

    Router::new()
        .merge(health_routes)
        .nest("/v1/board", board_routes)
        .nest("/v1/admin", admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(option_layer(cors)),
        )
        .with_state(state)
}
