use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AdminState};

/// Build the admin router.
pub fn build_router(state: AdminState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/ballot-boxes/:id", get(handler::ballot_box_handler))
        .route("/v1/ballot-boxes/:id/emit", post(handler::emit_handler))
        .route("/v1/ballot-boxes/:id/return", post(handler::return_handler))
        .route(
            "/v1/ballot-boxes/:id/session/stop",
            post(handler::stop_session_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
