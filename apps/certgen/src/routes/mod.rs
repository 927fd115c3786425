pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::certificates::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/templates/inspect", post(handlers::handle_inspect))
        .route("/api/v1/records/parse", post(handlers::handle_parse_records))
        .route(
            "/api/v1/certificates/preview",
            post(handlers::handle_preview),
        )
        .route("/api/v1/certificates/batch", post(handlers::handle_batch))
        .with_state(state)
}
