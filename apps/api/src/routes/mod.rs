pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers as generation;
use crate::optimize::handlers as optimize;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/generate-stream",
            get(generation::handle_generate_stream),
        )
        .route("/api/generate", post(generation::handle_generate))
        .route("/api/optimize", post(optimize::handle_optimize))
        .with_state(state)
}
