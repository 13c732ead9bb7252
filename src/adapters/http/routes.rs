//! Route table for the HTTP API.

use axum::routing::{delete, get, post};
use axum::Router;

use super::handlers::{self, AppState};

/// Builds the `/api` router over the given state.
pub fn api_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/diagnose", post(handlers::diagnose))
        .route("/conversation/:user_id", delete(handlers::clear_conversation))
        .route("/health", get(handlers::health));

    Router::new().nest("/api", api).with_state(state)
}
