//! HTTP adapter: axum handlers, DTOs, and routing.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::api_router;
