//! PharmaAI service entry point.
//!
//! Loads configuration, wires the Groq client and in-memory transcript store
//! into the application services, and serves the HTTP API.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pharma_ai::adapters::ai::{GroqClient, GroqConfig};
use pharma_ai::adapters::http::{api_router, AppState};
use pharma_ai::adapters::store::InMemoryTranscriptStore;
use pharma_ai::application::prompts::BASE_SYSTEM_PROMPT;
use pharma_ai::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    config.validate()?;

    let api_key = config.ai.groq_api_key.clone().unwrap_or_default();
    let client = GroqClient::new(
        GroqConfig::new(api_key)
            .with_model(config.ai.model.clone())
            .with_base_url(config.ai.base_url.clone())
            .with_timeout(config.ai.timeout()),
    )?;

    let state = AppState::new(
        Arc::new(client),
        Arc::new(InMemoryTranscriptStore::new(BASE_SYSTEM_PROMPT)),
    );

    let cors = cors_layer(&config);
    let app = api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, model = %config.ai.model, "starting PharmaAI server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
