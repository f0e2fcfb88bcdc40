// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use cytara_core::CytaraError;
use cytara_ratelimit::RateLimiter;
use cytara_storage::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::tokens::TokenCache;

/// Ingest admission settings.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Submissions admitted per chat within one interval.
    pub rate_limit: usize,
    pub rate_interval: Duration,
}

/// Retrieval settings for the quote endpoint.
#[derive(Debug, Clone)]
pub struct RetrievalSettings {
    /// Maximum ranked results considered per query.
    pub search_limit: usize,
    /// Floor for the ranking candidate pool.
    pub sample_size: usize,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub db: Database,
    pub tokens: Arc<TokenCache>,
    pub limiter: Arc<RateLimiter>,
    pub ingest: IngestSettings,
    pub retrieval: RetrievalSettings,
}

/// Gateway server configuration (mirrors GatewayConfig from cytara-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the gateway router over shared state. Split out from
/// [`start_server`] so tests can drive it without binding a socket.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/ingest/{token}/submissions", post(handlers::post_submission))
        .route("/submissions/{id}/decision", post(handlers::post_decision))
        .route("/personas/{id}/quote", get(handlers::get_quote))
        .route("/health", get(handlers::get_health))
        .route("/internal/refresh-tokens", post(handlers::post_refresh_tokens))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve the gateway.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), CytaraError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CytaraError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| CytaraError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
