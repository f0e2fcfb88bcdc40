// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cytara serve` command implementation.
//!
//! Opens the database, warms the bot-token cache, and runs the gateway
//! until the process is stopped.

use std::sync::Arc;
use std::time::Duration;

use cytara_config::CytaraConfig;
use cytara_core::CytaraError;
use cytara_gateway::{
    GatewayState, IngestSettings, RetrievalSettings, ServerConfig, TokenCache, start_server,
};
use cytara_ratelimit::RateLimiter;
use cytara_storage::Database;
use tracing::{info, warn};

/// Run the `cytara serve` command.
pub async fn run_serve(config: CytaraConfig) -> Result<(), CytaraError> {
    init_tracing(&config.platform.log_level);

    info!("starting cytara serve");

    let db =
        Database::open_with_wal(&config.storage.database_path, config.storage.wal_mode).await?;
    info!(path = %config.storage.database_path, "database ready");

    let tokens = Arc::new(TokenCache::new(
        db.clone(),
        Duration::from_secs(config.ingest.token_cache_ttl_secs),
    ));
    match tokens.refresh().await {
        Ok(count) => info!(active_bots = count, "token cache warmed"),
        Err(e) => warn!(error = %e, "token cache warmup failed, will retry on demand"),
    }

    let state = GatewayState {
        db,
        tokens,
        limiter: Arc::new(RateLimiter::new()),
        ingest: IngestSettings {
            rate_limit: config.ingest.rate_limit,
            rate_interval: Duration::from_secs(config.ingest.rate_interval_secs),
        },
        retrieval: RetrievalSettings {
            search_limit: config.retrieval.search_limit,
            sample_size: config.retrieval.sample_size,
        },
    };

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    start_server(&server_config, state).await
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cytara={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
