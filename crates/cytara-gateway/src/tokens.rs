// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot token resolution with a TTL cache.
//!
//! Ingest routes carry a bot token in the path; the cache maps it to a
//! persona without touching SQLite on every request. A miss forces a
//! refresh before giving up, so a newly registered bot is usable
//! immediately, and administrative mutations can call [`TokenCache::refresh`]
//! eagerly instead of waiting out the TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use cytara_core::CytaraError;
use cytara_storage::models::BotBinding;
use cytara_storage::{Database, queries};
use tokio::sync::RwLock;
use tracing::debug;

struct CacheInner {
    by_token: HashMap<String, BotBinding>,
    refreshed_at: Option<Instant>,
}

pub struct TokenCache {
    db: Database,
    ttl: Duration,
    inner: RwLock<CacheInner>,
}

impl TokenCache {
    pub fn new(db: Database, ttl: Duration) -> Self {
        Self {
            db,
            ttl,
            inner: RwLock::new(CacheInner {
                by_token: HashMap::new(),
                refreshed_at: None,
            }),
        }
    }

    fn is_fresh(&self, inner: &CacheInner, now: Instant) -> bool {
        inner
            .refreshed_at
            .is_some_and(|at| now.duration_since(at) < self.ttl)
    }

    /// Rebuild the cache from storage. Returns the number of active
    /// bindings loaded.
    pub async fn refresh(&self) -> Result<usize, CytaraError> {
        let bindings = queries::bots::list_active_bindings(&self.db).await?;
        let mut inner = self.inner.write().await;
        inner.by_token = bindings
            .into_iter()
            .map(|b| (b.api_token.clone(), b))
            .collect();
        inner.refreshed_at = Some(Instant::now());
        debug!(bindings = inner.by_token.len(), "token cache refreshed");
        Ok(inner.by_token.len())
    }

    /// Map a token to its binding. A stale cache is refreshed first; a
    /// miss on a fresh cache forces one more refresh before returning
    /// `None`.
    pub async fn resolve(&self, token: &str) -> Result<Option<BotBinding>, CytaraError> {
        let now = Instant::now();
        {
            let inner = self.inner.read().await;
            if self.is_fresh(&inner, now) {
                if let Some(binding) = inner.by_token.get(token) {
                    return Ok(Some(binding.clone()));
                }
            }
        }

        self.refresh().await?;
        let inner = self.inner.read().await;
        Ok(inner.by_token.get(token).cloned())
    }

    /// Number of cached bindings, refreshing first if stale.
    pub async fn active_count(&self) -> Result<usize, CytaraError> {
        let now = Instant::now();
        {
            let inner = self.inner.read().await;
            if self.is_fresh(&inner, now) {
                return Ok(inner.by_token.len());
            }
        }
        self.refresh().await
    }
}
