// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory sliding-window rate limiting for the ingestion boundary.
//!
//! One window per `(key, bucket)` pair, all state behind a single mutex.
//! Admission control, not queuing: a rejected caller gets an immediate
//! negative and is never blocked. Nothing here is persisted; a process
//! restart resets every window.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// An ordered sequence of event timestamps bounded to `limit` occurrences
/// within `interval`.
#[derive(Debug)]
struct SlidingWindow {
    limit: usize,
    interval: Duration,
    timestamps: VecDeque<Instant>,
}

impl SlidingWindow {
    fn new(limit: usize, interval: Duration) -> Self {
        Self {
            limit,
            interval,
            timestamps: VecDeque::new(),
        }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.duration_since(oldest) >= self.interval {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_allowed(&mut self, now: Instant) -> bool {
        self.evict(now);
        self.timestamps.len() < self.limit
    }

    fn add(&mut self, now: Instant) {
        self.timestamps.push_back(now);
        self.evict(now);
    }
}

/// Sliding-window rate limiter guarding the ingestion boundary.
///
/// Explicitly owned, injectable state: construct one per gateway (or one
/// per test case), never a process-wide singleton.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<(String, String), SlidingWindow>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether an event at `(key, bucket)` is admitted right now.
    ///
    /// Evicts timestamps older than `now - interval`; if fewer than `limit`
    /// remain, records the event and returns `true`, else `false`.
    pub async fn check(&self, key: &str, bucket: &str, limit: usize, interval: Duration) -> bool {
        self.check_at(key, bucket, limit, interval, Instant::now())
            .await
    }

    /// Like [`check`](Self::check) with an explicit clock, the seam tests
    /// use to step time deterministically.
    pub async fn check_at(
        &self,
        key: &str,
        bucket: &str,
        limit: usize,
        interval: Duration,
        now: Instant,
    ) -> bool {
        let mut windows = self.windows.lock().await;
        let window = windows
            .entry((key.to_string(), bucket.to_string()))
            .or_insert_with(|| SlidingWindow::new(limit, interval));
        // Callers may tighten or relax the limit between checks; the window
        // adopts the latest parameters.
        window.limit = limit;
        window.interval = interval;
        if !window.is_allowed(now) {
            debug!(key, bucket, limit, "rate limit window full, rejecting");
            return false;
        }
        window.add(now);
        true
    }

    /// Clear the window state for `(key, bucket)`.
    pub async fn reset(&self, key: &str, bucket: &str) {
        let mut windows = self.windows.lock().await;
        windows.remove(&(key.to_string(), bucket.to_string()));
    }
}
