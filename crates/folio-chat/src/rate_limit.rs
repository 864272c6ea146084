//! Sliding-window send limiter.
//!
//! Keeps the timestamps (epoch milliseconds) of recent sends as a JSON array
//! in the durable store. A send is allowed while fewer than `max_requests`
//! timestamps fall inside the trailing window. This is a cooperative,
//! client-side throttle to bound provider cost; it is not a security control.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use folio_core::config::RateLimitConfig;
use folio_core::error::Result;
use folio_core::storage::KeyValueStore;

/// Shared state for the limiter.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    key: String,
    /// Maximum sends allowed inside one window.
    max_requests: usize,
    /// Window length in milliseconds.
    window_ms: i64,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &RateLimitConfig) -> Self {
        Self {
            store,
            key: config.storage_key.clone(),
            max_requests: config.max_requests,
            window_ms: i64::try_from(config.window_secs.saturating_mul(1000)).unwrap_or(i64::MAX),
        }
    }

    /// Try to record a send now. Returns `true` if the send is allowed.
    pub fn try_acquire(&self) -> Result<bool> {
        self.try_acquire_at(Utc::now())
    }

    /// Try to record a send at `now`.
    ///
    /// Expired timestamps are pruned. A blocked attempt records nothing.
    pub fn try_acquire_at(&self, now: DateTime<Utc>) -> Result<bool> {
        let now_ms = now.timestamp_millis();
        let mut recent = self.recent(now_ms)?;

        if recent.len() >= self.max_requests {
            debug!(in_window = recent.len(), max = self.max_requests, "Send blocked by rate limit");
            return Ok(false);
        }

        recent.push(now_ms);
        self.store
            .set(&self.key, &serde_json::to_string(&recent)?)?;
        Ok(true)
    }

    /// Sends still available at `now`.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let recent = self.recent(now.timestamp_millis())?;
        Ok(self.max_requests.saturating_sub(recent.len()))
    }

    /// Timestamps currently inside the window.
    fn recent(&self, now_ms: i64) -> Result<Vec<i64>> {
        let stamps: Vec<i64> = match self.store.get(&self.key)? {
            None => Vec::new(),
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(key = %self.key, error = %e, "Discarding unreadable rate limit history");
                Vec::new()
            }),
        };
        Ok(stamps
            .into_iter()
            .filter(|&t| now_ms.saturating_sub(t) < self.window_ms)
            .collect())
    }
}
