//! Per-agent request ceilings over fixed clock windows.
//!
//! Each agent has a minute counter and an hour counter in the shared store,
//! keyed by the window's truncated start time:
//!
//! ```text
//! ratelimit:{agent}:minute:2026-10-18T09:41
//! ratelimit:{agent}:hour:2026-10-18T09
//! ```
//!
//! A new window means a new key, so counters reset without cleanup and the
//! old key simply expires. Updates are read-then-write with no atomicity:
//! concurrent requests from one agent can overshoot a ceiling slightly.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LimitsConfig;
use crate::storage::KvStore;

const MINUTE_TTL: Duration = Duration::from_secs(120);
const HOUR_TTL: Duration = Duration::from_secs(3660);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitWindow {
    Minute,
    Hour,
}

impl LimitWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitWindow::Minute => "minute",
            LimitWindow::Hour => "hour",
        }
    }

    /// Truncated window start used as the bucket label
    pub fn label(&self, now: DateTime<Utc>) -> String {
        match self {
            LimitWindow::Minute => now.format("%Y-%m-%dT%H:%M").to_string(),
            LimitWindow::Hour => now.format("%Y-%m-%dT%H").to_string(),
        }
    }

    fn ttl(&self) -> Duration {
        match self {
            LimitWindow::Minute => MINUTE_TTL,
            LimitWindow::Hour => HOUR_TTL,
        }
    }
}

/// Outcome of [`RateLimiter::admit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateDecision {
    Allow,
    Deny { window: LimitWindow, limit: u64 },
}

impl fmt::Display for RateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateDecision::Allow => write!(f, "allowed"),
            RateDecision::Deny { window, limit } => {
                write!(f, "{} limit of {limit} requests exceeded", window.as_str())
            }
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KvStore>,
    per_minute: u64,
    per_hour: u64,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KvStore>, limits: &LimitsConfig) -> Self {
        Self {
            store,
            per_minute: limits.requests_per_minute,
            per_hour: limits.requests_per_hour,
        }
    }

    pub fn bucket_key(agent_id: &str, window: LimitWindow, now: DateTime<Utc>) -> String {
        format!(
            "ratelimit:{agent_id}:{}:{}",
            window.as_str(),
            window.label(now)
        )
    }

    /// Decide whether `agent_id` may make another request at `now`.
    ///
    /// Admitting increments both counters; a denial leaves them untouched.
    pub async fn admit(&self, agent_id: &str, now: DateTime<Utc>) -> RateDecision {
        let minute_key = Self::bucket_key(agent_id, LimitWindow::Minute, now);
        let hour_key = Self::bucket_key(agent_id, LimitWindow::Hour, now);

        let minute_count = self.read_count(&minute_key).await;
        let hour_count = self.read_count(&hour_key).await;

        if minute_count >= self.per_minute {
            debug!(agent_id, minute_count, "Rate limit check: minute limit hit");
            return RateDecision::Deny {
                window: LimitWindow::Minute,
                limit: self.per_minute,
            };
        }

        if hour_count >= self.per_hour {
            debug!(agent_id, hour_count, "Rate limit check: hour limit hit");
            return RateDecision::Deny {
                window: LimitWindow::Hour,
                limit: self.per_hour,
            };
        }

        self.write_count(&minute_key, minute_count + 1, LimitWindow::Minute)
            .await;
        self.write_count(&hour_key, hour_count + 1, LimitWindow::Hour)
            .await;

        RateDecision::Allow
    }

    async fn read_count(&self, key: &str) -> u64 {
        match self.store.get(key).await {
            Ok(Some(value)) => value.trim().parse().unwrap_or(0),
            Ok(None) => 0,
            Err(e) => {
                warn!(key, error = %e, "Rate counter read failed, counting as zero");
                0
            }
        }
    }

    async fn write_count(&self, key: &str, count: u64, window: LimitWindow) {
        if let Err(e) = self
            .store
            .put(key, &count.to_string(), Some(window.ttl()))
            .await
        {
            warn!(key, error = %e, "Rate counter write failed");
        }
    }
}
