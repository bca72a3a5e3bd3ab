//! Per-client rate limiting for the search operations.
//!
//! Fixed window: a client's window opens with its first request and every
//! request in the next `window` counts against `max_requests`. Once the
//! window has fully elapsed the next request opens a fresh one.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;

/// Outcome of a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Accepted; `remaining` more requests fit in the current window.
    Allowed { remaining: u32 },
    /// Rejected until the current window closes.
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Narrow interface over the counter store so it can be replaced by a shared
/// one without touching the middleware.
pub trait RateLimiter: Send + Sync {
    /// Count one operation for `client` and decide whether it may proceed.
    fn check(&self, client: IpAddr) -> RateDecision;

    /// Human-readable limit, e.g. `30 per 1 minute`.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// In-memory fixed window limiter keyed by client address.
pub struct FixedWindowLimiter {
    windows: DashMap<IpAddr, Window>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check against an explicit clock reading.
    ///
    /// The entry guard holds the shard lock for the whole reset, compare and
    /// increment, so concurrent requests from one client are serialized.
    pub fn check_at(&self, client: IpAddr, now: Instant) -> RateDecision {
        let mut entry = self.windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count < self.max_requests {
            entry.count += 1;
            RateDecision::Allowed {
                remaining: self.max_requests - entry.count,
            }
        } else {
            RateDecision::Limited {
                retry_after: self.window.saturating_sub(now.saturating_duration_since(entry.started)),
            }
        }
    }

    /// Drop windows that have closed. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before.saturating_sub(self.windows.len())
    }

    /// Number of clients with an open window.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Periodically purge closed windows until shutdown.
    pub async fn run_sweeper(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.window);
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = self.purge_expired(Instant::now());
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.tracked_clients(), "Purged rate limit windows");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn check(&self, client: IpAddr) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    fn describe(&self) -> String {
        format!("{} per {}", self.max_requests, describe_window(self.window))
    }
}

fn describe_window(window: Duration) -> String {
    let secs = window.as_secs();
    let (amount, unit) = if secs != 0 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs != 0 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

/// Middleware applied to the throttled routes only.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<dyn RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let client = addr.ip();
    match limiter.check(client) {
        RateDecision::Allowed { remaining } => {
            tracing::trace!(client = %client, remaining, "Rate limit check passed");
            next.run(request).await
        }
        RateDecision::Limited { retry_after } => {
            tracing::warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
            metrics::record_rate_limited();
            ApiError::RateLimited {
                limit: limiter.describe(),
                retry_after,
            }
            .into_response()
        }
    }
}
