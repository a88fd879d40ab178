//! In-process rate limiting
//!
//! A sliding-window counter keyed by (route scope, client IP), checked
//! before any database work so high-volume probing is shed early. This is
//! deliberately not a substitute for the account lockout policy: the
//! limiter throttles by network origin, the lockout throttles by account
//! after a password check, and both must be present.
//!
//! Counters are process-local. A distributed deployment needs a shared
//! store behind the same interface; that is an external dependency this
//! crate does not provide.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// How many requests are allowed per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuota {
    pub limit: u32,
    pub window: Duration,
}

impl RateQuota {
    pub const fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

/// Identifies one counter: a route scope plus the client address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey {
    scope: String,
    client: String,
}

impl RateKey {
    pub fn new(scope: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            client: client.into(),
        }
    }
}

/// The outcome of a rate limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window (0 when denied).
    pub remaining: u32,
    /// How long until the window resets; set only when denied.
    pub retry_after: Option<Duration>,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Sliding-window rate limiter.
///
/// Each key's window resets lazily the first time it is seen after its
/// prior window elapsed. A periodic sweep removes stale keys to bound
/// memory; it is best-effort and not needed for correctness.
///
/// Construct once at process start and share via `Arc`.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<RateKey, Window>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Record a request against `key` and decide whether it is allowed.
    pub fn check(&self, key: RateKey, quota: RateQuota) -> RateLimitDecision {
        let now = Instant::now();

        let mut window = self.windows.entry(key).or_insert_with(|| Window {
            started: now,
            count: 0,
        });

        let elapsed = now.duration_since(window.started);
        if elapsed >= quota.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= quota.limit {
            let retry_after = quota.window.saturating_sub(now.duration_since(window.started));
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after: Some(retry_after),
            };
        }

        window.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: quota.limit - window.count,
            retry_after: None,
        }
    }

    /// Drop the counter for a key, restoring its full quota.
    pub fn reset(&self, key: &RateKey) {
        self.windows.remove(key);
    }

    /// Number of live counters, for tests and introspection.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Remove counters whose window elapsed more than `max_age` ago.
    pub fn sweep(&self, max_age: Duration) {
        let now = Instant::now();
        self.windows
            .retain(|_, window| now.duration_since(window.started) < max_age);
    }

    /// Start the background sweep task.
    ///
    /// Runs until the watch channel signals shutdown.
    pub fn start_cleanup_task(
        self: &Arc<Self>,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        const SWEEP_INTERVAL: Duration = Duration::from_secs(300);
        const MAX_AGE: Duration = Duration::from_secs(3600);

        let limiter = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(SWEEP_INTERVAL);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let before = limiter.len();
                        limiter.sweep(MAX_AGE);
                        let removed = before.saturating_sub(limiter.len());
                        if removed > 0 {
                            tracing::debug!(removed, "Swept stale rate limit counters");
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down rate limiter cleanup task");
                        break;
                    }
                }
            }
        })
    }
}
