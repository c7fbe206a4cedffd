//! Per-source fixed window rate limiter
//!
//! Counts requests in a fixed window and resets the count lazily on the
//! first call after the window has elapsed. State is in-process and per
//! instance; it does not coordinate across processes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use pulse_core::RateBudget;

#[derive(Debug)]
struct Window {
    started_at: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    budget: RateBudget,
    window: Mutex<Window>,
    /// Counter for debugging - total requests recorded
    total_requests: AtomicU64,
    /// Counter for debugging - checks that found the budget exhausted
    exhausted_checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(name: &str, budget: RateBudget) -> Self {
        Self {
            name: name.to_string(),
            budget,
            window: Mutex::new(Window {
                started_at: Instant::now(),
                count: 0,
            }),
            total_requests: AtomicU64::new(0),
            exhausted_checks: AtomicU64::new(0),
        }
    }

    /// Lock the window, resetting it first if it has elapsed
    fn current(&self) -> parking_lot::MutexGuard<'_, Window> {
        let mut window = self.window.lock();
        if window.started_at.elapsed() >= self.budget.window {
            if window.count > 0 {
                debug!(
                    "[RATE_LIMITER:{}] window reset after {} requests",
                    self.name, window.count
                );
            }
            window.started_at = Instant::now();
            window.count = 0;
        }
        window
    }

    /// True when the in-window count has reached the budget
    pub fn is_exhausted(&self) -> bool {
        let exhausted = self.current().count >= self.budget.max_requests;
        if exhausted {
            self.exhausted_checks.fetch_add(1, Ordering::Relaxed);
        }
        exhausted
    }

    /// Count one request against the current window
    pub fn record_request(&self) {
        self.current().count += 1;
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests left in the current window
    pub fn remaining(&self) -> u32 {
        self.budget.max_requests.saturating_sub(self.current().count)
    }

    /// Time until the current window resets
    pub fn resets_in(&self) -> Duration {
        self.budget
            .window
            .saturating_sub(self.current().started_at.elapsed())
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            name: self.name.clone(),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            exhausted_checks: self.exhausted_checks.load(Ordering::Relaxed),
            remaining: self.remaining(),
        }
    }
}

/// Statistics about rate limiter usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterStats {
    pub name: String,
    pub total_requests: u64,
    pub exhausted_checks: u64,
    pub remaining: u32,
}
