//! Injectable Time Source
//!
//! All expiry logic runs off a [`Clock`] handle so tests can simulate
//! the passage of time instead of sleeping.

use std::sync::atomic::{AtomicI64, Ordering};

/// One minute in milliseconds
pub const MINUTES: i64 = 60 * 1000;
/// One hour in milliseconds
pub const HOURS: i64 = 60 * MINUTES;
/// One day in milliseconds
pub const DAYS: i64 = 24 * HOURS;

/// Time source returning UNIX milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually advanced clock for deterministic tests
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self(AtomicI64::new(now_ms))
    }

    pub fn set(&self, now_ms: i64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.0.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}
