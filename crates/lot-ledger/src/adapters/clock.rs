//! Time sources.

use crate::domain::Timestamp;
use crate::ports::TimeSource;
use std::sync::atomic::{AtomicU64, Ordering};

/// Wall-clock time source, in Unix seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Manually driven time source for simulations and replays.
#[derive(Debug, Default)]
pub struct FixedTimeSource {
    time: AtomicU64,
}

impl FixedTimeSource {
    /// Start at `time`.
    pub fn new(time: Timestamp) -> Self {
        Self {
            time: AtomicU64::new(time),
        }
    }

    /// Jump to `time`. Moving backwards makes the next command fail with
    /// `TimestampRegression`.
    pub fn set(&self, time: Timestamp) {
        self.time.store(time, Ordering::SeqCst);
    }

    /// Move forward by `delta` seconds.
    pub fn advance(&self, delta: Timestamp) {
        self.time.fetch_add(delta, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(Ordering::SeqCst)
    }
}
