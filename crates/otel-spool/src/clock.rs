//! Clock abstraction for file-expiry and read-eligibility checks.
//!
//! Production code injects [`SystemClock`]; tests inject a manually advanced
//! clock for deterministic expiry behaviour without touching process-wide
//! state.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over the wall-clock time source.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current wall-clock time in milliseconds since UNIX epoch.
    fn now_ms(&self) -> u64;
}

/// Production clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
