//! Host time adapter.
//!
//! Provides the monotonic millisecond clock behind [`TimePort`], measured
//! from the moment the adapter was created.

use std::time::Instant;

use crate::app::ports::TimePort;
use crate::fsm::context::Millis;

/// Monotonic clock backed by [`std::time::Instant`].
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since the clock was created.
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}

impl TimePort for SystemClock {
    fn now_ms(&self) -> Millis {
        self.start.elapsed().as_millis() as Millis
    }
}
