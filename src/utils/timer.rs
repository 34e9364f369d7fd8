//! Timer utilities
//!
//! Wall-clock measurement around runs and individual tests.

use std::time::{Duration, Instant};

/// Simple timer for measuring elapsed time
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    /// Create and start a new timer
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get elapsed time in milliseconds, rounded to the nearest millisecond
    pub fn elapsed_ms(&self) -> u64 {
        let elapsed = self.elapsed();
        (elapsed.as_micros() as u64 + 500) / 1000
    }

    /// Stop timer and return elapsed time in milliseconds
    pub fn stop(self) -> u64 {
        let ms = self.elapsed_ms();
        tracing::debug!("{}: {}ms", self.label, ms);
        ms
    }
}
