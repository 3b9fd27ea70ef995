//! Clock and timing utilities for gesture classification and throttling.
//!
//! The coordination thread never reads `Instant::now()` directly. Every
//! component that needs "now" goes through a [`Clock`], so the gesture
//! thresholds and the 60 Hz update throttle can be driven deterministically
//! by a [`ManualClock`] in tests and headless tools.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Milliseconds on a monotonic session timeline.
pub type Millis = u64;

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since the clock's epoch.
    fn now_ms(&self) -> Millis;
}

/// Wall-backed monotonic clock anchored at session start.
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant the session started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new session clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Seconds elapsed since session start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

impl Clock for SessionClock {
    fn now_ms(&self) -> Millis {
        self.epoch.elapsed().as_millis() as Millis
    }
}

/// Manually advanced clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: Millis) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    /// Move time forward by `ms`.
    pub fn advance(&self, ms: Millis) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute time. Going backwards is ignored.
    pub fn set(&self, ms: Millis) {
        self.now.fetch_max(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

/// Convert seconds to whole milliseconds (negative input saturates to zero).
pub fn secs_to_ms(secs: f64) -> Millis {
    (secs.max(0.0) * 1000.0).round() as Millis
}

/// Convert milliseconds to seconds.
pub fn ms_to_secs(ms: Millis) -> f64 {
    ms as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_clock_starts_near_zero() {
        let clock = SessionClock::start();
        assert!(clock.now_ms() < 1000);
        assert!(!clock.epoch_wall().is_empty());
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(10);
        clock.advance(16);
        assert_eq!(clock.now_ms(), 26);
        clock.set(20);
        assert_eq!(clock.now_ms(), 26);
        clock.set(100);
        assert_eq!(clock.now_ms(), 100);
    }

    #[test]
    fn test_secs_ms_conversion() {
        assert_eq!(secs_to_ms(1.5), 1500);
        assert_eq!(secs_to_ms(-2.0), 0);
        assert!((ms_to_secs(2500) - 2.5).abs() < 1e-12);
    }
}
