//! Rate limiting for position fan-out.
//!
//! Updates closer together than the interval are not dropped: the latest
//! one is held and released by [`UpdateThrottle::poll`] once the interval
//! has elapsed, so the final position of a fast scrub always arrives.

use reelsync_common::clock::Millis;

#[derive(Debug, Clone)]
pub struct UpdateThrottle<T> {
    interval_ms: Millis,
    last_emit_ms: Option<Millis>,
    pending: Option<T>,
}

impl<T> UpdateThrottle<T> {
    pub fn new(interval_ms: Millis) -> Self {
        Self {
            interval_ms,
            last_emit_ms: None,
            pending: None,
        }
    }

    /// Offer a value at `now_ms`. Returns it if it may be emitted right away;
    /// otherwise it replaces any held value.
    pub fn offer(&mut self, value: T, now_ms: Millis) -> Option<T> {
        if self.ready(now_ms) {
            self.last_emit_ms = Some(now_ms);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Release the held value if the interval has elapsed.
    pub fn poll(&mut self, now_ms: Millis) -> Option<T> {
        if self.pending.is_some() && self.ready(now_ms) {
            self.last_emit_ms = Some(now_ms);
            self.pending.take()
        } else {
            None
        }
    }

    /// Release the held value regardless of timing.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn interval_ms(&self) -> Millis {
        self.interval_ms
    }

    pub fn reset(&mut self) {
        self.last_emit_ms = None;
        self.pending = None;
    }

    fn ready(&self, now_ms: Millis) -> bool {
        match self.last_emit_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }
}
