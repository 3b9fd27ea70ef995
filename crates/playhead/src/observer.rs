//! Playhead observer capability record.
//!
//! An observer implements any subset of the three callbacks. The timeline
//! ruler, the preview playhead and the renderer all register the same way.

use std::fmt;

use reelsync_common::observer::ObserverResult;

pub type PositionCallback = Box<dyn FnMut(f64) -> ObserverResult>;
pub type ScrubCallback = Box<dyn FnMut() -> ObserverResult>;

#[derive(Default)]
pub struct PlayheadObserver {
    pub(crate) position_changed: Option<PositionCallback>,
    pub(crate) scrub_started: Option<ScrubCallback>,
    pub(crate) scrub_ended: Option<ScrubCallback>,
}

impl PlayheadObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_position_changed(mut self, f: impl FnMut(f64) -> ObserverResult + 'static) -> Self {
        self.position_changed = Some(Box::new(f));
        self
    }

    pub fn on_scrub_started(mut self, f: impl FnMut() -> ObserverResult + 'static) -> Self {
        self.scrub_started = Some(Box::new(f));
        self
    }

    pub fn on_scrub_ended(mut self, f: impl FnMut() -> ObserverResult + 'static) -> Self {
        self.scrub_ended = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for PlayheadObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayheadObserver")
            .field("position_changed", &self.position_changed.is_some())
            .field("scrub_started", &self.scrub_started.is_some())
            .field("scrub_ended", &self.scrub_ended.is_some())
            .finish()
    }
}
