//! The canonical playhead.
//!
//! Every surface that shows or sets the timeline position goes through one
//! [`PlayheadController`]. It clamps and de-duplicates seeks, rate-limits
//! scrub fan-out, and pauses the media player for the length of a scrub.

use std::sync::Arc;

use reelsync_common::clock::{secs_to_ms, Clock, Millis};
use reelsync_common::config::PlayheadConfig;
use reelsync_common::observer::{ObserverId, ObserverRegistry};

use crate::observer::PlayheadObserver;
use crate::playback::MediaPlayback;
use crate::state::{InteractionMode, PlayheadState};
use crate::throttle::UpdateThrottle;

/// A position update waiting in the throttle.
#[derive(Debug, Clone, Copy)]
struct PendingUpdate {
    time: f64,
    /// Came from a scrub rather than from the player reporting progress.
    scrub: bool,
}

pub struct PlayheadController {
    state: PlayheadState,
    duration: f64,
    config: PlayheadConfig,
    clock: Arc<dyn Clock>,
    throttle: UpdateThrottle<PendingUpdate>,
    observers: ObserverRegistry<PlayheadObserver>,
    playback: Option<Box<dyn MediaPlayback>>,
}

impl PlayheadController {
    pub fn new(config: PlayheadConfig, clock: Arc<dyn Clock>) -> Self {
        let throttle = UpdateThrottle::new(config.update_interval_ms);
        Self {
            state: PlayheadState::default(),
            duration: 0.0,
            config,
            clock,
            throttle,
            observers: ObserverRegistry::new(),
            playback: None,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.set_duration(duration);
        self
    }

    pub fn state(&self) -> &PlayheadState {
        &self.state
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_scrubbing(&self) -> bool {
        self.state.is_scrubbing
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.state.interaction_mode
    }

    pub fn config(&self) -> &PlayheadConfig {
        &self.config
    }

    /// Current time on the injected clock.
    pub fn now_ms(&self) -> Millis {
        self.clock.now_ms()
    }

    pub fn register_observer(
        &mut self,
        name: impl Into<String>,
        observer: PlayheadObserver,
    ) -> ObserverId {
        self.observers.register(name, observer)
    }

    pub fn unregister_observer(&mut self, id: ObserverId) -> bool {
        self.observers.unregister(id)
    }

    pub fn attach_playback(&mut self, playback: impl MediaPlayback + 'static) {
        self.playback = Some(Box::new(playback));
    }

    pub fn detach_playback(&mut self) -> Option<Box<dyn MediaPlayback>> {
        self.playback.take()
    }

    /// Update the seekable range. A position past the new end is pulled back.
    pub fn set_duration(&mut self, duration: f64) {
        if !duration.is_finite() {
            tracing::warn!(duration, "Ignoring non-finite timeline duration");
            return;
        }
        self.duration = duration.max(0.0);
        tracing::debug!(duration = self.duration, "Playhead duration set");
        if self.state.current_time > self.duration {
            let end = self.duration;
            let seek_player = !self.state.is_scrubbing || self.config.seek_player_while_scrubbing;
            self.apply_position(end, true, seek_player);
        }
    }

    /// Clamp `t` to `[0, duration]`. NaN has no meaningful clamp and yields `None`.
    pub fn clamp_time(&self, t: f64) -> Option<f64> {
        if t.is_nan() {
            None
        } else {
            Some(t.clamp(0.0, self.duration))
        }
    }

    /// Move the playhead. Returns false if the clamped position is within
    /// the seek epsilon of the current one.
    pub fn seek_to(&mut self, t: f64, emit: bool) -> bool {
        // A held update predates this seek.
        self.throttle.flush();
        let seek_player = !self.state.is_scrubbing || self.config.seek_player_while_scrubbing;
        self.apply_position(t, emit, seek_player)
    }

    /// Primary-button press at `t`. On the playhead this arms a pending
    /// seek; anywhere else it seeks immediately.
    pub fn handle_click(&mut self, t: f64, is_on_playhead: bool) -> bool {
        if is_on_playhead {
            self.state.interaction_mode = InteractionMode::PendingSeek;
            self.state.pending_seek_time = self.clamp_time(t);
            tracing::debug!(time = t, "Playhead pressed, pending seek");
        } else {
            tracing::debug!(time = t, "Ruler click seek");
            self.seek_to(t, true);
        }
        true
    }

    /// Promote a pending seek to a scrub. Pauses playback if it was running.
    pub fn handle_drag_start(&mut self) -> bool {
        if self.state.interaction_mode != InteractionMode::PendingSeek {
            return false;
        }

        // Player progress queued before the scrub is obsolete.
        self.throttle.flush();

        self.state.interaction_mode = InteractionMode::Dragging;
        self.state.is_scrubbing = true;
        self.state.pending_seek_time = None;

        let was_playing = self.playback.as_ref().is_some_and(|p| p.is_playing());
        self.state.was_playing_before_scrub = was_playing;
        if was_playing {
            if let Some(playback) = self.playback.as_mut() {
                playback.pause();
            }
        }

        tracing::debug!(was_playing, time = self.state.current_time, "Scrub started");
        self.observers
            .notify("scrub_started", |o| o.scrub_started.as_mut().map(|f| f()));
        true
    }

    /// Scrub to `t`. Applied now if the throttle allows it, otherwise held
    /// until [`tick`](Self::tick) or the end of the drag.
    pub fn handle_drag(&mut self, t: f64) -> bool {
        if self.state.interaction_mode != InteractionMode::Dragging {
            return false;
        }
        let Some(time) = self.clamp_time(t) else {
            return false;
        };
        let now = self.clock.now_ms();
        match self.throttle.offer(PendingUpdate { time, scrub: true }, now) {
            Some(update) => self.apply_update(update),
            None => false,
        }
    }

    /// Button release. Ends a scrub with an authoritative seek to
    /// `release_t`, or resolves a pending seek to `release_t`.
    pub fn handle_drag_end(&mut self, release_t: f64) -> bool {
        let ended = match self.state.interaction_mode {
            InteractionMode::Dragging => {
                if let Some(update) = self.throttle.flush() {
                    self.apply_update(update);
                }
                self.state.is_scrubbing = false;

                self.apply_position(release_t, true, false);
                let final_ms = secs_to_ms(self.state.current_time);
                if let Some(playback) = self.playback.as_mut() {
                    playback.set_position(final_ms);
                    if self.state.was_playing_before_scrub {
                        playback.play();
                    }
                }

                tracing::debug!(
                    time = self.state.current_time,
                    resumed = self.state.was_playing_before_scrub,
                    "Scrub ended"
                );
                self.observers
                    .notify("scrub_ended", |o| o.scrub_ended.as_mut().map(|f| f()));
                true
            }
            InteractionMode::PendingSeek => {
                self.seek_to(release_t, true);
                true
            }
            InteractionMode::None => false,
        };

        self.state.interaction_mode = InteractionMode::None;
        self.state.was_playing_before_scrub = false;
        self.state.pending_seek_time = None;
        ended
    }

    /// Progress reported by the player while playing. Ignored during a scrub
    /// and never echoed back to the player.
    pub fn update_from_player(&mut self, t: f64) -> bool {
        if self.state.is_scrubbing {
            return false;
        }
        let Some(time) = self.clamp_time(t) else {
            return false;
        };
        let now = self.clock.now_ms();
        match self.throttle.offer(PendingUpdate { time, scrub: false }, now) {
            Some(update) => self.apply_update(update),
            None => false,
        }
    }

    /// Release a held update once the throttle interval has passed.
    /// Call once per UI tick.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now_ms();
        match self.throttle.poll(now) {
            Some(update) => self.apply_update(update),
            None => false,
        }
    }

    /// Whether timeline time `t` falls inside the playhead hit zone at the
    /// given ruler scale.
    pub fn is_near_playhead(&self, t: f64, pixels_per_second: f64) -> bool {
        (t - self.state.current_time).abs() * pixels_per_second <= self.config.click_tolerance_px
    }

    pub fn is_playing(&self) -> bool {
        self.playback.as_ref().is_some_and(|p| p.is_playing())
    }

    pub fn play(&mut self) {
        if let Some(playback) = self.playback.as_mut() {
            playback.play();
        }
    }

    pub fn pause(&mut self) {
        if let Some(playback) = self.playback.as_mut() {
            playback.pause();
        }
    }

    /// Returns whether playback is running afterwards.
    pub fn toggle_playback(&mut self) -> bool {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
        self.is_playing()
    }

    /// Return to time zero with no gesture in progress (project load or clear).
    pub fn reset(&mut self) {
        let was_scrubbing = self.state.is_scrubbing;
        self.throttle.reset();
        self.state.is_scrubbing = false;
        self.state.interaction_mode = InteractionMode::None;
        self.state.was_playing_before_scrub = false;
        self.state.pending_seek_time = None;

        self.apply_position(0.0, true, true);
        if was_scrubbing {
            self.observers
                .notify("scrub_ended", |o| o.scrub_ended.as_mut().map(|f| f()));
        }
        tracing::debug!("Playhead reset");
    }

    fn apply_update(&mut self, update: PendingUpdate) -> bool {
        let seek_player = update.scrub && self.config.seek_player_while_scrubbing;
        self.apply_position(update.time, true, seek_player)
    }

    fn apply_position(&mut self, t: f64, emit: bool, seek_player: bool) -> bool {
        let Some(time) = self.clamp_time(t) else {
            tracing::debug!("Ignoring NaN seek");
            return false;
        };
        if (time - self.state.current_time).abs() < self.config.seek_epsilon_secs {
            return false;
        }

        self.state.current_time = time;
        tracing::trace!(time, scrubbing = self.state.is_scrubbing, "Playhead moved");

        if emit {
            self.observers.notify("position_changed", |o| {
                o.position_changed.as_mut().map(|f| f(time))
            });
        }
        if seek_player {
            if let Some(playback) = self.playback.as_mut() {
                playback.set_position(secs_to_ms(time));
            }
        }
        true
    }
}

impl std::fmt::Debug for PlayheadController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayheadController")
            .field("state", &self.state)
            .field("duration", &self.duration)
            .field("observers", &self.observers)
            .field("playback", &self.playback.is_some())
            .finish()
    }
}
