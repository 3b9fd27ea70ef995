//! Pointer gesture classification on the timeline ruler.
//!
//! A press on the playhead arms a scrub, a press on a clip body picks the
//! clip up, shift+press starts a range selection, and a press anywhere else
//! seeks at once. The playhead wins when it overlaps a clip.
//!
//! ```text
//! Idle -> Pending -> Seek                      (off playhead, off clip)
//!                 -> Armed -> Dragging         (>5 px or >100 ms)
//!                 -> ClipPressed -> ClipDragging
//!                 -> RangeSelecting            (shift)
//! any -> Idle on release
//! ```

use reelsync_common::clock::Millis;
use reelsync_common::config::InteractionConfig;
use reelsync_timeline_model::ClipId;

use crate::controller::PlayheadController;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

/// Pointer position in ruler pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub shift: bool,
}

impl PointerEvent {
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y, shift: false }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// The clip body under a press, as hit-tested by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipHit {
    pub id: ClipId,
    pub start_time: f64,
    pub track_index: u32,
}

/// Result of a completed gesture that the owner of the timeline applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    ClipSelected { id: ClipId },
    ClipMoved { id: ClipId, new_start: f64, new_track: u32 },
    RangeSelected { start: f64, end: f64 },
}

/// Observable gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Pending,
    Seek,
    Armed,
    Dragging,
    ClipPressed,
    ClipDragging,
    RangeSelecting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureState {
    Idle,
    Pending,
    Seek,
    Armed {
        press_x: f64,
        press_ms: Millis,
        click_time: f64,
    },
    Dragging,
    ClipPressed {
        hit: ClipHit,
        press_x: f64,
        press_y: f64,
        grab_offset: f64,
    },
    ClipDragging {
        hit: ClipHit,
        press_y: f64,
        grab_offset: f64,
        new_start: f64,
        new_track: u32,
    },
    RangeSelecting {
        anchor: f64,
        current: f64,
    },
}

impl GestureState {
    fn phase(&self) -> GesturePhase {
        match self {
            Self::Idle => GesturePhase::Idle,
            Self::Pending => GesturePhase::Pending,
            Self::Seek => GesturePhase::Seek,
            Self::Armed { .. } => GesturePhase::Armed,
            Self::Dragging => GesturePhase::Dragging,
            Self::ClipPressed { .. } => GesturePhase::ClipPressed,
            Self::ClipDragging { .. } => GesturePhase::ClipDragging,
            Self::RangeSelecting { .. } => GesturePhase::RangeSelecting,
        }
    }
}

#[derive(Debug)]
pub struct InteractionMachine {
    config: InteractionConfig,
    zoom: f64,
    state: GestureState,
}

impl InteractionMachine {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            zoom: 1.0,
            state: GestureState::Idle,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.state.phase()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the horizontal zoom, clamped to `[0.1, 10]`.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
        self.zoom
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Ruler pixels per timeline second at the current zoom.
    pub fn effective_pixels_per_second(&self) -> f64 {
        self.config.pixels_per_second * self.zoom
    }

    /// Map a ruler x coordinate to a time in `[0, duration]`.
    pub fn x_to_time(&self, x: f64, duration: f64) -> f64 {
        let t = x / self.effective_pixels_per_second();
        if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, duration.max(0.0))
        }
    }

    pub fn time_to_x(&self, t: f64) -> f64 {
        t * self.effective_pixels_per_second()
    }

    /// Lane index for a y coordinate.
    pub fn track_at_y(&self, y: f64) -> Option<u32> {
        if y < 0.0 || self.config.track_height_px <= 0.0 {
            return None;
        }
        Some((y / self.config.track_height_px).floor() as u32)
    }

    /// Primary button down. `clip` is the clip body under the pointer, if any.
    /// Returns whether the press was consumed.
    pub fn pointer_down(
        &mut self,
        ctl: &mut PlayheadController,
        event: PointerEvent,
        clip: Option<ClipHit>,
    ) -> bool {
        if self.state != GestureState::Idle {
            tracing::debug!(phase = ?self.phase(), "Ignoring press during active gesture");
            return false;
        }

        let t = self.x_to_time(event.x, ctl.duration());
        self.state = GestureState::Pending;

        let next = if event.shift {
            GestureState::RangeSelecting {
                anchor: t,
                current: t,
            }
        } else if ctl.is_near_playhead(t, self.effective_pixels_per_second()) {
            ctl.handle_click(t, true);
            GestureState::Armed {
                press_x: event.x,
                press_ms: ctl.now_ms(),
                click_time: t,
            }
        } else if let Some(hit) = clip {
            GestureState::ClipPressed {
                hit,
                press_x: event.x,
                press_y: event.y,
                grab_offset: t - hit.start_time,
            }
        } else {
            ctl.handle_click(t, false);
            GestureState::Seek
        };

        self.transition(next);
        true
    }

    pub fn pointer_move(&mut self, ctl: &mut PlayheadController, event: PointerEvent) {
        let t = self.x_to_time(event.x, ctl.duration());

        match self.state {
            GestureState::Armed {
                press_x, press_ms, ..
            } => {
                let moved = (event.x - press_x).abs() > self.config.drag_threshold_px;
                let held = self.held_past_threshold(ctl, press_ms);
                if moved || held {
                    self.begin_scrub(ctl);
                    ctl.handle_drag(t);
                }
            }
            GestureState::Dragging => {
                ctl.handle_drag(t);
            }
            GestureState::ClipPressed {
                hit,
                press_x,
                press_y,
                grab_offset,
            } => {
                let dx = (event.x - press_x).abs();
                let dy = (event.y - press_y).abs();
                if dx > self.config.drag_threshold_px || dy > self.config.drag_threshold_px {
                    let (new_start, new_track) =
                        self.clip_target(hit, press_y, grab_offset, t, event.y);
                    self.transition(GestureState::ClipDragging {
                        hit,
                        press_y,
                        grab_offset,
                        new_start,
                        new_track,
                    });
                }
            }
            GestureState::ClipDragging {
                hit,
                press_y,
                grab_offset,
                ..
            } => {
                let (new_start, new_track) =
                    self.clip_target(hit, press_y, grab_offset, t, event.y);
                self.state = GestureState::ClipDragging {
                    hit,
                    press_y,
                    grab_offset,
                    new_start,
                    new_track,
                };
            }
            GestureState::RangeSelecting { anchor, .. } => {
                self.state = GestureState::RangeSelecting { anchor, current: t };
            }
            // The button is held after an immediate seek; movement does nothing.
            GestureState::Seek | GestureState::Idle | GestureState::Pending => {}
        }
    }

    /// Primary button up. Clip and range gestures report an outcome for the
    /// owner of the timeline to apply.
    pub fn pointer_up(
        &mut self,
        ctl: &mut PlayheadController,
        event: PointerEvent,
    ) -> Option<GestureOutcome> {
        let t = self.x_to_time(event.x, ctl.duration());
        let state = std::mem::replace(&mut self.state, GestureState::Idle);

        let outcome = match state {
            GestureState::Armed { click_time, .. } => {
                ctl.handle_drag_end(click_time);
                None
            }
            GestureState::Dragging => {
                ctl.handle_drag_end(t);
                None
            }
            GestureState::ClipPressed { hit, .. } => {
                Some(GestureOutcome::ClipSelected { id: hit.id })
            }
            GestureState::ClipDragging {
                hit,
                new_start,
                new_track,
                ..
            } => Some(GestureOutcome::ClipMoved {
                id: hit.id,
                new_start,
                new_track,
            }),
            GestureState::RangeSelecting { anchor, .. } => {
                let (start, end) = if t < anchor { (t, anchor) } else { (anchor, t) };
                (end > start).then_some(GestureOutcome::RangeSelected { start, end })
            }
            GestureState::Seek | GestureState::Idle | GestureState::Pending => None,
        };

        tracing::debug!(from = ?state.phase(), ?outcome, "Gesture released");
        outcome
    }

    /// Time-threshold check for a press held still on the playhead. Call
    /// once per UI tick.
    pub fn tick(&mut self, ctl: &mut PlayheadController) {
        if let GestureState::Armed { press_ms, .. } = self.state {
            if self.held_past_threshold(ctl, press_ms) {
                self.begin_scrub(ctl);
            }
        }
    }

    /// Abandon the gesture (focus loss, escape). A scrub in progress ends
    /// where the playhead currently is.
    pub fn cancel(&mut self, ctl: &mut PlayheadController) {
        let state = std::mem::replace(&mut self.state, GestureState::Idle);
        if matches!(state, GestureState::Armed { .. } | GestureState::Dragging) {
            let here = ctl.current_time();
            ctl.handle_drag_end(here);
        }
    }

    fn held_past_threshold(&self, ctl: &PlayheadController, press_ms: Millis) -> bool {
        ctl.now_ms().saturating_sub(press_ms) > self.config.drag_threshold_ms
    }

    fn begin_scrub(&mut self, ctl: &mut PlayheadController) {
        ctl.handle_drag_start();
        self.transition(GestureState::Dragging);
    }

    fn clip_target(
        &self,
        hit: ClipHit,
        press_y: f64,
        grab_offset: f64,
        t: f64,
        y: f64,
    ) -> (f64, u32) {
        let new_start = (t - grab_offset).max(0.0);
        let lanes = if self.config.track_height_px > 0.0 {
            ((y - press_y) / self.config.track_height_px).round() as i64
        } else {
            0
        };
        let new_track = (i64::from(hit.track_index) + lanes).clamp(0, i64::from(u32::MAX)) as u32;
        (new_start, new_track)
    }

    fn transition(&mut self, next: GestureState) {
        tracing::debug!(from = ?self.phase(), to = ?next.phase(), "Gesture transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use reelsync_common::clock::ManualClock;
    use reelsync_common::config::PlayheadConfig;

    use super::*;
    use crate::observer::PlayheadObserver;
    use crate::state::InteractionMode;

    fn setup() -> (InteractionMachine, PlayheadController, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(10_000));
        let ctl = PlayheadController::new(PlayheadConfig::default(), clock.clone())
            .with_duration(300.0);
        (InteractionMachine::new(InteractionConfig::default()), ctl, clock)
    }

    #[test]
    fn test_x_to_time_uses_zoom_and_clamps() {
        let (mut machine, _, _) = setup();
        assert!((machine.x_to_time(100.0, 300.0) - 2.0).abs() < 1e-12);
        machine.set_zoom(2.0);
        assert!((machine.x_to_time(100.0, 300.0) - 1.0).abs() < 1e-12);
        assert_eq!(machine.x_to_time(-50.0, 300.0), 0.0);
        assert_eq!(machine.x_to_time(1e9, 300.0), 300.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let (mut machine, _, _) = setup();
        assert_eq!(machine.set_zoom(50.0), MAX_ZOOM);
        assert_eq!(machine.set_zoom(0.0), MIN_ZOOM);
        assert_eq!(machine.set_zoom(f64::NAN), MIN_ZOOM);
    }

    #[test]
    fn test_click_off_playhead_seeks() {
        let (mut machine, mut ctl, _) = setup();
        assert!(machine.pointer_down(&mut ctl, PointerEvent::at(500.0, 10.0), None));
        assert_eq!(machine.phase(), GesturePhase::Seek);
        assert_eq!(ctl.current_time(), 10.0);

        // Moves while the button is still down are ignored.
        machine.pointer_move(&mut ctl, PointerEvent::at(800.0, 10.0));
        assert_eq!(ctl.current_time(), 10.0);

        assert_eq!(machine.pointer_up(&mut ctl, PointerEvent::at(800.0, 10.0)), None);
        assert_eq!(machine.phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_small_quick_motion_stays_armed_then_seeks() {
        let (mut machine, mut ctl, clock) = setup();
        ctl.seek_to(1.9, false);

        // t = 2.0 at 50 px/s
        machine.pointer_down(&mut ctl, PointerEvent::at(100.0, 10.0), None);
        assert_eq!(machine.phase(), GesturePhase::Armed);

        clock.advance(80);
        // t = 2.05
        machine.pointer_move(&mut ctl, PointerEvent::at(102.5, 10.0));
        machine.tick(&mut ctl);
        assert_eq!(machine.phase(), GesturePhase::Armed);
        assert!(!ctl.is_scrubbing());

        machine.pointer_up(&mut ctl, PointerEvent::at(102.5, 10.0));
        assert_eq!(machine.phase(), GesturePhase::Idle);
        assert!((ctl.current_time() - 2.0).abs() < 1e-9);
        assert_eq!(ctl.interaction_mode(), InteractionMode::None);
    }

    #[test]
    fn test_movement_threshold_starts_drag() {
        let (mut machine, mut ctl, clock) = setup();
        ctl.seek_to(2.0, false);
        machine.pointer_down(&mut ctl, PointerEvent::at(100.0, 10.0), None);

        clock.advance(50);
        machine.pointer_move(&mut ctl, PointerEvent::at(110.0, 10.0));
        assert_eq!(machine.phase(), GesturePhase::Dragging);
        assert!(ctl.is_scrubbing());
        assert!((ctl.current_time() - 2.2).abs() < 1e-9);

        clock.advance(30);
        machine.pointer_move(&mut ctl, PointerEvent::at(150.0, 10.0));
        machine.pointer_up(&mut ctl, PointerEvent::at(200.0, 10.0));
        assert!(!ctl.is_scrubbing());
        assert!((ctl.current_time() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_hold_threshold_starts_drag_on_tick() {
        let (mut machine, mut ctl, clock) = setup();
        let started = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&started);
        ctl.register_observer(
            "scrub-count",
            PlayheadObserver::new().on_scrub_started(move || {
                *counter.borrow_mut() += 1;
                Ok(())
            }),
        );

        machine.pointer_down(&mut ctl, PointerEvent::at(0.0, 10.0), None);
        clock.advance(100);
        machine.tick(&mut ctl);
        assert_eq!(machine.phase(), GesturePhase::Armed);

        clock.advance(1);
        machine.tick(&mut ctl);
        assert_eq!(machine.phase(), GesturePhase::Dragging);
        assert_eq!(*started.borrow(), 1);
    }

    #[test]
    fn test_playhead_wins_over_clip() {
        let (mut machine, mut ctl, _) = setup();
        ctl.seek_to(4.0, false);
        let hit = ClipHit {
            id: ClipId(3),
            start_time: 0.0,
            track_index: 0,
        };
        machine.pointer_down(&mut ctl, PointerEvent::at(205.0, 10.0), Some(hit));
        assert_eq!(machine.phase(), GesturePhase::Armed);
    }

    #[test]
    fn test_clip_drag_reports_move() {
        let (mut machine, mut ctl, _) = setup();
        let hit = ClipHit {
            id: ClipId(7),
            start_time: 2.0,
            track_index: 0,
        };
        // Grab the clip 1 s into its body (t = 3.0), well away from the playhead at 0.
        machine.pointer_down(&mut ctl, PointerEvent::at(150.0, 30.0), Some(hit));
        assert_eq!(machine.phase(), GesturePhase::ClipPressed);
        assert_eq!(ctl.current_time(), 0.0);

        machine.pointer_move(&mut ctl, PointerEvent::at(400.0, 95.0));
        assert_eq!(machine.phase(), GesturePhase::ClipDragging);

        let outcome = machine.pointer_up(&mut ctl, PointerEvent::at(400.0, 95.0));
        assert_eq!(
            outcome,
            Some(GestureOutcome::ClipMoved {
                id: ClipId(7),
                new_start: 7.0,
                new_track: 1,
            })
        );
        assert_eq!(ctl.current_time(), 0.0);
    }

    #[test]
    fn test_clip_press_without_motion_selects() {
        let (mut machine, mut ctl, _) = setup();
        let hit = ClipHit {
            id: ClipId(2),
            start_time: 5.0,
            track_index: 1,
        };
        machine.pointer_down(&mut ctl, PointerEvent::at(300.0, 70.0), Some(hit));
        machine.pointer_move(&mut ctl, PointerEvent::at(302.0, 71.0));
        assert_eq!(
            machine.pointer_up(&mut ctl, PointerEvent::at(302.0, 71.0)),
            Some(GestureOutcome::ClipSelected { id: ClipId(2) })
        );
    }

    #[test]
    fn test_shift_drag_selects_range() {
        let (mut machine, mut ctl, _) = setup();
        machine.pointer_down(&mut ctl, PointerEvent::at(500.0, 10.0).with_shift(), None);
        assert_eq!(machine.phase(), GesturePhase::RangeSelecting);
        machine.pointer_move(&mut ctl, PointerEvent::at(250.0, 10.0));

        assert_eq!(
            machine.pointer_up(&mut ctl, PointerEvent::at(250.0, 10.0)),
            Some(GestureOutcome::RangeSelected {
                start: 5.0,
                end: 10.0,
            })
        );
        assert_eq!(ctl.current_time(), 0.0);
    }

    #[test]
    fn test_cancel_ends_scrub() {
        let (mut machine, mut ctl, _) = setup();
        machine.pointer_down(&mut ctl, PointerEvent::at(0.0, 10.0), None);
        machine.pointer_move(&mut ctl, PointerEvent::at(60.0, 10.0));
        assert!(ctl.is_scrubbing());

        machine.cancel(&mut ctl);
        assert_eq!(machine.phase(), GesturePhase::Idle);
        assert!(!ctl.is_scrubbing());
    }

    #[test]
    fn test_track_at_y() {
        let (machine, _, _) = setup();
        assert_eq!(machine.track_at_y(0.0), Some(0));
        assert_eq!(machine.track_at_y(59.9), Some(0));
        assert_eq!(machine.track_at_y(60.0), Some(1));
        assert_eq!(machine.track_at_y(-1.0), None);
    }
}
