//! End-to-end behaviour of the editor session: pointer gestures driving the
//! playhead, the playhead driving the renderer, and edits invalidating
//! cached frames.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use image::{Rgba, RgbaImage};

use reelsync_common::clock::ManualClock;
use reelsync_common::config::AppConfig;
use reelsync_editor_session::EditorSession;
use reelsync_playhead::{GestureOutcome, GesturePhase, PointerEvent, SimulatedPlayback};
use reelsync_render_engine::{DecodeError, FrameDecoder, FrameKind};
use reelsync_timeline_model::{MediaSource, ProjectFile};

const WAIT: Duration = Duration::from_secs(5);

/// Lanes are 60 px tall; this row is below every clip used here.
const EMPTY_ROW_Y: f64 = 200.0;

struct SolidDecoder;

impl FrameDecoder for SolidDecoder {
    fn decode(&self, source: &MediaSource, _t: f64) -> Result<Arc<RgbaImage>, DecodeError> {
        Ok(Arc::new(RgbaImage::from_pixel(
            16,
            9,
            Rgba([source.width as u8, 0, 0, 255]),
        )))
    }
}

fn session() -> (EditorSession, Arc<ManualClock>) {
    let mut config = AppConfig::default();
    config.render.width = 32;
    config.render.height = 18;
    let clock = Arc::new(ManualClock::new(1_000));
    let session = EditorSession::new(config, clock.clone(), Arc::new(SolidDecoder)).unwrap();
    (session, clock)
}

fn video(path: &str, duration: f64) -> Arc<MediaSource> {
    Arc::new(MediaSource::video(path, duration, 30.0, 100, 9))
}

#[test]
fn ruler_click_seeks_and_renders() {
    let (mut s, _clock) = session();
    s.add_clip(video("/m/a.mp4", 10.0), 0, 0.0).unwrap();
    s.wait_for_frames(WAIT);

    // 50 px/s at zoom 1: x = 200 is t = 4.
    assert!(s.pointer_down(PointerEvent::at(200.0, EMPTY_ROW_Y)));
    assert_eq!(s.phase(), GesturePhase::Seek);
    assert_eq!(s.pointer_up(PointerEvent::at(200.0, EMPTY_ROW_Y)), None);
    assert!((s.current_time() - 4.0).abs() < 1e-9);

    s.wait_for_frames(WAIT);
    let frame = s.displayed_frame().unwrap();
    assert!((frame.time - 4.0).abs() < 1e-9);
    assert_eq!(frame.kind, FrameKind::Composited);
}

#[test]
fn playhead_drag_scrubs_then_lands_on_release() {
    let (mut s, clock) = session();
    s.add_clip(video("/m/a.mp4", 10.0), 0, 0.0).unwrap();
    let player = Rc::new(RefCell::new(SimulatedPlayback::playing()));
    s.attach_playback(Rc::clone(&player));

    s.pointer_down(PointerEvent::at(0.0, EMPTY_ROW_Y));
    assert_eq!(s.phase(), GesturePhase::Armed);

    s.pointer_move(PointerEvent::at(100.0, EMPTY_ROW_Y));
    assert_eq!(s.phase(), GesturePhase::Dragging);
    assert!(s.playhead().is_scrubbing());
    assert!(!player.borrow().playing);

    clock.advance(20);
    s.pointer_move(PointerEvent::at(150.0, EMPTY_ROW_Y));
    s.pointer_up(PointerEvent::at(150.0, EMPTY_ROW_Y));

    assert_eq!(s.phase(), GesturePhase::Idle);
    assert!(!s.playhead().is_scrubbing());
    assert!((s.current_time() - 3.0).abs() < 1e-9);
    let player = player.borrow();
    assert_eq!(player.seeks.last(), Some(&3000));
    assert!(player.playing);
}

#[test]
fn held_press_on_playhead_becomes_scrub_on_tick() {
    let (mut s, clock) = session();
    s.pointer_down(PointerEvent::at(0.0, EMPTY_ROW_Y));
    assert_eq!(s.phase(), GesturePhase::Armed);

    clock.advance(150);
    s.tick();
    assert_eq!(s.phase(), GesturePhase::Dragging);
    s.cancel_gesture();
    assert_eq!(s.phase(), GesturePhase::Idle);
    assert!(!s.playhead().is_scrubbing());
}

#[test]
fn dragging_clip_moves_it_across_lanes() {
    let (mut s, _clock) = session();
    let id = s.add_clip(video("/m/a.mp4", 10.0), 0, 2.0).unwrap();
    let version = s.timeline().content_version();

    // Grab at t = 5 (3 s into the clip), drop at t = 6 one lane down.
    s.pointer_down(PointerEvent::at(250.0, 30.0));
    assert_eq!(s.phase(), GesturePhase::ClipPressed);
    s.pointer_move(PointerEvent::at(300.0, 90.0));
    assert_eq!(s.phase(), GesturePhase::ClipDragging);
    let outcome = s.pointer_up(PointerEvent::at(300.0, 90.0));

    assert_eq!(
        outcome,
        Some(GestureOutcome::ClipMoved {
            id,
            new_start: 3.0,
            new_track: 1,
        })
    );
    let clip = s.timeline().clip(id).unwrap();
    assert!((clip.start_time - 3.0).abs() < 1e-9);
    assert_eq!(clip.track_index, 1);
    assert_eq!(s.selected_clip(), Some(id));
    assert!(s.timeline().content_version() > version);
    assert_eq!(s.renderer().content_version(), s.timeline().content_version());
}

#[test]
fn click_on_clip_selects_it() {
    let (mut s, _clock) = session();
    let id = s.add_clip(video("/m/a.mp4", 10.0), 1, 2.0).unwrap();

    s.pointer_down(PointerEvent::at(250.0, 90.0));
    let outcome = s.pointer_up(PointerEvent::at(250.0, 90.0));

    assert_eq!(outcome, Some(GestureOutcome::ClipSelected { id }));
    assert_eq!(s.selected_clip(), Some(id));
    assert_eq!(s.delete_selected(), 1);
    assert_eq!(s.selected_clip(), None);
    assert!(s.timeline().is_empty());
}

#[test]
fn shift_drag_selects_range() {
    let (mut s, _clock) = session();
    s.pointer_down(PointerEvent::at(250.0, EMPTY_ROW_Y).with_shift());
    s.pointer_move(PointerEvent::at(100.0, EMPTY_ROW_Y).with_shift());
    let outcome = s.pointer_up(PointerEvent::at(100.0, EMPTY_ROW_Y).with_shift());

    assert_eq!(outcome, Some(GestureOutcome::RangeSelected { start: 2.0, end: 5.0 }));
    assert_eq!(s.selected_range(), Some((2.0, 5.0)));
    assert_eq!(s.current_time(), 0.0);
}

#[test]
fn edit_invalidates_displayed_frame() {
    let (mut s, _clock) = session();
    let id = s.add_clip(video("/m/a.mp4", 10.0), 0, 0.0).unwrap();
    s.seek(1.0);
    s.wait_for_frames(WAIT);
    assert!(s.renderer().is_cached(1.0));
    let submitted = s.renderer().stats().submitted;

    let parts = s.split_at_playhead();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].0, id);
    assert!(!s.renderer().is_cached(1.0));

    s.wait_for_frames(WAIT);
    assert!(s.renderer().stats().submitted > submitted);
    assert!(s.renderer().is_cached(1.0));
    assert_eq!(s.timeline().len(), 2);
}

#[test]
fn tick_delivers_rendered_frame() {
    let (mut s, _clock) = session();
    s.add_clip(video("/m/a.mp4", 10.0), 0, 0.0).unwrap();
    s.seek(2.5);

    for _ in 0..500 {
        s.tick();
        if s
            .displayed_frame()
            .is_some_and(|f| (f.time - 2.5).abs() < 1e-9)
        {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!((s.displayed_frame().unwrap().time - 2.5).abs() < 1e-9);
}

#[test]
fn clear_rewinds_and_shows_black() {
    let (mut s, _clock) = session();
    s.add_clip(video("/m/a.mp4", 400.0), 0, 0.0).unwrap();
    s.seek(350.0);
    assert!((s.playhead().duration() - 480.0).abs() < 1e-9);

    s.clear();
    assert_eq!(s.current_time(), 0.0);
    assert!((s.playhead().duration() - 300.0).abs() < 1e-9);

    s.wait_for_frames(WAIT);
    assert_eq!(s.displayed_frame().unwrap().kind, FrameKind::Black);
}

#[test]
fn project_round_trip_through_session() {
    let path = std::env::temp_dir().join(format!(
        "reelsync-session-{}.json",
        std::process::id()
    ));

    let (mut s, _clock) = session();
    let a = video("/m/a.mp4", 10.0);
    s.add_clip(Arc::clone(&a), 0, 0.0).unwrap();
    s.add_clip(a, 1, 4.0).unwrap();
    s.add_clip(video("/m/b.mp4", 3.0), 2, 1.0).unwrap();

    let mut project = ProjectFile::new("demo");
    s.save_project(&mut project, &path).unwrap();
    assert_eq!(project.media_items.len(), 2);

    let (mut other, _clock) = session();
    other.seek(7.0);
    let loaded = other.open_project(&path).unwrap();
    assert_eq!(loaded.name, "demo");
    assert_eq!(other.timeline().len(), 3);
    assert_eq!(other.current_time(), 0.0);
    assert!((other.timeline().max_end_time() - 14.0).abs() < 1e-9);

    let _ = std::fs::remove_file(&path);
}
