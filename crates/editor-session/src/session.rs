//! Editor session.
//!
//! Everything here runs on the coordination thread. The preview renderer is
//! shared with the playhead through an `Rc<RefCell<_>>`: the playhead calls
//! into it on every position change, and [`EditorSession::tick`] drains its
//! completion queue.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use reelsync_common::clock::Clock;
use reelsync_common::config::AppConfig;
use reelsync_common::error::ReelsyncResult;
use reelsync_common::observer::ObserverId;
use reelsync_playhead::{
    ClipHit, GestureOutcome, GesturePhase, InteractionMachine, MediaPlayback, PlayheadController,
    PlayheadObserver, PointerEvent,
};
use reelsync_render_engine::{
    Frame, FrameDecoder, FrameObserver, PumpReport, RequestId, TimelineRenderer,
};
use reelsync_timeline_model::{
    ClipId, MediaSource, ProjectError, ProjectFile, Timeline, TimelineClip, TimelineError,
};

pub struct EditorSession {
    config: AppConfig,
    timeline: Timeline,
    playhead: PlayheadController,
    gestures: InteractionMachine,
    renderer: Rc<RefCell<TimelineRenderer>>,
    selected_clip: Option<ClipId>,
    selected_range: Option<(f64, f64)>,
}

impl EditorSession {
    /// Build an empty session. The renderer is registered as the first
    /// playhead observer.
    pub fn new(
        config: AppConfig,
        clock: Arc<dyn Clock>,
        decoder: Arc<dyn FrameDecoder>,
    ) -> ReelsyncResult<Self> {
        let timeline = Timeline::new(config.timeline.clone());

        let mut renderer = TimelineRenderer::new(config.render.clone(), decoder)?;
        renderer.set_snapshot(timeline.snapshot());
        let renderer = Rc::new(RefCell::new(renderer));

        let mut playhead = PlayheadController::new(config.playhead.clone(), clock)
            .with_duration(timeline.total_duration());
        let sink = Rc::clone(&renderer);
        playhead.register_observer(
            "renderer",
            PlayheadObserver::new().on_position_changed(move |t| {
                sink.try_borrow_mut()
                    .map_err(|_| anyhow::anyhow!("renderer is busy"))?
                    .request_frame(t);
                Ok(())
            }),
        );

        let gestures = InteractionMachine::new(config.interaction.clone());

        tracing::info!(
            width = config.render.width,
            height = config.render.height,
            workers = config.render.workers,
            "Editor session started"
        );

        Ok(Self {
            config,
            timeline,
            playhead,
            gestures,
            renderer,
            selected_clip: None,
            selected_range: None,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn playhead(&self) -> &PlayheadController {
        &self.playhead
    }

    pub fn playhead_mut(&mut self) -> &mut PlayheadController {
        &mut self.playhead
    }

    pub fn gestures(&self) -> &InteractionMachine {
        &self.gestures
    }

    pub fn renderer(&self) -> Ref<'_, TimelineRenderer> {
        self.renderer.borrow()
    }

    pub fn current_time(&self) -> f64 {
        self.playhead.current_time()
    }

    pub fn phase(&self) -> GesturePhase {
        self.gestures.phase()
    }

    pub fn selected_clip(&self) -> Option<ClipId> {
        self.selected_clip
    }

    pub fn selected_range(&self) -> Option<(f64, f64)> {
        self.selected_range
    }

    pub fn displayed_frame(&self) -> Option<Arc<Frame>> {
        self.renderer.borrow().displayed_frame().cloned()
    }

    pub fn register_playhead_observer(
        &mut self,
        name: impl Into<String>,
        observer: PlayheadObserver,
    ) -> ObserverId {
        self.playhead.register_observer(name, observer)
    }

    pub fn register_frame_observer(
        &mut self,
        name: impl Into<String>,
        observer: FrameObserver,
    ) -> ObserverId {
        self.renderer.borrow_mut().register_observer(name, observer)
    }

    pub fn attach_playback(&mut self, playback: impl MediaPlayback + 'static) {
        self.playhead.attach_playback(playback);
    }

    /// Programmatic seek (keyboard, transport buttons).
    pub fn seek(&mut self, t: f64) -> bool {
        self.playhead.seek_to(t, true)
    }

    /// Progress reported by the media player while it plays.
    pub fn update_from_player(&mut self, t: f64) -> bool {
        self.playhead.update_from_player(t)
    }

    pub fn toggle_playback(&mut self) -> bool {
        self.playhead.toggle_playback()
    }

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.gestures.set_zoom(zoom)
    }

    // --- Clip edits -------------------------------------------------------

    pub fn add_clip(
        &mut self,
        media: Arc<MediaSource>,
        track: u32,
        start: f64,
    ) -> Result<ClipId, TimelineError> {
        let id = self.timeline.add_clip(media, track, start)?;
        self.timeline_edited();
        Ok(id)
    }

    pub fn split_clip(&mut self, id: ClipId, at: f64) -> Result<(ClipId, ClipId), TimelineError> {
        let parts = self.timeline.split_clip(id, at)?;
        self.timeline_edited();
        Ok(parts)
    }

    /// Split every clip under the playhead.
    pub fn split_at_playhead(&mut self) -> Vec<(ClipId, ClipId)> {
        let parts = self.timeline.split_at(self.playhead.current_time());
        if !parts.is_empty() {
            self.timeline_edited();
        }
        parts
    }

    pub fn move_clip(
        &mut self,
        id: ClipId,
        new_start: f64,
        new_track: u32,
    ) -> Result<(), TimelineError> {
        let before = self.timeline.content_version();
        self.timeline.move_clip(id, new_start, new_track)?;
        if self.timeline.content_version() != before {
            self.timeline_edited();
        }
        Ok(())
    }

    pub fn resize_clip(&mut self, id: ClipId, new_duration: f64) -> Result<(), TimelineError> {
        self.timeline.resize_clip(id, new_duration)?;
        self.timeline_edited();
        Ok(())
    }

    pub fn delete_clips(&mut self, ids: &[ClipId]) -> usize {
        let removed = self.timeline.delete_clips(ids);
        if removed > 0 {
            if self.selected_clip.is_some_and(|id| ids.contains(&id)) {
                self.selected_clip = None;
            }
            self.timeline_edited();
        }
        removed
    }

    pub fn delete_selected(&mut self) -> usize {
        match self.selected_clip {
            Some(id) => self.delete_clips(&[id]),
            None => 0,
        }
    }

    /// Replace the whole clip list and rewind.
    pub fn load_clips(&mut self, clips: Vec<TimelineClip>) {
        self.gestures.cancel(&mut self.playhead);
        self.timeline.set_clips(clips);
        self.selected_clip = None;
        self.selected_range = None;
        self.sync_timeline();
        self.playhead.reset();
        self.refresh_frame();
        tracing::info!(
            clips = self.timeline.len(),
            duration = self.playhead.duration(),
            "Timeline loaded"
        );
    }

    pub fn clear(&mut self) {
        self.load_clips(Vec::new());
    }

    /// Load the clips of `project`. The session's own timeline is reused so
    /// content versions keep increasing across loads.
    pub fn load_project(&mut self, project: &ProjectFile) -> Result<(), ProjectError> {
        let loaded = project.to_timeline(self.config.timeline.clone())?;
        self.load_clips(loaded.clips().cloned().collect());
        Ok(())
    }

    pub fn open_project(&mut self, path: impl AsRef<Path>) -> Result<ProjectFile, ProjectError> {
        let project = ProjectFile::load(path)?;
        self.load_project(&project)?;
        Ok(project)
    }

    /// Write the current clips into `project` and save it to `path`.
    pub fn save_project(
        &self,
        project: &mut ProjectFile,
        path: impl AsRef<Path>,
    ) -> Result<(), ProjectError> {
        project.from_timeline(&self.timeline);
        project.save(path)
    }

    // --- Pointer routing ----------------------------------------------------

    /// Clip body under a ruler position, using the lane layout.
    pub fn hit_test(&self, event: PointerEvent) -> Option<ClipHit> {
        let track = self.gestures.track_at_y(event.y)?;
        let t = self.gestures.x_to_time(event.x, self.playhead.duration());
        self.timeline.clip_at(t, track).map(|clip| ClipHit {
            id: clip.id,
            start_time: clip.start_time,
            track_index: clip.track_index,
        })
    }

    pub fn pointer_down(&mut self, event: PointerEvent) -> bool {
        let hit = self.hit_test(event);
        self.gestures.pointer_down(&mut self.playhead, event, hit)
    }

    pub fn pointer_move(&mut self, event: PointerEvent) {
        self.gestures.pointer_move(&mut self.playhead, event);
    }

    /// Finish the gesture and apply whatever it produced.
    pub fn pointer_up(&mut self, event: PointerEvent) -> Option<GestureOutcome> {
        let outcome = self.gestures.pointer_up(&mut self.playhead, event);
        match outcome {
            Some(GestureOutcome::ClipSelected { id }) => {
                self.selected_clip = Some(id);
            }
            Some(GestureOutcome::ClipMoved {
                id,
                new_start,
                new_track,
            }) => {
                self.selected_clip = Some(id);
                if let Err(err) = self.move_clip(id, new_start, new_track) {
                    tracing::warn!(%id, new_start, new_track, error = %err, "Clip drop rejected");
                }
            }
            Some(GestureOutcome::RangeSelected { start, end }) => {
                self.selected_range = Some((start, end));
            }
            None => {}
        }
        outcome
    }

    pub fn cancel_gesture(&mut self) {
        self.gestures.cancel(&mut self.playhead);
    }

    // --- Per-tick drain -----------------------------------------------------

    /// One UI tick: release throttled playhead updates, check the hold
    /// threshold of an armed press, then collect finished renders.
    pub fn tick(&mut self) -> PumpReport {
        self.playhead.tick();
        self.gestures.tick(&mut self.playhead);
        let now = self.playhead.current_time();
        self.renderer.borrow_mut().pump(now)
    }

    /// Block until outstanding renders finish or `timeout` passes.
    pub fn wait_for_frames(&mut self, timeout: Duration) -> PumpReport {
        let now = self.playhead.current_time();
        self.renderer.borrow_mut().pump_blocking(now, timeout)
    }

    /// Ask for the frame under the playhead again.
    pub fn refresh_frame(&mut self) -> RequestId {
        let now = self.playhead.current_time();
        self.renderer.borrow_mut().request_frame(now)
    }

    fn timeline_edited(&mut self) {
        self.sync_timeline();
        self.refresh_frame();
    }

    fn sync_timeline(&mut self) {
        self.renderer.borrow_mut().set_snapshot(self.timeline.snapshot());
        self.playhead.set_duration(self.timeline.total_duration());
    }
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("clips", &self.timeline.len())
            .field("content_version", &self.timeline.content_version())
            .field("current_time", &self.playhead.current_time())
            .field("phase", &self.gestures.phase())
            .field("selected_clip", &self.selected_clip)
            .finish()
    }
}
