//! The clip arena and its derived quantities.
//!
//! The timeline is owned by the coordination thread. Render workers never
//! see it directly; they receive a [`TimelineSnapshot`], an immutable copy
//! tagged with the `content_version` it was taken at.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use reelsync_common::config::TimelineConfig;
use reelsync_common::error::ReelsyncError;

use crate::clip::{ClipId, TimelineClip};
use crate::media::{MediaKind, MediaSource};

/// Errors from structural timeline edits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimelineError {
    #[error("Unknown {0}")]
    UnknownClip(ClipId),

    #[error("Cannot split {id} at {at:.3}s: outside ({start:.3}, {end:.3})")]
    SplitOutOfBounds {
        id: ClipId,
        at: f64,
        start: f64,
        end: f64,
    },

    #[error("Invalid placement: start {start}s")]
    InvalidPlacement { start: f64 },

    #[error("Invalid duration {duration}s for {id}")]
    InvalidDuration { id: ClipId, duration: f64 },

    #[error("Source has no playable length: {path}")]
    EmptySource { path: PathBuf },
}

impl From<TimelineError> for ReelsyncError {
    fn from(err: TimelineError) -> Self {
        match err {
            TimelineError::SplitOutOfBounds { at, start, end, .. } => {
                ReelsyncError::SplitOutOfBounds { at, start, end }
            }
            other => ReelsyncError::timeline(other.to_string()),
        }
    }
}

/// Ordered collection of every clip on the timeline.
#[derive(Debug, Clone)]
pub struct Timeline {
    clips: BTreeMap<ClipId, TimelineClip>,
    next_id: u64,
    content_version: u64,
    config: TimelineConfig,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

impl Timeline {
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            clips: BTreeMap::new(),
            next_id: 1,
            content_version: 0,
            config,
        }
    }

    /// Counter bumped by every structural change.
    pub fn content_version(&self) -> u64 {
        self.content_version
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clip(&self, id: ClipId) -> Option<&TimelineClip> {
        self.clips.get(&id)
    }

    /// All clips in id order.
    pub fn clips(&self) -> impl Iterator<Item = &TimelineClip> {
        self.clips.values()
    }

    /// Place `media` on `track` at `start`, covering the whole source.
    pub fn add_clip(
        &mut self,
        media: Arc<MediaSource>,
        track: u32,
        start: f64,
    ) -> Result<ClipId, TimelineError> {
        validate_start(start)?;

        let length = if media.duration > 0.0 {
            media.duration
        } else if media.kind == MediaKind::Image {
            self.config.default_still_secs
        } else {
            return Err(TimelineError::EmptySource {
                path: media.path.clone(),
            });
        };

        let id = self.allocate_id();
        tracing::debug!(%id, track, start, length, media = %media.name(), "Adding clip");
        self.clips
            .insert(id, TimelineClip::new(id, media, track, start, length));
        self.bump();
        Ok(id)
    }

    /// Split clip `id` at timeline time `at`.
    ///
    /// `at` must lie strictly inside the clip; otherwise the call is rejected
    /// and the timeline is left untouched.
    pub fn split_clip(&mut self, id: ClipId, at: f64) -> Result<(ClipId, ClipId), TimelineError> {
        let clip = self.clips.get(&id).ok_or(TimelineError::UnknownClip(id))?;
        if !clip.strictly_contains(at) {
            tracing::debug!(%id, at, "Split rejected: time not inside clip");
            return Err(TimelineError::SplitOutOfBounds {
                id,
                at,
                start: clip.start_time,
                end: clip.end_time,
            });
        }

        let right_id = ClipId(self.next_id);
        let (left, right) = clip
            .split(at, right_id)
            .ok_or(TimelineError::SplitOutOfBounds {
                id,
                at,
                start: clip.start_time,
                end: clip.end_time,
            })?;
        self.next_id += 1;

        self.clips.insert(left.id, left);
        self.clips.insert(right.id, right);
        self.bump();
        tracing::debug!(left = %id, right = %right_id, at, "Split clip");
        Ok((id, right_id))
    }

    /// Split every clip that strictly contains `t`, on all tracks.
    pub fn split_at(&mut self, t: f64) -> Vec<(ClipId, ClipId)> {
        let targets: Vec<ClipId> = self
            .clips
            .values()
            .filter(|c| c.strictly_contains(t))
            .map(|c| c.id)
            .collect();

        targets
            .into_iter()
            .filter_map(|id| self.split_clip(id, t).ok())
            .collect()
    }

    /// Move a clip. Overlaps are allowed; only the start is validated.
    pub fn move_clip(
        &mut self,
        id: ClipId,
        new_start: f64,
        new_track: u32,
    ) -> Result<(), TimelineError> {
        validate_start(new_start)?;
        let clip = self
            .clips
            .get_mut(&id)
            .ok_or(TimelineError::UnknownClip(id))?;

        if clip.start_time == new_start && clip.track_index == new_track {
            return Ok(());
        }
        clip.shift_to(new_start);
        clip.track_index = new_track;
        tracing::debug!(%id, new_start, new_track, "Moved clip");
        self.bump();
        Ok(())
    }

    /// Change a clip's placed length.
    pub fn resize_clip(&mut self, id: ClipId, new_duration: f64) -> Result<(), TimelineError> {
        let clip = self
            .clips
            .get_mut(&id)
            .ok_or(TimelineError::UnknownClip(id))?;
        if !new_duration.is_finite() || !clip.resize(new_duration) {
            return Err(TimelineError::InvalidDuration {
                id,
                duration: new_duration,
            });
        }
        self.bump();
        Ok(())
    }

    /// Remove the given clips, returning how many existed.
    pub fn delete_clips(&mut self, ids: &[ClipId]) -> usize {
        let removed = ids
            .iter()
            .filter(|id| self.clips.remove(id).is_some())
            .count();
        if removed > 0 {
            tracing::debug!(removed, "Deleted clips");
            self.bump();
        }
        removed
    }

    /// Clips active at `t` (`start_time <= t < end_time`), lowest track first.
    pub fn resolve_active_clips(&self, t: f64) -> Vec<&TimelineClip> {
        let mut active: Vec<&TimelineClip> =
            self.clips.values().filter(|c| c.contains(t)).collect();
        active.sort_by_key(|c| (c.track_index, c.id));
        active
    }

    /// The clip body under `(t, track)`, if any. With overlaps on one lane
    /// the most recently created clip wins, matching paint order.
    pub fn clip_at(&self, t: f64, track: u32) -> Option<&TimelineClip> {
        self.clips
            .values()
            .rev()
            .find(|c| c.track_index == track && c.contains(t))
    }

    /// Replace every clip (project load). Ids are preserved and the id
    /// allocator continues after the highest one.
    pub fn set_clips(&mut self, clips: Vec<TimelineClip>) {
        self.clips = clips.into_iter().map(|c| (c.id, c)).collect();
        self.next_id = self.clips.keys().next_back().map_or(1, |id| id.0 + 1);
        self.bump();
    }

    pub fn clear(&mut self) {
        self.clips.clear();
        self.bump();
    }

    /// Latest clip end, or zero when empty.
    pub fn max_end_time(&self) -> f64 {
        self.clips
            .values()
            .map(|c| c.end_time)
            .fold(0.0, f64::max)
    }

    /// Scroll bound for the UI and clamp range for the playhead.
    pub fn total_duration(&self) -> f64 {
        (self.max_end_time() * self.config.safety_factor).max(self.config.min_duration_secs)
    }

    /// Immutable view for render workers.
    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            content_version: self.content_version,
            clips: self.clips.values().cloned().collect(),
        }
    }

    fn allocate_id(&mut self) -> ClipId {
        let id = ClipId(self.next_id);
        self.next_id += 1;
        id
    }

    fn bump(&mut self) {
        self.content_version += 1;
    }
}

fn validate_start(start: f64) -> Result<(), TimelineError> {
    if start.is_finite() && start >= 0.0 {
        Ok(())
    } else {
        Err(TimelineError::InvalidPlacement { start })
    }
}

/// Immutable copy of the clip list at one content version.
#[derive(Debug, Clone)]
pub struct TimelineSnapshot {
    pub content_version: u64,
    pub clips: Arc<[TimelineClip]>,
}

impl Default for TimelineSnapshot {
    fn default() -> Self {
        Self {
            content_version: 0,
            clips: Arc::from(Vec::new()),
        }
    }
}

impl TimelineSnapshot {
    /// Same contract as [`Timeline::resolve_active_clips`], returning owned
    /// clips a worker can keep.
    pub fn resolve_active_clips(&self, t: f64) -> Vec<TimelineClip> {
        let mut active: Vec<TimelineClip> =
            self.clips.iter().filter(|c| c.contains(t)).cloned().collect();
        active.sort_by_key(|c| (c.track_index, c.id));
        active
    }
}
