//! Timeline clips.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::media::MediaSource;

/// Arena handle for a clip. Visual layers and gesture outcomes carry this id,
/// never a reference to the clip itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClipId(pub u64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip#{}", self.0)
    }
}

/// A span of a media source placed on a track.
///
/// Timeline placement is stored as `[start_time, end_time)` so that a split
/// produces halves whose shared boundary is bit-exact; `duration()` is
/// derived. `in_point..out_point` is the matching span inside the source.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineClip {
    pub id: ClipId,
    pub media: Arc<MediaSource>,
    pub track_index: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub in_point: f64,
    pub out_point: f64,
}

impl TimelineClip {
    /// A clip covering the whole source, starting at `start_time`.
    ///
    /// `length` overrides the source duration for sources without one
    /// (stills imported without a display time).
    pub fn new(
        id: ClipId,
        media: Arc<MediaSource>,
        track_index: u32,
        start_time: f64,
        length: f64,
    ) -> Self {
        let start_time = start_time.max(0.0);
        let length = length.max(0.0);
        Self {
            id,
            media,
            track_index,
            start_time,
            end_time: start_time + length,
            in_point: 0.0,
            out_point: length,
        }
    }

    /// Placed length on the timeline.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Half-open containment: `start_time <= t < end_time`.
    pub fn contains(&self, t: f64) -> bool {
        self.start_time <= t && t < self.end_time
    }

    /// Whether `t` lies strictly inside the clip, i.e. is a valid split point.
    pub fn strictly_contains(&self, t: f64) -> bool {
        self.start_time < t && t < self.end_time
    }

    /// Map a timeline instant to a time inside the source, clamped to the
    /// clip's source span.
    pub fn source_time_at(&self, t: f64) -> f64 {
        let raw = t - self.start_time + self.in_point;
        raw.clamp(self.in_point, self.out_point.max(self.in_point))
    }

    /// Split at `at`, returning `(left, right)`. The left half keeps this id,
    /// the right half takes `right_id`. Returns `None` unless `at` is strictly
    /// inside the clip.
    pub fn split(&self, at: f64, right_id: ClipId) -> Option<(TimelineClip, TimelineClip)> {
        if !self.strictly_contains(at) {
            return None;
        }

        let source_cut = self.in_point + (at - self.start_time);

        let left = TimelineClip {
            end_time: at,
            out_point: source_cut,
            ..self.clone()
        };
        let right = TimelineClip {
            id: right_id,
            media: Arc::clone(&self.media),
            track_index: self.track_index,
            start_time: at,
            end_time: self.end_time,
            in_point: source_cut,
            out_point: self.out_point,
        };
        Some((left, right))
    }

    /// Change the placed length, keeping the start and in-point fixed. The
    /// new length is limited by what remains of the source.
    pub fn resize(&mut self, new_duration: f64) -> bool {
        if new_duration <= 0.0 {
            return false;
        }
        let available = (self.media.duration - self.in_point).max(0.0);
        let length = if available > 0.0 {
            new_duration.min(available)
        } else {
            new_duration
        };
        self.end_time = self.start_time + length;
        self.out_point = self.in_point + length;
        true
    }

    /// Move to a new start keeping the placed length.
    pub fn shift_to(&mut self, new_start: f64) {
        let length = self.duration();
        self.start_time = new_start;
        self.end_time = new_start + length;
    }
}
