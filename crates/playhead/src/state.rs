//! Playhead state record.

use serde::Serialize;

/// Where the controller is in the click/drag protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    #[default]
    None,
    /// Pressed on the playhead; a release seeks, movement starts a scrub.
    PendingSeek,
    /// Scrubbing.
    Dragging,
}

/// Snapshot of the controller's state. Only the controller mutates it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PlayheadState {
    /// Canonical timeline position in seconds.
    pub current_time: f64,

    pub is_scrubbing: bool,

    pub interaction_mode: InteractionMode,

    /// Whether playback was running when the current scrub began.
    pub was_playing_before_scrub: bool,

    /// Timeline time of the press that armed a pending seek.
    pub pending_seek_time: Option<f64>,
}
