//! Media source descriptors.
//!
//! A `MediaSource` is produced by the import subsystem and never mutated by
//! the engine. Clips share it through an `Arc`, so splitting a clip does not
//! copy any media metadata.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of content a source file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "flv", "m4v", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "m4a", "flac", "ogg"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff"];

impl MediaKind {
    /// Classify a file by extension. Unknown extensions yield `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Audio)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else {
            None
        }
    }

    /// Whether clips of this kind contribute pixels to the composite.
    pub fn is_visual(self) -> bool {
        matches!(self, Self::Video | Self::Image)
    }
}

/// Immutable description of an imported media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSource {
    /// Absolute or project-relative file path.
    pub path: PathBuf,

    /// Content kind.
    pub kind: MediaKind,

    /// Playable length in seconds. Stills carry their default display time.
    pub duration: f64,

    /// Native frame rate (0 for audio).
    pub fps: f64,

    /// Native resolution (0x0 for audio).
    pub width: u32,
    pub height: u32,
}

impl MediaSource {
    pub fn video(
        path: impl Into<PathBuf>,
        duration: f64,
        fps: f64,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            path: path.into(),
            kind: MediaKind::Video,
            duration: duration.max(0.0),
            fps,
            width,
            height,
        }
    }

    pub fn audio(path: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            path: path.into(),
            kind: MediaKind::Audio,
            duration: duration.max(0.0),
            fps: 0.0,
            width: 0,
            height: 0,
        }
    }

    /// A still image shown for `display_secs` when placed on the timeline.
    pub fn image(path: impl Into<PathBuf>, width: u32, height: u32, display_secs: f64) -> Self {
        Self {
            path: path.into(),
            kind: MediaKind::Image,
            duration: display_secs.max(0.0),
            fps: 0.0,
            width,
            height,
        }
    }

    /// File name for display purposes.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Width over height, or `None` for sources without pixels.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            None
        } else {
            Some(self.width as f64 / self.height as f64)
        }
    }
}
