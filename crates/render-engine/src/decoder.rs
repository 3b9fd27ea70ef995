//! Frame decoding.
//!
//! Decoders run on render workers, so they are `Send + Sync` and open their
//! own handle for each call. Stills are decoded once per path and reused.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};
use parking_lot::Mutex;

use reelsync_common::config::RenderConfig;
use reelsync_common::error::ReelsyncError;
use reelsync_timeline_model::{MediaKind, MediaSource};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("Media unavailable: {path}: {reason}")]
    Unavailable { path: PathBuf, reason: String },

    #[error("{kind:?} source has no picture: {path}")]
    NonVisual { path: PathBuf, kind: MediaKind },

    #[error("ffmpeg failed for {path} at {time:.3}s: {reason}")]
    Ffmpeg {
        path: PathBuf,
        time: f64,
        reason: String,
    },

    #[error("Image decode failed for {path}: {reason}")]
    Image { path: PathBuf, reason: String },

    #[error("Decoder panicked on {path}: {reason}")]
    Panicked { path: PathBuf, reason: String },
}

impl DecodeError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Unavailable { path, .. }
            | Self::NonVisual { path, .. }
            | Self::Ffmpeg { path, .. }
            | Self::Image { path, .. }
            | Self::Panicked { path, .. } => path,
        }
    }
}

impl From<DecodeError> for ReelsyncError {
    fn from(err: DecodeError) -> Self {
        ReelsyncError::media_unavailable(err.path().to_path_buf(), err.to_string())
    }
}

/// Produces the picture of a source at a source-relative time.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, source: &MediaSource, source_time: f64) -> Result<Arc<RgbaImage>, DecodeError>;
}

/// Decoder for real media files: `image` for stills, an `ffmpeg` process
/// per request for video.
pub struct MediaDecoder {
    ffmpeg_path: String,
    stills: Mutex<HashMap<PathBuf, Arc<RgbaImage>>>,
}

impl MediaDecoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            stills: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.ffmpeg_path.clone())
    }

    /// Whether the configured ffmpeg binary runs.
    pub fn ffmpeg_available(&self) -> bool {
        Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    pub fn cached_stills(&self) -> usize {
        self.stills.lock().len()
    }

    fn decode_still(&self, path: &Path) -> Result<Arc<RgbaImage>, DecodeError> {
        if let Some(image) = self.stills.lock().get(path) {
            return Ok(Arc::clone(image));
        }

        let image = image::open(path)
            .map_err(|e| DecodeError::Image {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
            .into_rgba8();
        let image = Arc::new(image);

        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Decoded still"
        );
        self.stills
            .lock()
            .insert(path.to_path_buf(), Arc::clone(&image));
        Ok(image)
    }

    fn decode_video(&self, path: &Path, time: f64) -> Result<Arc<RgbaImage>, DecodeError> {
        let ffmpeg_err = |reason: String| DecodeError::Ffmpeg {
            path: path.to_path_buf(),
            time,
            reason,
        };

        let output = Command::new(&self.ffmpeg_path)
            .args(["-v", "error", "-ss", &format!("{time:.3}"), "-i"])
            .arg(path)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ffmpeg_err(format!("failed to start {}: {e}", self.ffmpeg_path)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ffmpeg_err(format!(
                "exit {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(ffmpeg_err("no frame at this position".to_string()));
        }

        let image = image::load_from_memory_with_format(&output.stdout, ImageFormat::Png)
            .map_err(|e| ffmpeg_err(format!("bad PNG from ffmpeg: {e}")))?
            .into_rgba8();
        Ok(Arc::new(image))
    }
}

impl FrameDecoder for MediaDecoder {
    fn decode(
        &self,
        source: &MediaSource,
        source_time: f64,
    ) -> Result<Arc<RgbaImage>, DecodeError> {
        if !source.path.exists() {
            return Err(DecodeError::Unavailable {
                path: source.path.clone(),
                reason: "file not found".to_string(),
            });
        }

        match source.kind {
            MediaKind::Image => self.decode_still(&source.path),
            MediaKind::Video => self.decode_video(&source.path, source_time),
            MediaKind::Audio => Err(DecodeError::NonVisual {
                path: source.path.clone(),
                kind: source.kind,
            }),
        }
    }
}

impl std::fmt::Debug for MediaDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaDecoder")
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("cached_stills", &self.cached_stills())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_missing_file_is_unavailable() {
        let decoder = MediaDecoder::new("ffmpeg");
        let source = MediaSource::video("/definitely/not/here.mp4", 10.0, 30.0, 640, 360);
        let err = decoder.decode(&source, 1.0).unwrap_err();
        assert!(matches!(err, DecodeError::Unavailable { .. }));
        assert_eq!(err.path(), Path::new("/definitely/not/here.mp4"));
    }

    #[test]
    fn test_still_decoded_once() {
        let dir = std::env::temp_dir().join("reelsync_test_still_decode");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("still.png");
        RgbaImage::from_pixel(6, 4, Rgba([10, 200, 30, 255]))
            .save(&path)
            .unwrap();

        let decoder = MediaDecoder::new("ffmpeg");
        let source = MediaSource::image(&path, 6, 4, 5.0);
        let a = decoder.decode(&source, 0.0).unwrap();
        let b = decoder.decode(&source, 3.0).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(decoder.cached_stills(), 1);
        assert_eq!(*a.get_pixel(0, 0), Rgba([10, 200, 30, 255]));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_audio_is_not_visual() {
        let dir = std::env::temp_dir().join("reelsync_test_audio_decode");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tone.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let decoder = MediaDecoder::new("ffmpeg");
        let err = decoder.decode(&MediaSource::audio(&path, 2.0), 0.0).unwrap_err();
        assert!(matches!(err, DecodeError::NonVisual { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }
}
