//! Error types shared across Reelsync crates.

use std::path::PathBuf;

/// Top-level error type for Reelsync operations.
///
/// Most variants are recovered locally by the engine (clamped, replaced with
/// an error frame, or rejected as a no-op); they exist as values so callers
/// can log or surface them without the engine ever unwinding.
#[derive(Debug, thiserror::Error)]
pub enum ReelsyncError {
    #[error("Time {time:.3}s outside [0, {duration:.3}]")]
    InvalidTimeRange { time: f64, duration: f64 },

    #[error("Media unavailable: {path}: {reason}")]
    MediaUnavailable { path: PathBuf, reason: String },

    #[error("Split time {at:.3}s not strictly inside clip [{start:.3}, {end:.3})")]
    SplitOutOfBounds { at: f64, start: f64, end: f64 },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Timeline error: {message}")]
    Timeline { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelsyncError.
pub type ReelsyncResult<T> = Result<T, ReelsyncError>;

impl ReelsyncError {
    pub fn media_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MediaUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn timeline(msg: impl Into<String>) -> Self {
        Self::Timeline {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether the engine recovers from this error without user involvement.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidTimeRange { .. }
                | Self::MediaUnavailable { .. }
                | Self::SplitOutOfBounds { .. }
        )
    }
}
