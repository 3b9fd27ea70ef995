//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Playhead synchronisation settings.
    pub playhead: PlayheadConfig,

    /// Pointer gesture thresholds and ruler geometry.
    pub interaction: InteractionConfig,

    /// Timeline scroll-bound settings.
    pub timeline: TimelineConfig,

    /// Preview renderer settings.
    pub render: RenderConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Playhead controller parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayheadConfig {
    /// Seeks closer than this to the current time are ignored.
    pub seek_epsilon_secs: f64,

    /// Minimum interval between observer fan-outs for throttled updates.
    pub update_interval_ms: u64,

    /// Half-width of the playhead hit zone in pixels.
    pub click_tolerance_px: f64,

    /// Forward every scrub position to the media player instead of only the
    /// final position on release.
    pub seek_player_while_scrubbing: bool,
}

/// Gesture classification thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Movement (px) from an armed press that starts a drag.
    pub drag_threshold_px: f64,

    /// Hold time (ms) from an armed press that starts a drag.
    pub drag_threshold_ms: u64,

    /// Base ruler scale at zoom 1.0.
    pub pixels_per_second: f64,

    /// Lane height used for clip hit-testing and track drops.
    pub track_height_px: f64,
}

/// Timeline bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Scroll bound never drops below this many seconds.
    pub min_duration_secs: f64,

    /// Scroll bound is the last clip end multiplied by this factor.
    pub safety_factor: f64,

    /// Duration given to still images, which carry no intrinsic length.
    pub default_still_secs: f64,
}

/// Preview renderer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output frame width in pixels.
    pub width: u32,

    /// Output frame height in pixels.
    pub height: u32,

    /// Cache key precision in seconds.
    pub quantum_secs: f64,

    /// Maximum cached frames.
    pub cache_capacity: usize,

    /// Decode/composite worker threads.
    pub workers: usize,

    /// ffmpeg binary used for video frame extraction.
    pub ffmpeg_path: String,

    /// ffprobe binary used to read media metadata on import.
    pub ffprobe_path: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelsync=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for PlayheadConfig {
    fn default() -> Self {
        Self {
            seek_epsilon_secs: 0.001,
            update_interval_ms: 16,
            click_tolerance_px: 12.0,
            seek_player_while_scrubbing: false,
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 5.0,
            drag_threshold_ms: 100,
            pixels_per_second: 50.0,
            track_height_px: 60.0,
        }
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 300.0,
            safety_factor: 1.2,
            default_still_secs: 5.0,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            quantum_secs: 0.1,
            cache_capacity: 100,
            workers: 2,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Where `load` and `save` look for the config file.
    pub fn path() -> PathBuf {
        config_file_path()
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelsync").join("config.json")
}
