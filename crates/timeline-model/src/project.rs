//! Project file persistence.
//!
//! A project file is a single JSON document holding the imported media list
//! and every clip placement. The engine's [`Timeline`] never touches JSON;
//! conversion goes through [`ProjectFile::from_timeline`] and
//! [`ProjectFile::to_timeline`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use reelsync_common::config::TimelineConfig;

use crate::clip::{ClipId, TimelineClip};
use crate::media::MediaSource;
use crate::timeline::Timeline;

const SCHEMA_VERSION: &str = "1.0";

/// Top-level project document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Schema version.
    pub version: String,

    /// Human-readable project name.
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Creation timestamp (RFC 3339).
    pub created_at: String,

    /// Last modified timestamp (RFC 3339).
    pub modified_at: String,

    pub settings: ProjectSettings,

    /// Imported media, referenced by index from clip records.
    pub media_items: Vec<MediaSource>,

    pub timeline_clips: Vec<ClipRecord>,
}

/// Output and ruler settings stored with the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub width: u32,
    pub height: u32,
    pub fps: f64,

    /// Number of lanes shown in the editor.
    pub tracks: u32,

    /// Ruler scale at zoom 1.0.
    pub pixels_per_second: f64,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30.0,
            tracks: 3,
            pixels_per_second: 50.0,
        }
    }
}

/// Serialized form of a [`TimelineClip`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRecord {
    pub id: ClipId,
    pub media_index: usize,
    pub track_index: u32,
    pub start_time: f64,
    pub duration: f64,
    pub in_point: f64,
    pub out_point: f64,
}

impl ProjectFile {
    /// Create an empty project stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: SCHEMA_VERSION.to_string(),
            name: name.into(),
            description: String::new(),
            created_at: now.clone(),
            modified_at: now,
            settings: ProjectSettings::default(),
            media_items: Vec::new(),
            timeline_clips: Vec::new(),
        }
    }

    /// Read and validate a project file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let project: ProjectFile =
            serde_json::from_str(&json).map_err(|e| ProjectError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

        let errors = project.validate();
        if !errors.is_empty() {
            return Err(ProjectError::ValidationError {
                message: errors.join("; "),
            });
        }

        tracing::info!(
            path = %path.display(),
            name = %project.name,
            clips = project.timeline_clips.len(),
            "Loaded project"
        );
        Ok(project)
    }

    /// Write the project as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ProjectError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ProjectError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "Saved project");
        Ok(())
    }

    /// Check structural consistency. Returns a list of problems (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Project name is empty".to_string());
        }
        if self.settings.pixels_per_second <= 0.0 {
            errors.push(format!(
                "pixels_per_second must be positive, got {}",
                self.settings.pixels_per_second
            ));
        }

        for record in &self.timeline_clips {
            if record.media_index >= self.media_items.len() {
                errors.push(format!(
                    "{} references media index {} but only {} items exist",
                    record.id,
                    record.media_index,
                    self.media_items.len()
                ));
            }
            if record.start_time < 0.0 || !record.start_time.is_finite() {
                errors.push(format!("{} has invalid start {}", record.id, record.start_time));
            }
            if record.duration <= 0.0 || !record.duration.is_finite() {
                errors.push(format!(
                    "{} has non-positive duration {}",
                    record.id, record.duration
                ));
            }
            if record.out_point < record.in_point {
                errors.push(format!("{} has out_point before in_point", record.id));
            }
        }

        errors
    }

    /// Capture the current timeline into this project and stamp `modified_at`.
    pub fn from_timeline(&mut self, timeline: &Timeline) {
        let mut index_by_path: HashMap<PathBuf, usize> = self
            .media_items
            .iter()
            .enumerate()
            .map(|(i, m)| (m.path.clone(), i))
            .collect();

        let mut records = Vec::with_capacity(timeline.len());
        let mut max_track = 0;
        for clip in timeline.clips() {
            let media_index = match index_by_path.get(&clip.media.path) {
                Some(&i) => i,
                None => {
                    self.media_items.push(clip.media.as_ref().clone());
                    let i = self.media_items.len() - 1;
                    index_by_path.insert(clip.media.path.clone(), i);
                    i
                }
            };
            max_track = max_track.max(clip.track_index + 1);
            records.push(ClipRecord {
                id: clip.id,
                media_index,
                track_index: clip.track_index,
                start_time: clip.start_time,
                duration: clip.duration(),
                in_point: clip.in_point,
                out_point: clip.out_point,
            });
        }

        self.timeline_clips = records;
        self.settings.tracks = self.settings.tracks.max(max_track);
        self.modified_at = chrono::Utc::now().to_rfc3339();
    }

    /// Rebuild a timeline. Clips sharing a media item share one `Arc`.
    pub fn to_timeline(&self, config: TimelineConfig) -> Result<Timeline, ProjectError> {
        let media: Vec<Arc<MediaSource>> =
            self.media_items.iter().cloned().map(Arc::new).collect();

        let clips = self
            .timeline_clips
            .iter()
            .map(|record| {
                let source = media.get(record.media_index).ok_or_else(|| {
                    ProjectError::ValidationError {
                        message: format!(
                            "{} references missing media index {}",
                            record.id, record.media_index
                        ),
                    }
                })?;
                Ok(TimelineClip {
                    id: record.id,
                    media: Arc::clone(source),
                    track_index: record.track_index,
                    start_time: record.start_time,
                    end_time: record.start_time + record.duration,
                    in_point: record.in_point,
                    out_point: record.out_point,
                })
            })
            .collect::<Result<Vec<_>, ProjectError>>()?;

        let mut timeline = Timeline::new(config);
        timeline.set_clips(clips);
        Ok(timeline)
    }
}

/// Errors that can occur when working with project files.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}
