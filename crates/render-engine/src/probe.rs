//! Media metadata probing for import.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use reelsync_timeline_model::{MediaKind, MediaSource};

use crate::decoder::DecodeError;

#[derive(Debug, Default, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: ProbeFormat,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Build a [`MediaSource`] for `path`. Stills are read with `image`; video
/// and audio go through `ffprobe`.
pub fn probe_media(
    path: &Path,
    ffprobe_path: &str,
    default_still_secs: f64,
) -> Result<MediaSource, DecodeError> {
    if !path.exists() {
        return Err(DecodeError::Unavailable {
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        });
    }
    let kind = MediaKind::from_path(path).ok_or_else(|| DecodeError::Unavailable {
        path: path.to_path_buf(),
        reason: "unrecognised file extension".to_string(),
    })?;

    if kind == MediaKind::Image {
        let (width, height) = image::image_dimensions(path).map_err(|e| DecodeError::Image {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        return Ok(MediaSource::image(path, width, height, default_still_secs));
    }

    let output = Command::new(ffprobe_path)
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()
        .map_err(|e| DecodeError::Unavailable {
            path: path.to_path_buf(),
            reason: format!("failed to start {ffprobe_path}: {e}"),
        })?;
    if !output.status.success() {
        return Err(DecodeError::Unavailable {
            path: path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let json = String::from_utf8_lossy(&output.stdout);
    let source = parse_probe_json(path, kind, &json)?;
    tracing::debug!(
        path = %path.display(),
        kind = ?source.kind,
        duration = source.duration,
        width = source.width,
        height = source.height,
        "Probed media"
    );
    Ok(source)
}

/// Interpret `ffprobe -print_format json` output.
pub fn parse_probe_json(
    path: &Path,
    kind: MediaKind,
    json: &str,
) -> Result<MediaSource, DecodeError> {
    let probe: ProbeOutput = serde_json::from_str(json).map_err(|e| DecodeError::Unavailable {
        path: path.to_path_buf(),
        reason: format!("unreadable ffprobe output: {e}"),
    })?;

    let video = probe.streams.iter().find(|s| s.codec_type == "video");
    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(parse_secs)
        .or_else(|| probe.streams.iter().find_map(|s| s.duration.as_deref().and_then(parse_secs)))
        .unwrap_or(0.0);

    match kind {
        MediaKind::Video => {
            let video = video.ok_or_else(|| DecodeError::Unavailable {
                path: path.to_path_buf(),
                reason: "no video stream".to_string(),
            })?;
            let fps = video
                .r_frame_rate
                .as_deref()
                .and_then(parse_rate)
                .unwrap_or(0.0);
            Ok(MediaSource::video(
                path,
                duration,
                fps,
                video.width.unwrap_or(0),
                video.height.unwrap_or(0),
            ))
        }
        MediaKind::Audio => Ok(MediaSource::audio(path, duration)),
        MediaKind::Image => Ok(MediaSource::image(
            path,
            video.and_then(|v| v.width).unwrap_or(0),
            video.and_then(|v| v.height).unwrap_or(0),
            duration,
        )),
    }
}

fn parse_secs(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Parse an ffprobe rational such as `30000/1001`.
fn parse_rate(raw: &str) -> Option<f64> {
    let (num, den) = raw.split_once('/')?;
    let num = num.trim().parse::<f64>().ok()?;
    let den = den.trim().parse::<f64>().ok()?;
    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}
