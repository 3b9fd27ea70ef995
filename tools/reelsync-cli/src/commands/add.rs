//! Probe a media file and place it on a project's timeline.

use std::path::PathBuf;
use std::sync::Arc;

use reelsync_common::config::AppConfig;
use reelsync_render_engine::probe_media;
use reelsync_timeline_model::ProjectFile;

pub fn run(
    config: &AppConfig,
    project_path: PathBuf,
    media: PathBuf,
    track: u32,
    at: Option<f64>,
) -> anyhow::Result<()> {
    let mut project = ProjectFile::load(&project_path)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
    let mut timeline = project.to_timeline(config.timeline.clone())?;

    let source = probe_media(
        &media,
        &config.render.ffprobe_path,
        config.timeline.default_still_secs,
    )?;

    // Append after the last clip on the track unless told otherwise.
    let start = at.unwrap_or_else(|| {
        timeline
            .clips()
            .filter(|c| c.track_index == track)
            .map(|c| c.end_time)
            .fold(0.0, f64::max)
    });

    let id = timeline.add_clip(Arc::new(source), track, start)?;
    project.from_timeline(&timeline);
    project
        .save(&project_path)
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;

    if let Some(clip) = timeline.clip(id) {
        println!(
            "Added {} as {} on track {} [{:.3}s, {:.3}s)",
            clip.media.name(),
            id,
            clip.track_index,
            clip.start_time,
            clip.end_time
        );
    }
    Ok(())
}
